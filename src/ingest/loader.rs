//! Document discovery and loading

use std::path::Path;

use tracing::debug;
use tracing::warn;

use crate::errors::ChatRagError;
use crate::errors::Result;

/// File extensions picked up by ingestion
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "md", "pdf"];

/// A loaded source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// File name, used as the chunk `source`
    pub source: String,
    pub text: String,
}

/// Load every supported file directly under `dir`, sorted by file name.
///
/// Unreadable or empty files are skipped with a warning.
pub fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    if !dir.is_dir() {
        return Err(ChatRagError::IngestError(format!(
            "Documents directory not found: {}",
            dir.display()
        )));
    }

    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported(path))
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(source) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        match read_text(&path) {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    warn!("No text extracted from {}, skipping", source);
                    continue;
                }
                debug!("Loaded {} ({} chars)", source, text.chars().count());
                documents.push(Document {
                    source: source.to_string(),
                    text: text.to_string(),
                });
            }
            Err(e) => warn!("Failed to read {}: {}", path.display(), e),
        }
    }

    Ok(documents)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn read_text(path: &Path) -> Result<String> {
    if extension(path).as_deref() == Some("pdf") {
        extract_pdf_text(path)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Extract the text layer of a PDF, pages in order separated by blank lines.
///
/// Pages whose text cannot be decoded are skipped; a scanned PDF without a
/// text layer yields an empty string.
pub fn extract_pdf_text(path: &Path) -> Result<String> {
    let doc = lopdf::Document::load(path).map_err(|e| {
        ChatRagError::IngestError(format!("Failed to load PDF {}: {}", path.display(), e))
    })?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().into_keys() {
        match doc.extract_text(&[page_number]) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    pages.push(text.to_string());
                }
            }
            Err(e) => debug!("No text on page {} of {}: {}", page_number, path.display(), e),
        }
    }

    Ok(pages.join("\n\n"))
}
