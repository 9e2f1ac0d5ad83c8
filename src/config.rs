use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use url::Url;

use crate::errors::ChatRagError;
use crate::errors::Result;

/// Prefix for environment overrides, e.g. `CHATRAG__RAG__TOP_K=4`
pub const ENV_PREFIX: &str = "CHATRAG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_gemini_timeout")]
    pub timeout_secs: u64,
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_generation_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}

const fn default_gemini_timeout() -> u64 {
    60
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_gemini_endpoint(),
            generation_model: default_generation_model(),
            embedding_model: default_embedding_model(),
            timeout_secs: default_gemini_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PineconeConfig {
    #[serde(default)]
    pub api_key: String,
    /// Data-plane host of the index, e.g. `https://docs-abc123.svc.aped-4627-b74a.pinecone.io`
    #[serde(default)]
    pub index_host: String,
    #[serde(default = "default_pinecone_timeout")]
    pub timeout_secs: u64,
}

const fn default_pinecone_timeout() -> u64 {
    30
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            index_host: String::new(),
            timeout_secs: default_pinecone_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Matches must score strictly above this to ground an answer
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    /// Matches fetched per expanded query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Matches kept after fusion
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Paraphrases requested from the expander
    #[serde(default = "default_expansions")]
    pub expansions: usize,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

const fn default_similarity_threshold() -> f32 {
    0.55
}

const fn default_top_k() -> usize {
    3
}

const fn default_max_results() -> usize {
    5
}

const fn default_expansions() -> usize {
    3
}

fn default_namespace() -> String {
    "company-docs".to_string()
}

const fn default_temperature() -> f32 {
    0.3
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            top_k: default_top_k(),
            max_results: default_max_results(),
            expansions: default_expansions(),
            namespace: default_namespace(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub enable_cors: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: SessionBackend,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_session_namespace")]
    pub namespace: String,
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
    /// Oldest messages are dropped beyond this many
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_session_namespace() -> String {
    "chatrag:session:".to_string()
}

const fn default_session_ttl() -> u64 {
    86_400
}

const fn default_max_history() -> usize {
    20
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            redis_url: default_redis_url(),
            namespace: default_session_namespace(),
            ttl_secs: default_session_ttl(),
            max_history: default_max_history(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_documents_dir")]
    pub documents_dir: String,
    /// Chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between upsert batches, keeps us under provider rate limits
    #[serde(default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,
}

fn default_documents_dir() -> String {
    "documents".to_string()
}

const fn default_chunk_size() -> usize {
    1000
}

const fn default_chunk_overlap() -> usize {
    100
}

const fn default_batch_size() -> usize {
    100
}

const fn default_batch_pause_ms() -> u64 {
    1000
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            batch_size: default_batch_size(),
            batch_pause_ms: default_batch_pause_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Names that count as a mention in group and room chats
    #[serde(default = "default_bot_names")]
    pub names: Vec<String>,
}

fn default_bot_names() -> Vec<String> {
    vec![
        "まこT".to_string(),
        "おに".to_string(),
        "まこち".to_string(),
        "マコ".to_string(),
    ]
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            names: default_bot_names(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub pinecone: PineconeConfig,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the default file, layered with environment overrides
    pub fn load() -> Result<Self> {
        let mut builder = ::config::Config::builder();

        // Try config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            builder = builder.add_source(::config::File::from(Path::new("config.toml")));
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            builder = builder.add_source(::config::File::from(Path::new("config.example.toml")));
        }

        let layered = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Self = layered.try_deserialize()?;
        config.apply_provider_env();
        Ok(config)
    }

    /// Fill empty credentials from the providers' conventional variables
    fn apply_provider_env(&mut self) {
        fill_from_env(&mut self.gemini.api_key, "GEMINI_API_KEY");
        fill_from_env(&mut self.pinecone.api_key, "PINECONE_API_KEY");
        fill_from_env(&mut self.pinecone.index_host, "PINECONE_INDEX_HOST");
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        let threshold = self.rag.similarity_threshold;
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(ChatRagError::ConfigError(format!(
                "rag.similarity_threshold must be within [-1, 1], got {threshold}"
            )));
        }
        if self.rag.top_k == 0 || self.rag.max_results == 0 {
            return Err(ChatRagError::ConfigError(
                "rag.top_k and rag.max_results must be greater than zero".to_string(),
            ));
        }
        if self.ingest.chunk_size == 0 || self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(ChatRagError::ConfigError(format!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }
        if self.ingest.batch_size == 0 {
            return Err(ChatRagError::ConfigError(
                "ingest.batch_size must be greater than zero".to_string(),
            ));
        }
        Url::parse(&self.gemini.endpoint).map_err(|e| {
            ChatRagError::ConfigError(format!("gemini.endpoint is not a valid URL: {e}"))
        })?;
        if !self.pinecone.index_host.is_empty() {
            Url::parse(&self.pinecone.index_host).map_err(|e| {
                ChatRagError::ConfigError(format!("pinecone.index_host is not a valid URL: {e}"))
            })?;
        }
        Ok(())
    }

    /// Get Gemini API key
    pub fn gemini_api_key(&self) -> &str {
        &self.gemini.api_key
    }

    /// Get generation model name
    pub fn generation_model(&self) -> &str {
        &self.gemini.generation_model
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.gemini.embedding_model
    }

    /// Get the vector namespace queried by the RAG pipeline
    pub fn namespace(&self) -> &str {
        &self.rag.namespace
    }

    /// Get similarity threshold
    pub fn similarity_threshold(&self) -> f32 {
        self.rag.similarity_threshold
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn fill_from_env(slot: &mut String, var: &str) {
    if slot.is_empty() {
        if let Ok(value) = std::env::var(var) {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert!((config.similarity_threshold() - 0.55).abs() < f32::EPSILON);
        assert_eq!(config.rag.top_k, 3);
        assert_eq!(config.rag.max_results, 5);
        assert_eq!(config.rag.expansions, 3);
        assert_eq!(config.namespace(), "company-docs");
        assert_eq!(config.ingest.chunk_size, 1000);
        assert_eq!(config.ingest.chunk_overlap, 100);
        assert_eq!(config.session.backend, SessionBackend::Memory);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
[gemini]
api_key = "test-key"

[rag]
similarity_threshold = 0.7
namespace = "faq"

[session]
backend = "redis"
"#,
        )
        .unwrap();

        assert_eq!(config.gemini_api_key(), "test-key");
        assert_eq!(config.generation_model(), "gemini-2.5-flash");
        assert!((config.similarity_threshold() - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.namespace(), "faq");
        assert_eq!(config.rag.top_k, 3);
        assert_eq!(config.session.backend, SessionBackend::Redis);
        assert_eq!(config.bot.names.len(), 4);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9000\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_example_file_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.toml");
        let config = AppConfig::from_file(path).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.namespace(), "company-docs");
        assert_eq!(config.bot.names, BotConfig::default().names);
    }

    #[test]
    fn test_validate_rejects_overlap_larger_than_chunk() {
        let mut config = AppConfig::default();
        config.ingest.chunk_overlap = 1000;
        assert!(matches!(
            config.validate(),
            Err(ChatRagError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_widths() {
        let mut config = AppConfig::default();
        config.rag.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_index_host() {
        let mut config = AppConfig::default();
        config.pinecone.index_host = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
