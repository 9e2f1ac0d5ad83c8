//! In-process vector index with exact cosine search

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use super::IndexStats;
use super::Match;
use super::MetadataFilter;
use super::VectorIndex;
use super::VectorRecord;
use crate::errors::Result;

/// Namespaced brute-force index. Stands in for Pinecone in tests and
/// embedded uses; no `[pinecone]` setting selects it.
#[derive(Default)]
pub struct InMemoryIndex {
    namespaces: DashMap<String, HashMap<String, VectorRecord>>,
}

impl InMemoryIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Cosine similarity; zero when either vector has no magnitude
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0;
    let mut mag_a = 0.0;
    let mut mag_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a.sqrt() * mag_b.sqrt())
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<Match>> {
        let Some(records) = self.namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<Match> = records
            .values()
            .filter(|r| r.values.len() == vector.len())
            .filter(|r| filter.map_or(true, |f| f.matches(&r.metadata)))
            .map(|r| Match {
                id: r.id.clone(),
                score: cosine_similarity(vector, &r.values),
                metadata: r.metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn upsert(&self, records: Vec<VectorRecord>, namespace: &str) -> Result<usize> {
        let count = records.len();
        let mut entry = self.namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            entry.insert(record.id.clone(), record);
        }
        Ok(count)
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<()> {
        self.namespaces.remove(namespace);
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats> {
        let namespaces: HashMap<String, u64> = self
            .namespaces
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().len() as u64))
            .collect();

        Ok(IndexStats {
            total_vector_count: namespaces.values().sum(),
            namespaces,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::ChunkMetadata;

    fn record(id: &str, values: Vec<f32>, source: &str) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            values,
            metadata: ChunkMetadata::new(source, format!("text of {id}")),
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_query_orders_by_score_and_truncates() {
        let index = InMemoryIndex::new();
        index
            .upsert(
                vec![
                    record("far", vec![0.0, 1.0], "a.txt"),
                    record("near", vec![1.0, 0.1], "a.txt"),
                    record("exact", vec![1.0, 0.0], "b.txt"),
                ],
                "docs",
            )
            .await
            .unwrap();

        let matches = index.query(&[1.0, 0.0], 2, "docs", None).await.unwrap();
        let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["exact", "near"]);
        assert!(matches[0].score >= matches[1].score);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let index = InMemoryIndex::new();
        index
            .upsert(vec![record("a", vec![1.0, 0.0], "a.txt")], "docs")
            .await
            .unwrap();
        index
            .upsert(vec![record("m", vec![1.0, 0.0], "chat")], "memories")
            .await
            .unwrap();

        let docs = index.query(&[1.0, 0.0], 10, "docs", None).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "a");

        assert!(index.query(&[1.0, 0.0], 10, "missing", None).await.unwrap().is_empty());

        index.delete_namespace("docs").await.unwrap();
        let stats = index.stats().await.unwrap();
        assert_eq!(stats.total_vector_count, 1);
        assert_eq!(stats.namespaces.get("memories"), Some(&1));
    }

    #[tokio::test]
    async fn test_filter_and_upsert_replace() {
        let index = InMemoryIndex::new();
        index
            .upsert(
                vec![
                    record("a", vec![1.0, 0.0], "a.txt"),
                    record("b", vec![1.0, 0.0], "b.txt"),
                ],
                "docs",
            )
            .await
            .unwrap();
        index
            .upsert(vec![record("a", vec![0.0, 1.0], "a.txt")], "docs")
            .await
            .unwrap();

        let filter = MetadataFilter::new().eq("source", "a.txt");
        let matches = index
            .query(&[0.0, 1.0], 10, "docs", Some(&filter))
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert!((matches[0].score - 1.0).abs() < 1e-6);
        assert_eq!(index.stats().await.unwrap().total_vector_count, 2);
    }
}
