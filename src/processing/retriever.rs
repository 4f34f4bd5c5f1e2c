//! Evidence retrieval over a per-run similarity collection
//!
//! The similarity index is an external collaborator behind [`SimilarityIndex`];
//! [`InMemoryIndex`] is the bundled exact-scan implementation.

use crate::error::{Result, ResumeFitError};
use crate::processing::document::strip_proficiency_prefix;
use crate::processing::embeddings::{cosine_similarity, Embedder};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Hits per requirement, keyed by the verbatim requirement string
pub type RetrievalMap = BTreeMap<String, Vec<RetrievalHit>>;

/// One ranked document returned for a requirement query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub id: String,
    pub text: String,
    /// Lower is closer
    pub distance: f64,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    Cosine,
}

/// Opaque reference to a collection inside a [`SimilarityIndex`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionHandle {
    name: String,
}

impl CollectionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Nearest-neighbour service holding named document collections
pub trait SimilarityIndex: Send {
    fn create_collection(&mut self, name: &str, metric: DistanceMetric) -> Result<CollectionHandle>;

    fn add_documents(
        &mut self,
        handle: &CollectionHandle,
        texts: &[String],
        ids: &[String],
        metadata: &[BTreeMap<String, Value>],
    ) -> Result<()>;

    /// Up to `top_k` documents ranked by distance
    fn query(&self, handle: &CollectionHandle, text: &str, top_k: usize) -> Result<Vec<RetrievalHit>>;

    fn count(&self, handle: &CollectionHandle) -> Result<usize>;

    fn delete_collection(&mut self, handle: &CollectionHandle) -> Result<()>;
}

struct StoredDocument {
    id: String,
    text: String,
    embedding: Vec<f32>,
    metadata: BTreeMap<String, Value>,
}

/// Exact cosine scan over embedded documents
pub struct InMemoryIndex<E: Embedder> {
    embedder: E,
    collections: HashMap<String, Vec<StoredDocument>>,
}

impl<E: Embedder> InMemoryIndex<E> {
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            collections: HashMap::new(),
        }
    }

    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }

    fn collection(&self, handle: &CollectionHandle) -> Result<&Vec<StoredDocument>> {
        self.collections
            .get(&handle.name)
            .ok_or_else(|| ResumeFitError::Retrieval(format!("Unknown collection: {}", handle.name)))
    }
}

impl<E: Embedder> SimilarityIndex for InMemoryIndex<E> {
    fn create_collection(&mut self, name: &str, metric: DistanceMetric) -> Result<CollectionHandle> {
        let DistanceMetric::Cosine = metric;
        if self.collections.contains_key(name) {
            return Err(ResumeFitError::Retrieval(format!(
                "Collection already exists: {}",
                name
            )));
        }
        self.collections.insert(name.to_string(), Vec::new());
        Ok(CollectionHandle {
            name: name.to_string(),
        })
    }

    fn add_documents(
        &mut self,
        handle: &CollectionHandle,
        texts: &[String],
        ids: &[String],
        metadata: &[BTreeMap<String, Value>],
    ) -> Result<()> {
        if texts.len() != ids.len() || texts.len() != metadata.len() {
            return Err(ResumeFitError::Retrieval(format!(
                "Mismatched document batch: {} texts, {} ids, {} metadata",
                texts.len(),
                ids.len(),
                metadata.len()
            )));
        }

        let embeddings = self.embedder.embed(texts)?;
        let documents = self
            .collections
            .get_mut(&handle.name)
            .ok_or_else(|| ResumeFitError::Retrieval(format!("Unknown collection: {}", handle.name)))?;

        for (((text, id), meta), embedding) in texts.iter().zip(ids).zip(metadata).zip(embeddings) {
            if documents.iter().any(|d| &d.id == id) {
                return Err(ResumeFitError::Retrieval(format!("Duplicate document id: {}", id)));
            }
            documents.push(StoredDocument {
                id: id.clone(),
                text: text.clone(),
                embedding,
                metadata: meta.clone(),
            });
        }
        Ok(())
    }

    fn query(&self, handle: &CollectionHandle, text: &str, top_k: usize) -> Result<Vec<RetrievalHit>> {
        let documents = self.collection(handle)?;
        let query = self
            .embedder
            .embed(&[text.to_string()])?
            .pop()
            .ok_or_else(|| ResumeFitError::Embedding("Embedder returned no vector".to_string()))?;

        let mut scored = Vec::with_capacity(documents.len());
        for doc in documents {
            let similarity = cosine_similarity(&query, &doc.embedding)?;
            let distance = (1.0 - f64::from(similarity)).max(0.0);
            scored.push((distance, doc));
        }
        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(distance, doc)| RetrievalHit {
                id: doc.id.clone(),
                text: doc.text.clone(),
                distance,
                metadata: doc.metadata.clone(),
            })
            .collect())
    }

    fn count(&self, handle: &CollectionHandle) -> Result<usize> {
        Ok(self.collection(handle)?.len())
    }

    fn delete_collection(&mut self, handle: &CollectionHandle) -> Result<()> {
        self.collections
            .remove(&handle.name)
            .map(|_| ())
            .ok_or_else(|| ResumeFitError::Retrieval(format!("Unknown collection: {}", handle.name)))
    }
}

/// Fresh, collision-resistant collection name for one pipeline run
pub fn unique_collection_name() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("resume_v0_{}", &suffix[..8])
}

/// Stable sequential document id
pub fn document_id(index: usize) -> String {
    format!("res-{:04}", index)
}

/// Query text for a requirement: trimmed, with a leading "Proficiency in " removed
pub fn requirement_query(requirement: &str) -> &str {
    let trimmed = requirement.trim();
    strip_proficiency_prefix(trimmed).unwrap_or(trimmed)
}

/// Index resume lines as one document each, ids `res-0000`, `res-0001`, ...
pub fn build_collection(
    index: &mut dyn SimilarityIndex,
    name: &str,
    lines: &[String],
) -> Result<CollectionHandle> {
    let handle = index.create_collection(name, DistanceMetric::Cosine)?;

    let ids: Vec<String> = (0..lines.len()).map(document_id).collect();
    let metadata: Vec<BTreeMap<String, Value>> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            BTreeMap::from([
                ("id".to_string(), Value::from(id.as_str())),
                ("idx".to_string(), Value::from(i)),
            ])
        })
        .collect();

    if let Err(e) = index.add_documents(&handle, lines, &ids, &metadata) {
        // do not leak a half-built collection
        let _ = index.delete_collection(&handle);
        return Err(e);
    }
    Ok(handle)
}

/// Top-k hits for every requirement, keyed by the requirement as written
pub fn retrieve(
    index: &dyn SimilarityIndex,
    handle: &CollectionHandle,
    requirements: &[&str],
    top_k: usize,
) -> Result<RetrievalMap> {
    let mut out = RetrievalMap::new();

    for (i, requirement) in requirements.iter().enumerate() {
        let query = requirement_query(requirement);
        let hits = index.query(handle, query, top_k)?;

        debug!("[retrieve] req[{}] {:?} -> top-{}", i, requirement, hits.len());
        for (rank, hit) in hits.iter().enumerate() {
            debug!("   {:>2}. dist={:.4}  {}", rank + 1, hit.distance, snippet(&hit.text, 120));
        }

        out.insert(requirement.to_string(), hits);
    }

    Ok(out)
}

fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}…", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::embeddings::HashingEmbedder;

    fn resume_lines() -> Vec<String> {
        [
            "Delivered 5 projects using Scheduling, ERP, Oracle with measurable KPIs.",
            "Improved reliability by 30%.",
            "Collaborated with 10 stakeholders to ship on schedule.",
            "Delivered 5 projects using Project Planning, SAP, Lean with measurable KPIs.",
            "Collaborated with 7 stakeholders to ship on schedule. Six Sigma exposure.",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    const REQS: [&str; 2] = ["Proficiency in Six Sigma", "Proficiency in Lean"];

    fn indexed(name: &str) -> (InMemoryIndex<HashingEmbedder>, CollectionHandle) {
        let mut index = InMemoryIndex::new(HashingEmbedder::default());
        let handle = build_collection(&mut index, name, &resume_lines()).unwrap();
        (index, handle)
    }

    #[test]
    fn test_build_and_count() {
        let (index, handle) = indexed("t_count");
        assert_eq!(index.count(&handle).unwrap(), 5);
    }

    #[test]
    fn test_ids_and_metadata_follow_line_order() {
        let (index, handle) = indexed("t_ids");
        let hits = index.query(&handle, "Lean", 5).unwrap();
        let lean = hits.iter().find(|h| h.text.contains("Lean")).unwrap();
        assert_eq!(lean.id, "res-0003");
        assert_eq!(lean.metadata["idx"], Value::from(3));
        assert_eq!(lean.metadata["id"], Value::from("res-0003"));
    }

    #[test]
    fn test_retrieve_contains_expected_tokens() {
        let (index, handle) = indexed("t_tokens");
        let out = retrieve(&index, &handle, &REQS, 3).unwrap();

        assert!(out["Proficiency in Lean"][0].text.to_lowercase().contains("lean"));
        assert!(out["Proficiency in Six Sigma"][0].text.to_lowercase().contains("six sigma"));
    }

    #[test]
    fn test_k_bound_and_short_collections() {
        let (index, handle) = indexed("t_k");
        let out = retrieve(&index, &handle, &REQS, 2).unwrap();
        assert_eq!(out["Proficiency in Lean"].len(), 2);

        let out = retrieve(&index, &handle, &REQS, 10).unwrap();
        assert_eq!(out["Proficiency in Lean"].len(), 5);
    }

    #[test]
    fn test_determinism_same_inputs_same_results() {
        let (index, handle) = indexed("t_det");
        let first = retrieve(&index, &handle, &REQS, 3).unwrap();
        let second = retrieve(&index, &handle, &REQS, 3).unwrap();

        for req in REQS {
            let ids1: Vec<_> = first[req].iter().map(|h| h.id.clone()).collect();
            let ids2: Vec<_> = second[req].iter().map(|h| h.id.clone()).collect();
            assert_eq!(ids1, ids2);
            for (a, b) in first[req].iter().zip(&second[req]) {
                assert!((a.distance - b.distance).abs() < 1e-8);
                assert!(a.distance >= 0.0);
            }
        }
    }

    #[test]
    fn test_duplicate_collection_name_rejected() {
        let (mut index, _) = indexed("t_dup");
        assert!(matches!(
            index.create_collection("t_dup", DistanceMetric::Cosine),
            Err(ResumeFitError::Retrieval(_))
        ));
    }

    #[test]
    fn test_delete_collection() {
        let (mut index, handle) = indexed("t_del");
        index.delete_collection(&handle).unwrap();
        assert_eq!(index.collection_count(), 0);
        assert!(index.query(&handle, "Lean", 3).is_err());
    }

    #[test]
    fn test_requirement_query_strips_prefix() {
        assert_eq!(requirement_query("  Proficiency in Six Sigma "), "Six Sigma");
        assert_eq!(requirement_query("proficiency in lean"), "lean");
        assert_eq!(requirement_query("3+ years of relevant experience"), "3+ years of relevant experience");
    }

    #[test]
    fn test_unique_collection_names() {
        let a = unique_collection_name();
        let b = unique_collection_name();
        assert!(a.starts_with("resume_v0_"));
        assert_eq!(a.len(), "resume_v0_".len() + 8);
        assert_ne!(a, b);
    }
}
