use crate::chunking::{chunk_words, ChunkingConfig};
use crate::embeddings::Embedder;
use crate::error::{IngestError, QueryError};
use crate::extractor::PdfExtractor;
use crate::index::{IndexCell, VectorIndex};
use crate::models::{Chunk, IngestionReport, RetrievalOptions};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};

/// Composes chunker, embedder, and vector index into "ingest document"
/// and "retrieve top-k context" operations. Owns the index lifecycle:
/// each successful ingest replaces the live index in one swap, and a
/// failed ingest leaves the previous index untouched.
pub struct RetrievalService<E, X> {
    embedder: E,
    extractor: X,
    options: RetrievalOptions,
    index: IndexCell,
}

impl<E, X> RetrievalService<E, X>
where
    E: Embedder + Send + Sync,
    X: PdfExtractor + Send + Sync,
{
    pub fn new(embedder: E, extractor: X, options: RetrievalOptions) -> Self {
        Self {
            embedder,
            extractor,
            options,
            index: IndexCell::new(),
        }
    }

    pub fn options(&self) -> &RetrievalOptions {
        &self.options
    }

    pub fn has_index(&self) -> bool {
        self.index.is_loaded()
    }

    pub fn ingest_file(&self, path: &Path) -> Result<IngestionReport, IngestError> {
        let text = self.extractor.extract_text(path)?;
        self.ingest_text(&path.to_string_lossy(), &text)
    }

    pub fn ingest_text(&self, source: &str, raw_text: &str) -> Result<IngestionReport, IngestError> {
        let config = ChunkingConfig {
            chunk_words: self.options.chunk_words,
            overlap_words: self.options.overlap_words,
        };

        debug!(source, phase = "chunking", "ingestion started");
        let chunks = chunk_words(raw_text, &config)?;

        debug!(chunk_count = chunks.len(), phase = "embedding", "embedding chunks");
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;

        debug!(phase = "indexing", "building index");
        let index = VectorIndex::build(chunks.into_iter().zip(vectors).collect())?;

        let report = IngestionReport {
            source: source.to_string(),
            checksum: digest_text(raw_text),
            chunk_count: index.len(),
            dimensions: index.dimensions(),
            ingested_at: Utc::now(),
        };

        self.index.install(index);
        info!(source, chunk_count = report.chunk_count, "index replaced");
        Ok(report)
    }

    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Chunk>, QueryError> {
        let index = self.index.snapshot().ok_or(QueryError::NoIndexLoaded)?;
        let effective = self.rewrite_query(query);
        let query_vector = self.embedder.embed(&effective);
        index.search(&query_vector, k)
    }

    /// Retrieves with the configured default top-k.
    pub fn retrieve_top(&self, query: &str) -> Result<Vec<Chunk>, QueryError> {
        self.retrieve(query, self.options.top_k)
    }

    fn rewrite_query(&self, query: &str) -> String {
        for rewrite in &self.options.rewrites {
            if rewrite.matches(query) {
                debug!(original = query, "query rewritten by synonym table");
                return rewrite.rewritten.clone();
            }
        }
        query.to_string()
    }
}

fn digest_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
