use crate::error::IngestError;
use crate::models::Chunk;

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub chunk_words: usize,
    pub overlap_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_words: 1_000,
            overlap_words: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.chunk_words == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk_words must be greater than zero".to_string(),
            ));
        }
        if self.overlap_words >= self.chunk_words {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap_words {} must be smaller than chunk_words {}",
                self.overlap_words, self.chunk_words
            )));
        }
        Ok(())
    }
}

/// Splits `text` into overlapping word windows. Each window holds
/// `chunk_words` words and the window start advances by
/// `chunk_words - overlap_words`; the final window may be shorter.
/// Empty input yields an empty sequence, which callers must treat as
/// "nothing to index" rather than an error.
pub fn chunk_words(text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, IngestError> {
    config.validate()?;

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let stride = config.chunk_words - config.overlap_words;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + config.chunk_words).min(words.len());
        chunks.push(Chunk {
            text: words[start..end].join(" "),
            ordinal: chunks.len(),
        });
        start += stride;
    }

    Ok(chunks)
}
