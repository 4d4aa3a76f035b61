pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod index;
pub mod models;
pub mod orchestrator;
pub mod retrieval;

pub use chunking::{chunk_words, ChunkingConfig};
pub use embeddings::{CharacterNgramEmbedder, Embedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{IngestError, QueryError};
pub use extractor::{LopdfExtractor, PdfExtractor};
pub use generation::{
    GenerationError, GenerationStage, OpenRouterGenerator, PromptTemplate, StageFallback,
    TextGenerator, DRAFT_FALLBACK, DRAFT_TEMPLATE, REFLECT_FALLBACK, REFLECT_TEMPLATE,
    REPHRASE_TEMPLATE,
};
pub use index::{IndexCell, VectorIndex};
pub use models::{Chunk, IngestionReport, Message, QueryRewrite, RetrievalOptions, Role};
pub use orchestrator::{AnswerPipeline, NO_DOCUMENT_REPLY};
pub use retrieval::RetrievalService;
