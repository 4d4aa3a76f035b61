use crate::embeddings::Embedder;
use crate::error::{IngestError, QueryError};
use crate::extractor::PdfExtractor;
use crate::generation::{GenerationStage, TextGenerator};
use crate::models::{Chunk, IngestionReport, Message, Role};
use crate::retrieval::RetrievalService;
use std::path::Path;
use tracing::{debug, warn};

pub const NO_DOCUMENT_REPLY: &str =
    "No document has been loaded yet. Please upload a PDF before asking questions.";

/// Sequences retrieval, draft, and rephrase into one answer per query,
/// and exposes the ingestion and standalone reflection entry points.
/// Once retrieval succeeds the pipeline always yields a string: stage
/// fallbacks absorb generation failures instead of propagating them.
pub struct AnswerPipeline<E, X, G> {
    retrieval: RetrievalService<E, X>,
    generator: G,
    draft: GenerationStage,
    rephrase: GenerationStage,
    reflect: GenerationStage,
}

impl<E, X, G> AnswerPipeline<E, X, G>
where
    E: Embedder + Send + Sync,
    X: PdfExtractor + Send + Sync,
    G: TextGenerator + Send + Sync,
{
    pub fn new(retrieval: RetrievalService<E, X>, generator: G) -> Self {
        Self {
            retrieval,
            generator,
            draft: GenerationStage::draft(),
            rephrase: GenerationStage::rephrase(),
            reflect: GenerationStage::reflect(),
        }
    }

    pub fn with_stages(
        mut self,
        draft: GenerationStage,
        rephrase: GenerationStage,
        reflect: GenerationStage,
    ) -> Self {
        self.draft = draft;
        self.rephrase = rephrase;
        self.reflect = reflect;
        self
    }

    pub fn retrieval(&self) -> &RetrievalService<E, X> {
        &self.retrieval
    }

    pub fn ingest(&self, path: &Path) -> Result<IngestionReport, IngestError> {
        self.retrieval.ingest_file(path)
    }

    /// Answers one question. `NoIndexLoaded` maps to a fixed reply rather
    /// than an error; other retrieval failures propagate since no textual
    /// fallback makes sense for them. The rephrase stage only starts once
    /// the draft is fully available.
    pub async fn answer(&self, question: &str) -> Result<Message, QueryError> {
        debug!(phase = "retrieving", question, "query received");
        let chunks = match self.retrieval.retrieve_top(question) {
            Ok(chunks) => chunks,
            Err(QueryError::NoIndexLoaded) => {
                warn!("query arrived before any document was ingested");
                return Ok(Message::new(Role::Final, NO_DOCUMENT_REPLY));
            }
            Err(error) => return Err(error),
        };

        let context = bullet_block(&chunks);
        debug!(phase = "drafting", hit_count = chunks.len(), "drafting answer");
        let draft = Message::new(
            Role::Draft,
            self.draft
                .run(&self.generator, &[("context", &context), ("question", question)])
                .await,
        );

        debug!(phase = "rephrasing", "rephrasing draft");
        let final_text = self
            .rephrase
            .run(&self.generator, &[("draft", &draft.content)])
            .await;

        debug!(phase = "done", "answer ready");
        Ok(Message::new(Role::Final, final_text))
    }

    /// Standalone reflection pass over prior output text; not part of the
    /// mainline answer path.
    pub async fn reflect(&self, content: &str) -> Message {
        let suggestions = self
            .reflect
            .run(&self.generator, &[("content", content)])
            .await;
        Message::new(Role::Suggestion, suggestions)
    }
}

fn bullet_block(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("- {}", chunk.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::CharacterNgramEmbedder;
    use crate::generation::{GenerationError, DRAFT_FALLBACK, REFLECT_FALLBACK};
    use crate::models::RetrievalOptions;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubExtractor;

    impl PdfExtractor for StubExtractor {
        fn extract_text(&self, _path: &Path) -> Result<String, IngestError> {
            Ok("alpha beta gamma delta epsilon zeta eta theta".to_string())
        }
    }

    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingGenerator {
        fn succeeding() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            if self.fail {
                Err(GenerationError::BackendResponse("backend down".to_string()))
            } else {
                Ok(format!("reply {}", prompts.len()))
            }
        }
    }

    fn pipeline(
        generator: RecordingGenerator,
    ) -> AnswerPipeline<CharacterNgramEmbedder, StubExtractor, RecordingGenerator> {
        let options = RetrievalOptions {
            chunk_words: 4,
            overlap_words: 0,
            top_k: 2,
            rewrites: Vec::new(),
        };
        let retrieval = RetrievalService::new(
            CharacterNgramEmbedder { dimensions: 32 },
            StubExtractor,
            options,
        );
        AnswerPipeline::new(retrieval, generator)
    }

    #[tokio::test]
    async fn query_before_ingest_gets_the_fixed_reply() {
        let pipeline = pipeline(RecordingGenerator::succeeding());
        let answer = pipeline.answer("anything").await.unwrap();
        assert_eq!(answer.content, NO_DOCUMENT_REPLY);
        assert_eq!(answer.role, Role::Final);
    }

    #[tokio::test]
    async fn draft_runs_before_rephrase_and_feeds_it() {
        let pipeline = pipeline(RecordingGenerator::succeeding());
        pipeline.ingest(Path::new("/tmp/doc.pdf")).unwrap();

        let answer = pipeline.answer("what is covered?").await.unwrap();
        assert_eq!(answer.content, "reply 2");

        let prompts = pipeline.generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("what is covered?"));
        assert!(prompts[0].contains("- alpha beta gamma delta"));
        assert!(prompts[1].contains("reply 1"));
    }

    #[tokio::test]
    async fn generation_outage_degrades_to_the_apology() {
        let pipeline = pipeline(RecordingGenerator::failing());
        pipeline.ingest(Path::new("/tmp/doc.pdf")).unwrap();

        let answer = pipeline.answer("what is covered?").await.unwrap();
        // draft falls back to the apology and the failed rephrase echoes it
        assert_eq!(answer.content, DRAFT_FALLBACK);
        assert_eq!(answer.role, Role::Final);
    }

    #[tokio::test]
    async fn custom_templates_are_injectable() {
        use crate::generation::PromptTemplate;

        let pipeline = pipeline(RecordingGenerator::succeeding()).with_stages(
            GenerationStage::draft().with_template(PromptTemplate::new("DRAFT: {question}")),
            GenerationStage::rephrase().with_template(PromptTemplate::new("POLISH: {draft}")),
            GenerationStage::reflect(),
        );
        pipeline.ingest(Path::new("/tmp/doc.pdf")).unwrap();
        pipeline.answer("what is covered?").await.unwrap();

        let prompts = pipeline.generator.prompts.lock().unwrap();
        assert_eq!(prompts[0], "DRAFT: what is covered?");
        assert_eq!(prompts[1], "POLISH: reply 1");
    }

    #[tokio::test]
    async fn reflect_is_independent_of_the_answer_path() {
        let pipeline = pipeline(RecordingGenerator::succeeding());
        let suggestions = pipeline.reflect("a prior answer").await;
        assert_eq!(suggestions.role, Role::Suggestion);
        assert_eq!(suggestions.content, "reply 1");
    }

    #[tokio::test]
    async fn reflect_outage_reports_no_suggestions() {
        let pipeline = pipeline(RecordingGenerator::failing());
        let suggestions = pipeline.reflect("a prior answer").await;
        assert_eq!(suggestions.content, REFLECT_FALLBACK);
    }
}
