use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid generation response: {0}")]
    BackendResponse(String),
}

/// Named string template with `{name}` fill-points. Rendering is a pure
/// function of the template and its inputs.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let mut output = self.template.clone();
        for (name, value) in values {
            output = output.replace(&format!("{{{name}}}"), value);
        }
        output
    }
}

/// External text-generation capability. One prompt in, one completion out;
/// retries, if any, belong to the adapter behind this trait.
#[async_trait]
pub trait TextGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenRouter-compatible endpoints.
pub struct OpenRouterGenerator {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    referer: String,
    title: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenRouterGenerator {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key,
            referer: "https://example.invalid".to_string(),
            title: "pdf-qa".to_string(),
            timeout: Duration::from_secs(60),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_attribution(mut self, referer: impl Into<String>, title: impl Into<String>) -> Self {
        self.referer = referer.into();
        self.title = title.into();
        self
    }
}

#[async_trait]
impl TextGenerator for OpenRouterGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let payload = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let mut request = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header("content-type", "application/json")
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&payload);

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(GenerationError::BackendResponse(format!(
                "generation request to {} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let payload: ChatResponse = response.json().await?;
        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                GenerationError::BackendResponse(
                    "generation response had no message content".to_string(),
                )
            })
    }
}

pub const DRAFT_FALLBACK: &str = "Sorry, I couldn't retrieve your answer right now.";
pub const REFLECT_FALLBACK: &str = "No suggestions generated.";

pub const DRAFT_TEMPLATE: &str = "\
You are a senior coverage assistant helping members understand their policy documents.

You are friendly, professional, and speak in a helpful tone, like you are on a customer support call. Read the provided document context and explain the relevant benefits, waiting periods, exclusions, and anything else important in a human, customer-friendly way.

Avoid listing raw data or bullet points unless helpful. Keep it concise, but clear. Mention waiting periods and exclusions where appropriate.

Here is the document context:
---
{context}
---

And here is the customer's question:
\"{question}\"

Please provide your response below:
";

pub const REPHRASE_TEMPLATE: &str = "\
You are a message enhancer. Take the input message and improve clarity, tone, and friendliness without changing the meaning.
Remove any technical formatting like \"Question:\" or \"Answer:\" and make it a natural response from a senior coverage assistant.
No feedback or suggestions at the end.
Do not mention the tone of the message in the message.
Input:
{draft}

Improved Final Output:
";

pub const REFLECT_TEMPLATE: &str = "\
You are a reflection module that reviews answers given to users and offers a helpful analysis to improve clarity or tone.
Focus on how human-like, friendly, and helpful the message sounds. Suggest small tweaks or enhancements.

Content:
{content}

Suggestions:
";

/// What a stage yields when the external call fails.
#[derive(Debug, Clone)]
pub enum StageFallback {
    /// A fixed substitute string.
    Fixed(String),
    /// Echo the named fill-point unchanged, so content is never dropped.
    EchoInput(&'static str),
}

/// One generation step: fills its template, calls the external capability
/// once, trims the result. A failed call is absorbed into the stage
/// fallback; a stage always yields a string and never propagates an error.
pub struct GenerationStage {
    name: &'static str,
    template: PromptTemplate,
    fallback: StageFallback,
}

impl GenerationStage {
    pub fn draft() -> Self {
        Self {
            name: "draft",
            template: PromptTemplate::new(DRAFT_TEMPLATE),
            fallback: StageFallback::Fixed(DRAFT_FALLBACK.to_string()),
        }
    }

    pub fn rephrase() -> Self {
        Self {
            name: "rephrase",
            template: PromptTemplate::new(REPHRASE_TEMPLATE),
            fallback: StageFallback::EchoInput("draft"),
        }
    }

    pub fn reflect() -> Self {
        Self {
            name: "reflect",
            template: PromptTemplate::new(REFLECT_TEMPLATE),
            fallback: StageFallback::Fixed(REFLECT_FALLBACK.to_string()),
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn run<G>(&self, generator: &G, inputs: &[(&str, &str)]) -> String
    where
        G: TextGenerator + Sync,
    {
        let prompt = self.template.render(inputs);
        match generator.complete(&prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(error) => {
                warn!(stage = self.name, %error, "generation failed, substituting fallback");
                self.fallback_value(inputs)
            }
        }
    }

    fn fallback_value(&self, inputs: &[(&str, &str)]) -> String {
        match &self.fallback {
            StageFallback::Fixed(text) => text.clone(),
            StageFallback::EchoInput(field) => inputs
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedGenerator {
        reply: Result<String, String>,
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn complete(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.reply
                .clone()
                .map_err(GenerationError::BackendResponse)
        }
    }

    #[test]
    fn template_fills_named_points() {
        let template = PromptTemplate::new("Q: {question}\nC: {context}");
        let rendered = template.render(&[("question", "what?"), ("context", "- a\n- b")]);
        assert_eq!(rendered, "Q: what?\nC: - a\n- b");
    }

    #[test]
    fn unfilled_points_are_left_verbatim() {
        let template = PromptTemplate::new("{present} and {absent}");
        assert_eq!(template.render(&[("present", "x")]), "x and {absent}");
    }

    #[tokio::test]
    async fn stage_trims_successful_output() {
        let generator = ScriptedGenerator {
            reply: Ok("  the answer \n".to_string()),
        };
        let answer = GenerationStage::draft()
            .run(&generator, &[("context", "- c"), ("question", "q")])
            .await;
        assert_eq!(answer, "the answer");
    }

    #[tokio::test]
    async fn failed_draft_yields_fixed_apology() {
        let generator = ScriptedGenerator {
            reply: Err("backend down".to_string()),
        };
        let answer = GenerationStage::draft()
            .run(&generator, &[("context", "- c"), ("question", "q")])
            .await;
        assert_eq!(answer, DRAFT_FALLBACK);
    }

    #[tokio::test]
    async fn failed_rephrase_echoes_the_draft_unchanged() {
        let generator = ScriptedGenerator {
            reply: Err("backend down".to_string()),
        };
        let answer = GenerationStage::rephrase()
            .run(&generator, &[("draft", "the raw draft text")])
            .await;
        assert_eq!(answer, "the raw draft text");
    }

    #[tokio::test]
    async fn failed_reflect_reports_no_suggestions() {
        let generator = ScriptedGenerator {
            reply: Err("backend down".to_string()),
        };
        let suggestions = GenerationStage::reflect()
            .run(&generator, &[("content", "prior answer")])
            .await;
        assert_eq!(suggestions, REFLECT_FALLBACK);
    }
}
