//! Grounded answer generation.

use crate::chunk::Chunk;
use statute_core::config::GenerationSettings;
use statute_core::{AppError, AppResult};
use statute_llm::{LlmClient, LlmRequest};
use statute_prompt::{build_prompt, PromptDefinition};
use std::sync::Arc;
use std::time::Duration;

/// Produces an answer from a question and its retrieved context.
///
/// The directive in the prompt restricts the model to the supplied context
/// and names the fixed phrase to use when the context lacks the answer.
/// With no context at all the phrase is returned without calling the model.
#[derive(Clone)]
pub struct AnswerGenerator {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl AnswerGenerator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        settings: &GenerationSettings,
    ) -> Self {
        Self {
            client,
            prompt,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    /// Override the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The fixed "not available" phrase of the active prompt.
    pub fn not_available(&self) -> &str {
        &self.prompt.not_available
    }

    pub fn prompt_id(&self) -> &str {
        &self.prompt.id
    }

    /// Generate an answer grounded in `context`.
    ///
    /// Makes at most one model call, bounded by the configured timeout.
    pub async fn generate(&self, question: &str, context: &[Chunk]) -> AppResult<String> {
        if context.is_empty() {
            tracing::info!("No context retrieved, answering with the not-available phrase");
            return Ok(self.prompt.not_available.clone());
        }

        let texts: Vec<&str> = context.iter().map(Chunk::text).collect();
        let built = build_prompt(&self.prompt, question, &texts)?;

        let mut request = LlmRequest::new(built.user, &self.model)
            .with_system(built.system)
            .with_temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        tracing::debug!(
            "Generating answer with {} (model: {}, {} chunks, {} context chars)",
            self.client.provider_name(),
            self.model,
            built.metadata.context_chunks,
            built.metadata.context_chars
        );

        let response = tokio::time::timeout(self.timeout, self.client.complete(&request))
            .await
            .map_err(|_| AppError::timeout("answer generation", self.timeout))?
            .map_err(|e| match e {
                AppError::Generation(_) | AppError::Timeout { .. } => e,
                other => AppError::Generation(format!(
                    "{} request failed: {}",
                    self.client.provider_name(),
                    other
                )),
            })?;

        let answer = response.content.trim();
        if answer.is_empty() {
            return Err(AppError::Generation(format!(
                "{} returned an empty answer",
                self.client.provider_name()
            )));
        }

        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk;
    use crate::document::Document;
    use statute_llm::{LlmResponse, LlmUsage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct RecordingClient {
        calls: AtomicUsize,
        last: Mutex<Option<LlmRequest>>,
        reply: String,
        delay: Duration,
    }

    impl RecordingClient {
        fn new(reply: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
                reply: reply.to_string(),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for RecordingClient {
        fn provider_name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request.clone());
            tokio::time::sleep(self.delay).await;
            Ok(LlmResponse {
                content: self.reply.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    fn generator(client: Arc<RecordingClient>) -> AnswerGenerator {
        let prompt = statute_prompt::builtin_prompt("legal.answer.en").unwrap();
        AnswerGenerator::new(client, prompt, &GenerationSettings::default())
    }

    fn context() -> Vec<Chunk> {
        let document = Arc::new(Document::from_text(
            "Article 1: Marriage is a consensual contract between a man and a woman.",
        ));
        chunk::split(&document, 200, 0).unwrap()
    }

    #[tokio::test]
    async fn test_empty_context_skips_model() {
        let client = Arc::new(RecordingClient::new("unused"));
        let generator = generator(client.clone());

        let answer = generator.generate("What is the capital of France?", &[]).await.unwrap();

        assert_eq!(answer, generator.not_available());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_single_call_with_context_in_system() {
        let client = Arc::new(RecordingClient::new("  Marriage is a consensual contract.  "));
        let generator = generator(client.clone());

        let answer = generator.generate("What is marriage?", &context()).await.unwrap();

        assert_eq!(answer, "Marriage is a consensual contract.");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        let request = client.last.lock().unwrap().clone().unwrap();
        assert_eq!(request.prompt, "What is marriage?");
        assert_eq!(request.model, "gemini-1.5-pro");
        assert_eq!(request.temperature, Some(1.0));
        let system = request.system.unwrap();
        assert!(system.contains("Article 1: Marriage is a consensual contract"));
        assert!(system.contains(generator.not_available()));
    }

    #[tokio::test]
    async fn test_timeout() {
        let mut client = RecordingClient::new("late");
        client.delay = Duration::from_secs(30);
        let generator = generator(Arc::new(client)).with_timeout(Duration::from_millis(20));

        let err = generator.generate("What is marriage?", &context()).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_empty_reply_is_error() {
        let generator = generator(Arc::new(RecordingClient::new("   ")));
        let err = generator.generate("What is marriage?", &context()).await.unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }
}
