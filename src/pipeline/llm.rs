//! VLM interaction: provider resolution and the per-page transcription call.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient. Failed or timed-out
//! calls are retried with exponential backoff (`retry_backoff_ms * 2^n`),
//! capped at [`MAX_BACKOFF_MS`]: with a 500 ms base and 3 retries the waits
//! are 500 ms → 1 s → 2 s.

use crate::config::VisionOptions;
use crate::error::{PageError, SplitError};
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Model used when a provider is chosen but no model is named.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Longest wait between two attempts.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. a pre-built provider in `options.provider`
/// 2. `options.provider_name` + `options.model`
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 4. OpenAI, when `OPENAI_API_KEY` is set
/// 5. `ProviderFactory::from_env()` auto-detection
pub fn resolve_provider(options: &VisionOptions) -> Result<Arc<dyn LLMProvider>, SplitError> {
    if let Some(ref provider) = options.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = options.provider_name {
        let model = options.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        let model = options.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_vision_provider("openai", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| SplitError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, SplitError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        SplitError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Transcribe one rendered page into raw (uncleaned) Markdown.
///
/// The request is a system prompt followed by a user turn carrying the page
/// image and no text; the image is the whole question.
pub async fn transcribe_page(
    provider: &Arc<dyn LLMProvider>,
    page_num: usize,
    image_data: ImageData,
    options: &VisionOptions,
) -> Result<String, PageError> {
    let system_prompt = options
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    let messages = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user_with_images("", vec![image_data]),
    ];
    let completion = build_options(options);
    let call_timeout = Duration::from_secs(options.api_timeout_secs);

    let mut last_err: Option<PageError> = None;

    for attempt in 0..=options.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(options.retry_backoff_ms, attempt);
            warn!(
                "Page {}: retry {}/{} after {}ms",
                page_num, attempt, options.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match timeout(call_timeout, provider.chat(&messages, Some(&completion))).await {
            Ok(Ok(response)) => {
                debug!(
                    "Page {}: {} input tokens, {} output tokens",
                    page_num, response.prompt_tokens, response.completion_tokens
                );
                return Ok(response.content);
            }
            Ok(Err(e)) => {
                warn!("Page {}: attempt {} failed: {}", page_num, attempt + 1, e);
                last_err = Some(PageError::LlmFailed {
                    page: page_num,
                    retries: retries_u8(options.max_retries),
                    detail: e.to_string(),
                });
            }
            Err(_) => {
                warn!(
                    "Page {}: attempt {} timed out after {}s",
                    page_num,
                    attempt + 1,
                    options.api_timeout_secs
                );
                last_err = Some(PageError::Timeout {
                    page: page_num,
                    secs: options.api_timeout_secs,
                });
            }
        }
    }

    Err(last_err.unwrap_or(PageError::LlmFailed {
        page: page_num,
        retries: retries_u8(options.max_retries),
        detail: "Unknown error".to_string(),
    }))
}

/// Delay before retry number `attempt` (1-based).
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS)
}

fn retries_u8(n: u32) -> u8 {
    u8::try_from(n).unwrap_or(u8::MAX)
}

fn build_options(options: &VisionOptions) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(options.temperature),
        max_tokens: Some(options.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::postprocess::clean_markdown;
    use async_trait::async_trait;
    use edgequake_llm::{ChatRole, LLMResponse, LlmError, MockProvider};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers from a fixed queue and keeps every request it receives.
    #[derive(Default)]
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
        delay: Duration,
    }

    impl ScriptedProvider {
        fn replying(replies: Vec<Result<String, LlmError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                ..Default::default()
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-vision"
        }

        fn max_context_length(&self) -> usize {
            8192
        }

        async fn complete(&self, _prompt: &str) -> edgequake_llm::Result<LLMResponse> {
            Err(LlmError::NotSupported("complete".to_string()))
        }

        async fn complete_with_options(
            &self,
            _prompt: &str,
            _options: &CompletionOptions,
        ) -> edgequake_llm::Result<LLMResponse> {
            Err(LlmError::NotSupported("complete_with_options".to_string()))
        }

        async fn chat(
            &self,
            messages: &[ChatMessage],
            _options: Option<&CompletionOptions>,
        ) -> edgequake_llm::Result<LLMResponse> {
            self.requests.lock().unwrap().push(messages.to_vec());
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            let reply = self.replies.lock().unwrap().pop_front();
            reply
                .unwrap_or_else(|| Ok(String::new()))
                .map(|content| LLMResponse::new(content, "scripted-vision"))
        }
    }

    fn page_image() -> ImageData {
        ImageData::new("iVBORw0KGgo=", "image/png")
    }

    fn fast_options(max_retries: u32) -> VisionOptions {
        VisionOptions {
            max_retries,
            retry_backoff_ms: 1,
            ..Default::default()
        }
    }

    #[test]
    fn build_options_defaults() {
        let opts = build_options(&VisionOptions::default());
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(4096));
    }

    #[test]
    fn retries_saturate() {
        assert_eq!(retries_u8(3), 3);
        assert_eq!(retries_u8(1000), u8::MAX);
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 2), 1000);
        assert_eq!(backoff_ms(500, 3), 2000);
        assert_eq!(backoff_ms(500, 20), MAX_BACKOFF_MS);
        assert_eq!(backoff_ms(u64::MAX, 64), MAX_BACKOFF_MS);
    }

    #[tokio::test]
    async fn mock_reply_comes_back_and_fences_are_stripped() {
        let mock = MockProvider::new();
        mock.add_response("```markdown\n# Quarterly Results\n\nRevenue grew.\n```")
            .await;
        let provider: Arc<dyn LLMProvider> = Arc::new(mock);

        let raw = transcribe_page(&provider, 1, page_image(), &fast_options(0))
            .await
            .unwrap();
        assert!(raw.starts_with("```markdown"));
        assert_eq!(clean_markdown(&raw), "# Quarterly Results\n\nRevenue grew.\n");
    }

    #[tokio::test]
    async fn request_is_system_prompt_then_image() {
        let scripted = Arc::new(ScriptedProvider::replying(vec![Ok("text".to_string())]));
        let provider: Arc<dyn LLMProvider> = scripted.clone();

        transcribe_page(&provider, 3, page_image(), &fast_options(0))
            .await
            .unwrap();

        let requests = scripted.requests.lock().unwrap();
        let messages = &requests[0];
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[0].content, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(messages[1].role, ChatRole::User);
        assert!(messages[1].has_images());
    }

    #[tokio::test]
    async fn system_prompt_override_is_sent() {
        let scripted = Arc::new(ScriptedProvider::replying(vec![Ok("| a |".to_string())]));
        let provider: Arc<dyn LLMProvider> = scripted.clone();
        let options = VisionOptions {
            system_prompt: Some("Transcribe tables only.".to_string()),
            ..fast_options(0)
        };

        transcribe_page(&provider, 1, page_image(), &options)
            .await
            .unwrap();

        let requests = scripted.requests.lock().unwrap();
        assert_eq!(requests[0][0].content, "Transcribe tables only.");
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let scripted = Arc::new(ScriptedProvider::replying(vec![
            Err(LlmError::RateLimited("slow down".to_string())),
            Ok("# Second try".to_string()),
        ]));
        let provider: Arc<dyn LLMProvider> = scripted.clone();

        let md = transcribe_page(&provider, 2, page_image(), &fast_options(2))
            .await
            .unwrap();
        assert_eq!(md, "# Second try");
        assert_eq!(scripted.request_count(), 2);
    }

    #[tokio::test]
    async fn exhausted_retries_report_llm_failure() {
        let scripted = Arc::new(ScriptedProvider::replying(vec![
            Err(LlmError::ApiError("boom".to_string())),
            Err(LlmError::ApiError("boom".to_string())),
        ]));
        let provider: Arc<dyn LLMProvider> = scripted.clone();

        let err = transcribe_page(&provider, 4, page_image(), &fast_options(1))
            .await
            .unwrap_err();
        assert!(
            matches!(err, PageError::LlmFailed { page: 4, retries: 1, ref detail } if detail.contains("boom")),
            "got: {err:?}"
        );
        assert_eq!(scripted.request_count(), 2);
    }

    #[tokio::test]
    async fn slow_call_times_out() {
        let scripted = Arc::new(ScriptedProvider {
            delay: Duration::from_secs(5),
            ..ScriptedProvider::replying(vec![Ok("too late".to_string())])
        });
        let provider: Arc<dyn LLMProvider> = scripted.clone();
        let options = VisionOptions {
            api_timeout_secs: 1,
            ..fast_options(0)
        };

        let err = transcribe_page(&provider, 5, page_image(), &options)
            .await
            .unwrap_err();
        assert_eq!(err, PageError::Timeout { page: 5, secs: 1 });
    }
}
