//! The fixed prompt chain: template fill → model call → text extraction.
//!
//! The topology is not configurable. Three stages run in sequence per
//! invocation; there is no generic composition machinery behind them.

use crate::providers::{CompletionRequest, LlmProvider, Message, ProviderError, Role};

/// System instruction for every chain invocation.
pub const SYSTEM_PROMPT: &str = "You are a helpful bot";

/// Placeholder substituted with the user's question.
const QUESTION_SLOT: &str = "{question}";

/// Errors from a chain invocation.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The model provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The model answered with no text.
    #[error("model returned an empty completion")]
    EmptyCompletion,
}

/// Two-turn prompt template: a fixed system instruction plus a human turn
/// with a `{question}` slot.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system: String,
    human: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            system: SYSTEM_PROMPT.to_owned(),
            human: QUESTION_SLOT.to_owned(),
        }
    }
}

impl PromptTemplate {
    /// Stage 1: fill the template with the user's question.
    pub fn fill(&self, question: &str) -> CompletionRequest {
        CompletionRequest {
            system: Some(self.system.clone()),
            messages: vec![Message {
                role: Role::User,
                content: self.human.replace(QUESTION_SLOT, question),
            }],
        }
    }
}

/// The composed chain. Owns the template and the provider it feeds.
pub struct Chain {
    prompt: PromptTemplate,
    provider: Box<dyn LlmProvider>,
}

impl Chain {
    /// Compose the fixed template with a provider.
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self {
            prompt: PromptTemplate::default(),
            provider,
        }
    }

    /// Run one question through the chain and return the reply text.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] when the provider fails or answers with no
    /// text.
    pub async fn invoke(&self, question: &str) -> Result<String, ChainError> {
        let request = self.prompt.fill(question);

        let response = self.provider.complete(request).await?;
        tracing::debug!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "chain completion returned"
        );

        // Stage 3: plain-text extraction.
        let text = response.content.trim();
        if text.is_empty() {
            return Err(ChainError::EmptyCompletion);
        }
        Ok(text.to_owned())
    }

    /// The model identifier the chain will invoke.
    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::providers::{CompletionResponse, UsageStats};

    use super::*;

    struct FixedProvider {
        reply: String,
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            assert_eq!(request.system.as_deref(), Some(SYSTEM_PROMPT));
            Ok(CompletionResponse {
                content: self.reply.clone(),
                model: "fixed".to_owned(),
                usage: UsageStats::default(),
            })
        }

        fn model_id(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_template_fill_substitutes_question() {
        let request = PromptTemplate::default().fill("what is rust?");
        assert_eq!(request.system.as_deref(), Some(SYSTEM_PROMPT));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, Role::User);
        assert_eq!(request.messages[0].content, "what is rust?");
    }

    #[tokio::test]
    async fn test_invoke_returns_trimmed_text() {
        let chain = Chain::new(Box::new(FixedProvider {
            reply: "  hi there\n".to_owned(),
        }));
        let out = chain.invoke("hello").await.expect("should succeed");
        assert_eq!(out, "hi there");
    }

    #[tokio::test]
    async fn test_invoke_rejects_empty_completion() {
        let chain = Chain::new(Box::new(FixedProvider {
            reply: "   ".to_owned(),
        }));
        let err = chain.invoke("hello").await.expect_err("should fail");
        assert!(matches!(err, ChainError::EmptyCompletion));
    }
}
