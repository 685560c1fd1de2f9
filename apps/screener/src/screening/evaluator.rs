use async_trait::async_trait;

use crate::llm_client::{LlmClient, LlmError};
use crate::screening::prompts::SCREENING_SYSTEM;

/// Sends a screening prompt to a language model and returns its raw answer.
///
/// Transport failures come back as `Err`; deciding what a failed evaluation
/// means for the candidate is left to the caller.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Production evaluator backed by the chat-completions client.
pub struct LlmEvaluator(pub LlmClient);

#[async_trait]
impl Evaluator for LlmEvaluator {
    async fn evaluate(&self, prompt: &str) -> Result<String, LlmError> {
        self.0.complete(prompt, SCREENING_SYSTEM).await
    }
}
