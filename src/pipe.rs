//! The pipe itself: the host plugin contract and its one implementation.
//!
//! The host runtime sees a named plugin with a valves record and a single
//! async entry point taking the request body plus two optional callbacks.
//! That shape is dictated by the host and is non-negotiable.

use async_trait::async_trait;

use crate::body::{PipeOutput, RequestBody, UserInfo};
use crate::chain::Chain;
use crate::config::Valves;
use crate::events::{EventCall, EventEmitter, EventError, NoopEmitter, NoopEventCall, StatusLevel};
use crate::providers::{self, LlmProvider};
use crate::status::StatusReporter;

/// Static assistant reply (and status description) for an empty payload.
pub const NO_MESSAGES_REPLY: &str = "No messages found in the request body";

/// Builds the provider a request will talk to. Swappable for tests.
pub type ProviderFactory = Box<dyn Fn(&Valves) -> Box<dyn LlmProvider> + Send + Sync>;

/// Host plugin contract: identity, valves, and the async entry point.
#[async_trait]
pub trait PipeFunction: Send + Sync {
    /// Plugin kind discriminator understood by the host.
    fn kind(&self) -> &str {
        "pipe"
    }

    /// Stable plugin identifier.
    fn id(&self) -> &str;

    /// Human-readable plugin name.
    fn name(&self) -> &str;

    /// The user-configurable settings record.
    fn valves(&self) -> &Valves;

    /// Handle one request/response cycle.
    ///
    /// Returns the mutated body or an error record. The `Result` layer
    /// carries only host-callback failures, which are not caught here and
    /// terminate the call in the host.
    ///
    /// # Errors
    ///
    /// Propagates [`EventError`] from the host's emitter unchanged.
    async fn pipe(
        &self,
        body: RequestBody,
        user: Option<&UserInfo>,
        emitter: &dyn EventEmitter,
        event_call: &dyn EventCall,
    ) -> Result<PipeOutput, EventError>;
}

/// The chat pipe: forwards the latest user message through the fixed chain
/// and appends the reply.
pub struct ChainPipe {
    valves: Valves,
    reporter: StatusReporter,
    provider_factory: ProviderFactory,
}

impl ChainPipe {
    /// Create a pipe with the given valves and the real provider backends.
    pub fn new(valves: Valves) -> Self {
        Self::with_provider_factory(valves, Box::new(providers::for_valves))
    }

    /// Create a pipe with a custom provider factory.
    ///
    /// The factory runs once per request, after the empty-payload check, so
    /// an empty conversation never constructs a provider.
    pub fn with_provider_factory(valves: Valves, provider_factory: ProviderFactory) -> Self {
        let reporter = StatusReporter::new(valves.enable_status_indicator, valves.emit_interval());
        Self {
            valves,
            reporter,
            provider_factory,
        }
    }

    /// Run the pipe with no host callbacks attached.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the no-op callbacks cannot error.
    pub async fn pipe_default(&self, body: RequestBody) -> Result<PipeOutput, EventError> {
        self.pipe(body, None, &NoopEmitter, &NoopEventCall).await
    }
}

#[async_trait]
impl PipeFunction for ChainPipe {
    fn id(&self) -> &str {
        "chain_pipe"
    }

    fn name(&self) -> &str {
        "Chain Pipe"
    }

    fn valves(&self) -> &Valves {
        &self.valves
    }

    async fn pipe(
        &self,
        mut body: RequestBody,
        user: Option<&UserInfo>,
        emitter: &dyn EventEmitter,
        _event_call: &dyn EventCall,
    ) -> Result<PipeOutput, EventError> {
        tracing::debug!(
            pipe = self.id(),
            user = user.and_then(|u| u.id.as_deref()),
            messages = body.messages.len(),
            "handling request"
        );

        self.reporter
            .report(emitter, StatusLevel::Info, "Initiating chain", false)
            .await?;

        // Empty conversation: static reply, no provider is ever constructed.
        if body.messages.is_empty() {
            tracing::warn!(pipe = self.id(), "request body contains no messages");
            self.reporter
                .report(emitter, StatusLevel::Error, NO_MESSAGES_REPLY, true)
                .await?;
            body.push_assistant(NO_MESSAGES_REPLY);
            return Ok(PipeOutput::Body(body));
        }

        let chain = Chain::new((self.provider_factory)(&self.valves));

        self.reporter
            .report(emitter, StatusLevel::Info, "Starting chain", false)
            .await?;

        let question = body.last_content().unwrap_or_default().to_owned();
        match chain.invoke(&question).await {
            Ok(reply) => {
                body.push_assistant(reply);
                self.reporter
                    .report(emitter, StatusLevel::Info, "Complete", true)
                    .await?;
                tracing::info!(pipe = self.id(), model = chain.model_id(), "request complete");
                Ok(PipeOutput::Body(body))
            }
            Err(e) => {
                tracing::error!(pipe = self.id(), error = %e, "chain invocation failed");
                self.reporter
                    .report(
                        emitter,
                        StatusLevel::Error,
                        format!("Error during sequence execution: {e}"),
                        true,
                    )
                    .await?;
                Ok(PipeOutput::Error {
                    error: e.to_string(),
                })
            }
        }
    }
}
