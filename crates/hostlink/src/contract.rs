//! The calling convention every host command goes through.
//!
//! 1. normalize parameters
//! 2. acquire the session, or fail fast with "failed to connect"
//! 3. exchange one envelope
//! 4. no reply becomes "no response"
//! 5. a reply is returned as the host wrote it
//! 6. on success only, run post-success hooks; their failures are logged and
//!    never touch the result

use std::sync::Arc;

use async_trait::async_trait;

use crate::bridge::protocol::{CommandEnvelope, decode_reply};
use crate::bridge::session::Session;
use crate::commands::HostCommand;
use crate::knowledge::KnowledgeClient;
use crate::result::CommandResult;

/// Bookkeeping that runs after a command succeeds.
#[async_trait]
pub trait PostSuccessHook: Send + Sync {
    fn name(&self) -> &'static str;

    async fn after_success(&self, command: &HostCommand, result: &CommandResult) -> anyhow::Result<()>;
}

pub struct Bridge {
    session: Arc<Session>,
    hooks: Vec<Arc<dyn PostSuccessHook>>,
}

impl Bridge {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn PostSuccessHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Run one catalogue command through the full contract.
    pub async fn execute(&self, command: impl Into<HostCommand>) -> CommandResult {
        let mut command = command.into();
        command.normalize();

        let envelope = match command.to_envelope() {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(command = command.tool_name(), error = %e, "Could not encode command");
                return CommandResult::invalid_parameter(format!("Could not encode parameters: {e}"));
            }
        };

        let result = self.send(&envelope).await;

        if result.is_success() {
            self.run_hooks(&command, &result).await;
        } else {
            tracing::debug!(
                command = command.tool_name(),
                error = result.error().unwrap_or_default(),
                "Command failed"
            );
        }
        result
    }

    /// Send a raw envelope. Steps 2-5 of the contract, no hooks.
    pub async fn send(&self, envelope: &CommandEnvelope) -> CommandResult {
        let Some(mut guard) = self.session.acquire().await else {
            return CommandResult::failed_to_connect();
        };

        let Some(reply) = guard.exchange(envelope).await else {
            return CommandResult::no_response();
        };
        drop(guard);

        match decode_reply(reply) {
            Some(reply) => CommandResult::from_reply(reply),
            None => {
                tracing::warn!(command = %envelope.name, "Host reply was not a JSON object");
                CommandResult::no_response()
            }
        }
    }

    async fn run_hooks(&self, command: &HostCommand, result: &CommandResult) {
        for hook in &self.hooks {
            if let Err(e) = hook.after_success(command, result).await {
                tracing::warn!(
                    hook = hook.name(),
                    command = command.tool_name(),
                    error = %e,
                    "Post-success hook failed"
                );
            }
        }
    }
}

/// Records a command's rationale in the knowledge store.
pub struct RationaleHook {
    knowledge: Arc<KnowledgeClient>,
}

impl RationaleHook {
    pub fn new(knowledge: Arc<KnowledgeClient>) -> Self {
        Self { knowledge }
    }
}

#[async_trait]
impl PostSuccessHook for RationaleHook {
    fn name(&self) -> &'static str {
        "rationale"
    }

    async fn after_success(&self, command: &HostCommand, _result: &CommandResult) -> anyhow::Result<()> {
        let Some(rationale) = command.rationale() else {
            return Ok(());
        };
        if !self.knowledge.is_enabled() {
            tracing::debug!(action = rationale.action, "Knowledge store disabled, rationale not recorded");
            return Ok(());
        }

        let id = self
            .knowledge
            .record_rationale(
                rationale.action,
                &rationale.details,
                &rationale.rationale,
                rationale.category,
            )
            .await?;
        tracing::info!(action = rationale.action, category = rationale.category, id = %id, "Recorded rationale");
        Ok(())
    }
}
