// Inbound event handling for the support bot
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::rag::SupportPipeline;
use crate::triage::TriageGate;

/// A message delivered by the chat transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub text: String,
    pub sender_is_bot: bool,
    pub is_threaded_reply: bool,
}

impl InboundEvent {
    /// A top-level message from a human
    pub fn direct(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender_is_bot: false,
            is_threaded_reply: false,
        }
    }

    /// Trimmed text if the event may enter the query path
    pub fn question(&self) -> Option<&str> {
        if self.sender_is_bot || self.is_threaded_reply {
            return None;
        }
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }
}

/// Support bot wiring triage and the answer pipeline together
pub struct SupportBot {
    pipeline: Arc<SupportPipeline>,
    triage: TriageGate,
}

impl SupportBot {
    pub fn new(pipeline: Arc<SupportPipeline>, triage: TriageGate) -> Self {
        Self { pipeline, triage }
    }

    /// Reply to an event, or `None` when the bot should stay quiet
    pub async fn handle(&self, event: &InboundEvent) -> Option<String> {
        let question = event.question()?;

        match self.triage.needs_response(question).await {
            Ok(false) => {
                info!(text = question, "skipping, no response needed");
                return None;
            }
            Ok(true) => {}
            Err(err) => {
                warn!(error = %err, "triage failed, answering anyway");
            }
        }

        match self.pipeline.answer(question).await {
            Ok(answer) => Some(answer.text),
            Err(err) => {
                error!(error = %err, "failed to answer question");
                Some(format!("Sorry, I ran into an error: {}", err.brief()))
            }
        }
    }

    pub fn pipeline(&self) -> &SupportPipeline {
        &self.pipeline
    }
}
