//! Submit / clear orchestration around the conversation store.
//!
//! The controller is the only place a gateway failure is handled: it turns
//! the failure into an error message in the conversation and never returns
//! it to the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, error, info};

use crate::client::ModelGateway;
use crate::conversation::{Conversation, Message};
use crate::formatter::{format_history, parse_data_url, PendingMessage};
use crate::prompt::CLEAR_CONFIRMATION;

/// Asks the student to confirm a destructive action
pub trait ConfirmPrompt {
    fn confirm(&self, question: &str) -> bool;
}

/// An answer already collected by the caller
impl ConfirmPrompt for bool {
    fn confirm(&self, _question: &str) -> bool {
        *self
    }
}

/// Why a submission was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// No text and no image
    Empty,
    /// Image is not a `data:<mime>;base64,<payload>` URL
    InvalidImage,
    /// Another submission is waiting on the model
    Busy,
}

/// Result of [`ChatController::submit`]
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing appended, no model call made
    Rejected(Rejected),
    /// The model replied; holds the user message and the reply
    Answered { question: Message, reply: Message },
    /// The model call failed; holds the user message and the error message
    Failed { question: Message, reply: Message },
}

impl SubmitOutcome {
    /// Messages appended by this submission, in order
    pub fn appended(&self) -> Vec<Message> {
        match self {
            SubmitOutcome::Rejected(_) => Vec::new(),
            SubmitOutcome::Answered { question, reply }
            | SubmitOutcome::Failed { question, reply } => vec![question.clone(), reply.clone()],
        }
    }
}

/// Releases the in-flight flag however the submission ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the conversation and drives the model gateway
pub struct ChatController {
    conversation: RwLock<Conversation>,
    gateway: Arc<dyn ModelGateway>,
    in_flight: AtomicBool,
}

impl ChatController {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            conversation: RwLock::new(Conversation::new()),
            gateway,
            in_flight: AtomicBool::new(false),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Conversation> {
        self.conversation
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Conversation> {
        self.conversation
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the conversation
    pub fn messages(&self) -> Vec<Message> {
        self.read().messages().to_vec()
    }

    /// Whether a model call is outstanding
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Send a student message to the model.
    ///
    /// Appends the student message, then exactly one model message: the reply,
    /// or an error message when the call fails.
    pub async fn submit(&self, text: &str, image_url: Option<String>) -> SubmitOutcome {
        let pending = PendingMessage::new(text, image_url);
        if pending.is_empty() {
            debug!("Ignoring empty submission");
            return SubmitOutcome::Rejected(Rejected::Empty);
        }
        if let Some(url) = pending.image_url.as_deref() {
            if parse_data_url(url).is_none() {
                debug!("Ignoring submission with a malformed image");
                return SubmitOutcome::Rejected(Rejected::InvalidImage);
            }
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Ignoring submission while another is in flight");
            return SubmitOutcome::Rejected(Rejected::Busy);
        }
        let _guard = InFlight(&self.in_flight);

        let question = Message::user(pending.text.clone(), pending.image_url.clone());
        let history = {
            let mut conversation = self.write();
            let history = format_history(conversation.messages());
            conversation.push(question.clone());
            history
        };
        info!(
            history = history.len(),
            has_image = question.has_image(),
            "Submitting question"
        );

        match self.gateway.generate(history, &pending).await {
            Ok(text) => {
                let reply = Message::model(text);
                self.write().push(reply.clone());
                SubmitOutcome::Answered { question, reply }
            }
            Err(e) => {
                error!(error = %e, detail = e.detail(), "Model call failed");
                let reply = Message::error();
                self.write().push(reply.clone());
                SubmitOutcome::Failed { question, reply }
            }
        }
    }

    /// Reset the conversation after the student confirms. Returns whether
    /// the history was cleared.
    pub fn clear(&self, prompt: &dyn ConfirmPrompt) -> bool {
        if !prompt.confirm(CLEAR_CONFIRMATION) {
            debug!("Clear declined");
            return false;
        }

        self.write().reset();
        info!("Conversation cleared");
        true
    }
}
