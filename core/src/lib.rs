// Core of the MathTutor suite:
// - Conversation data model
// - Request formatting for the Gemini API
// - Gemini API gateway
// - Markdown + math rendering of model replies
// - Chat controller (submit / clear)
// - Configuration loading
// - Shared error types

// Export types module - Request/response data structures
pub mod types;
pub use types::*;

// Export prompt module - Fixed user-facing strings and the system instruction
pub mod prompt;

// Export conversation module - Messages and the conversation store
pub mod conversation;
pub use conversation::*;

// Export formatter module - Conversation to request contents
pub mod formatter;
pub use formatter::{is_replayable, PendingMessage};

// Export client module - Model gateway for Gemini
pub mod client;
pub use client::*;

// Export render module - Markdown and math rendering
pub mod render;
pub use render::*;

// Export controller module - Submit / clear orchestration
pub mod controller;
pub use controller::*;

// Export config module - Configuration loading
pub mod config;
pub use config::*;

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;
