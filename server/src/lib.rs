//! HTTP front end for the math tutor.
//!
//! A browser page talks to these endpoints; the conversation itself lives in
//! a single [`mathtutor_core::ChatController`] shared by all requests.

pub mod http_server;

pub use http_server::{router, run_server, AppState};
