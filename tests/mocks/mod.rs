//! Mock infrastructure for testing against the chat backend
//!
//! Provides a wiremock server standing in for the backend's `/chat` router.

pub mod backend;

pub use backend::*;
