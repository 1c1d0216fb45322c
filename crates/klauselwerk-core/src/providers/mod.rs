//! Concrete provider implementations of the [`crate::llm::TextGenerator`] capability
//!
//! The pipeline itself only ever sees the trait; these clients exist so a
//! deployment has something to inject without writing its own adapter.

pub mod openai_compatible;

pub use openai_compatible::OpenAiCompatibleClient;
