//! Papersmith Common Library
//!
//! Shared code for the Papersmith gateway and CLI including:
//! - The paper generation pipeline and its search / generation clients
//! - Structured JSON extraction from model output
//! - Database models and repository
//! - Error types and handling
//! - Configuration management
//! - Credential hashing
//! - Metrics

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod extract;
pub mod generation;
pub mod metrics;
pub mod paper;
pub mod pipeline;
pub mod search;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, PaperStore, Repository, UserStore};
pub use errors::{AppError, Result};
pub use generation::{GeminiClient, GenerationProvider};
pub use paper::{GeneratedPaper, GenerationRequest};
pub use pipeline::{GenerationOutcome, PaperPipeline};
pub use search::{SearchProvider, SerperClient};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
