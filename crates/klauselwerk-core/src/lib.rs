//! Klauselwerk Core - contract optimization analysis pipeline
//!
//! Turns raw contract text into a structured, quality-gated set of
//! improvement findings plus a numeric health score and a legal-integrity
//! verdict. A deterministic rule engine and an LLM-based analyzer are
//! reconciled, cleaned, and scored; the external model sits behind a tiered
//! fallback chain with the rule engine as the guaranteed last resort.
//!
//! # Architecture
//!
//! The pipeline is a sequential pass over immutable data:
//!
//! 1. **Classification** (`classifier`): contract-type taxonomy scoring and amendment detection
//! 2. **Gap analysis** (`gap`): declarative required-clause checklists, positive-evidence matching
//! 3. **Clause synthesis** (`synthesis`): self-contained replacement clauses from template tables
//! 4. **Model opinion** (`llm`): schema-constrained request behind an explicit fallback state machine
//! 5. **Quality gate** (`quality`): category repair, anti-fabrication, dedup, evidence gate
//! 6. **Scope enforcement** (`scope`): hard topic filter for amendment documents
//! 7. **Coverage top-up** (`topup`): one narrow supplementary pass when coverage is thin
//! 8. **Scoring and audit** (`score`, `integrity`): weighted health score capped by the integrity level
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use klauselwerk_core::{ContractAnalyzer, ContractDocument};
//! use klauselwerk_core::providers::OpenAiCompatibleClient;
//!
//! # async fn example() -> klauselwerk_core::Result<()> {
//! let generator = Arc::new(OpenAiCompatibleClient::new(
//!     "OpenAI",
//!     std::env::var("OPENAI_API_KEY").ok(),
//!     "https://api.openai.com/v1",
//! ));
//! let analyzer = ContractAnalyzer::new(generator);
//!
//! let document = ContractDocument::new("...vertragstext...", "arbeitsvertrag.pdf");
//! let report = analyzer.analyze(&document).await?;
//!
//! println!("Health: {}", report.score.health);
//! println!("Integrity: {}", report.legal_integrity.label);
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! 1. **Deterministic where possible**: rule tables, taxonomies, and scoring are pure data and folds
//! 2. **Unreliable inputs stay quarantined**: model output is schema-parsed, gated, and evidence-checked
//! 3. **Never fail on service trouble**: the fallback chain ends at the rule engine, not at an error
//! 4. **Immutability**: findings are created fresh per invocation and frozen into the report

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations, clippy::all)]
#![recursion_limit = "256"]

pub mod classifier;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod finding;
pub mod gap;
pub mod integrity;
pub mod llm;
pub mod pipeline;
pub mod providers;
pub mod quality;
pub mod report;
pub mod scope;
pub mod score;
pub mod synthesis;
pub mod taxonomy;
pub mod topup;

// Re-export commonly used types for convenience
pub use classifier::{AmendmentIndicator, ContractTypeInfo, TypeClassifier};
pub use config::{AnalysisConfig, LlmConfig, ScoreConfig};
pub use document::{ContextHints, ContractDocument};
pub use error::{AnalysisError, Result};
pub use finding::{Category, Classification, Difficulty, Finding, Gap, Origin, Severity};
pub use integrity::{IntegrityLevel, LegalIntegrity, LegalIntegrityAuditor};
pub use llm::{FallbackTier, GenerationOutcome, GenerationRequest, TextGenerator};
pub use pipeline::ContractAnalyzer;
pub use report::{AnalysisReport, MaturityAssessment, ScoreBlock, Summary};
pub use taxonomy::{ContractKind, Jurisdiction, Language};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
