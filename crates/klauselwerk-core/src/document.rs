//! Contract document input
//!
//! The immutable input value for one pipeline invocation. Text extraction
//! from PDF/DOCX happens upstream; the core only ever sees plain text.

use serde::{Deserialize, Serialize};

use crate::taxonomy::{Jurisdiction, Language};

/// Raw contract document as handed over by the extraction collaborator.
///
/// Created once per invocation and never mutated. The core does not persist
/// documents; the caller owns their lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDocument {
    /// Full extracted text
    pub text: String,
    /// Original filename, used as a weak classification signal
    pub filename: String,
    /// Optional language hint from the extraction layer
    pub language_hint: Option<String>,
    /// Optional jurisdiction hint from the extraction layer
    pub jurisdiction_hint: Option<String>,
}

impl ContractDocument {
    /// Create a document from text and filename without hints.
    pub fn new(text: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filename: filename.into(),
            language_hint: None,
            jurisdiction_hint: None,
        }
    }

    /// Attach a language hint.
    pub fn with_language_hint(mut self, hint: impl Into<String>) -> Self {
        self.language_hint = Some(hint.into());
        self
    }

    /// Attach a jurisdiction hint.
    pub fn with_jurisdiction_hint(mut self, hint: impl Into<String>) -> Self {
        self.jurisdiction_hint = Some(hint.into());
        self
    }

    /// Resolved document language (hint normalized, default German).
    pub fn language(&self) -> Language {
        Language::from_hint(self.language_hint.as_deref())
    }

    /// Resolved jurisdiction (hint normalized, default DE).
    pub fn jurisdiction(&self) -> Jurisdiction {
        Jurisdiction::from_hint(self.jurisdiction_hint.as_deref())
    }
}

/// Optional non-authoritative context from upstream analysis collaborators.
///
/// Folded into the LLM prompt as background; never trusted as ground truth.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextHints {
    /// Summary of a prior analysis of the same document, if any
    pub prior_summary: Option<String>,
    /// Risk-score hint (0-100) from an upstream scorer
    pub risk_hint: Option<u8>,
}
