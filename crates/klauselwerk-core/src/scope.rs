//! Amendment scope enforcement
//!
//! A hard, deterministic filter that runs only for amendment documents. An
//! amendment is checked against the topics it genuinely governs - the fixed
//! core set plus whatever the matched indicator unlocked - and nothing else.
//! The filter overrides anything the model asserted.

use serde::{Deserialize, Serialize};

use crate::classifier::ContractTypeInfo;
use crate::finding::Finding;
use crate::taxonomy::{AMENDMENT_CORE_TOPICS, AMENDMENT_FORBIDDEN_TOPICS};

/// Counters for diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeStats {
    pub input: usize,
    pub removed_forbidden: usize,
    pub removed_out_of_scope: usize,
    pub output: usize,
}

/// Hard topic filter for amendment documents.
#[derive(Debug, Default)]
pub struct ScopeEnforcer;

impl ScopeEnforcer {
    pub fn new() -> Self {
        Self
    }

    /// Remove findings an amendment must not raise. Full contracts pass
    /// through untouched.
    pub fn enforce(
        &self,
        findings: Vec<Finding>,
        type_info: &ContractTypeInfo,
    ) -> (Vec<Finding>, ScopeStats) {
        let mut stats = ScopeStats {
            input: findings.len(),
            ..ScopeStats::default()
        };

        if !type_info.is_amendment {
            stats.output = findings.len();
            return (findings, stats);
        }

        let changed = type_info.changed_topics();
        let kept: Vec<Finding> = findings
            .into_iter()
            .filter(|finding| {
                let topic = finding.category.as_str();
                let in_core = AMENDMENT_CORE_TOPICS.contains(&topic);
                let in_changed = changed.iter().any(|t| t == topic);

                if in_core || in_changed {
                    return true;
                }
                if AMENDMENT_FORBIDDEN_TOPICS.contains(&topic) {
                    stats.removed_forbidden += 1;
                } else {
                    stats.removed_out_of_scope += 1;
                }
                false
            })
            .collect();

        stats.output = kept.len();
        tracing::debug!(
            removed_forbidden = stats.removed_forbidden,
            removed_out_of_scope = stats.removed_out_of_scope,
            "amendment scope enforced"
        );
        (kept, stats)
    }
}
