//! # Risk Assessment Comparator
//!
//! Structural equality between two risk assessments, used only to suppress
//! no-op version creation.
//!
//! Both sides are flattened into name-keyed leaf maps and compared key by
//! key, so the result never depends on field order. A leaf present on one
//! side and missing on the other is a mismatch.

use crate::RiskAssessment;
use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Stateless comparator.
pub struct RiskAssessmentComparator;

impl RiskAssessmentComparator {
    /// True iff every leaf across the overall score and all four categories
    /// matches exactly.
    #[must_use]
    pub fn equal(a: &RiskAssessment, b: &RiskAssessment) -> bool {
        Self::leaves_equal(&a.flatten(), &b.flatten())
    }

    /// Compare two flattened leaf maps by field name.
    ///
    /// Fails closed: the key sets must be identical, then every value must
    /// match. Two empty maps are not considered equal.
    #[must_use]
    pub fn leaves_equal<K>(a: &BTreeMap<K, i32>, b: &BTreeMap<K, i32>) -> bool
    where
        K: Ord + Borrow<str>,
    {
        if a.is_empty() || a.len() != b.len() {
            return false;
        }
        a.iter().all(|(name, value)| {
            let key: &str = name.borrow();
            b.get(key).is_some_and(|other| other == value)
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
