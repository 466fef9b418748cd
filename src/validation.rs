//! Input validation for session planning problems.
//!
//! Checks structural integrity of teachers, children, tandems, and
//! weights before any search starts. Detects:
//! - Duplicate IDs
//! - Tandems referencing unknown, identical, or already-paired children
//! - Unknown tandem teacher preferences
//! - Negative or non-finite weights
//! - Availability ticks off the raster or outside the operating window
//!
//! Empty availability is deliberately NOT an error: such an entity is
//! simply never assigned and shows up in the violation report instead.

use std::collections::{HashMap, HashSet};

use crate::models::{Child, Tandem, Teacher, WeightConfig};
use crate::slots::SlotGrid;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A tandem references an entity that doesn't exist.
    UnknownReference,
    /// A tandem pairs a child with itself, or a child twice.
    TandemConflict,
    /// A weight is negative, NaN, or infinite.
    InvalidWeight,
    /// An availability tick is off the raster or outside the window.
    SlotOutsideWindow,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates the input data for one solve invocation.
///
/// Checks:
/// 1. No duplicate teacher, child, or tandem IDs
/// 2. Every weight is finite and non-negative
/// 3. Every availability tick lies on the grid
/// 4. Tandem members exist, differ, and belong to at most one tandem
/// 5. A tandem's preferred teacher, when set, exists
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    teachers: &[Teacher],
    children: &[Child],
    tandems: &[Tandem],
    weights: &WeightConfig,
    grid: &SlotGrid,
) -> ValidationResult {
    let mut errors = Vec::new();

    // Collect teacher IDs
    let mut teacher_ids = HashSet::new();
    for t in teachers {
        if !teacher_ids.insert(t.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate teacher ID: {}", t.id),
            ));
        }
    }

    // Collect child IDs
    let mut child_ids = HashSet::new();
    for c in children {
        if !child_ids.insert(c.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate child ID: {}", c.id),
            ));
        }
    }

    // Weights must be finite and non-negative
    for (name, value) in weights.named_fields() {
        if !value.is_finite() || value < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidWeight,
                format!("Weight '{name}' must be a non-negative finite number, got {value}"),
            ));
        }
    }

    // Availability ticks must lie on the grid
    for t in teachers {
        for slot in t.availability.iter() {
            if !grid.contains(slot) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::SlotOutsideWindow,
                    format!("Teacher '{}' availability tick {slot} is outside the grid", t.id),
                ));
            }
        }
    }
    for c in children {
        for slot in c.availability.iter() {
            if !grid.contains(slot) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::SlotOutsideWindow,
                    format!("Child '{}' availability tick {slot} is outside the grid", c.id),
                ));
            }
        }
    }

    // Tandem wiring
    let mut tandem_ids = HashSet::new();
    let mut paired: HashMap<&str, &str> = HashMap::new();
    for tandem in tandems {
        if !tandem_ids.insert(tandem.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate tandem ID: {}", tandem.id),
            ));
        }

        if tandem.child_a == tandem.child_b {
            errors.push(ValidationError::new(
                ValidationErrorKind::TandemConflict,
                format!("Tandem '{}' pairs child '{}' with itself", tandem.id, tandem.child_a),
            ));
        }

        for member in tandem.members() {
            if !child_ids.contains(member) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownReference,
                    format!("Tandem '{}' references unknown child '{member}'", tandem.id),
                ));
            }
            if let Some(other) = paired.insert(member, tandem.id.as_str()) {
                if other != tandem.id {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::TandemConflict,
                        format!(
                            "Child '{member}' belongs to both tandem '{other}' and tandem '{}'",
                            tandem.id
                        ),
                    ));
                }
            }
        }

        if let Some(pref) = &tandem.preferred_teacher {
            if !teacher_ids.contains(pref.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownReference,
                    format!("Tandem '{}' prefers unknown teacher '{pref}'", tandem.id),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
