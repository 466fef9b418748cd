//! Tandem model.
//!
//! A declared pair of children eligible to share one teacher session.
//! The pair is unordered and a child belongs to at most one tandem; both
//! rules are enforced by input validation.

use serde::{Deserialize, Serialize};

/// A declared pair of children that may share a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tandem {
    /// Unique tandem identifier.
    pub id: String,
    /// First member child ID.
    pub child_a: String,
    /// Second member child ID.
    pub child_b: String,
    /// Optional preferred teacher for the joint session. Used as a
    /// search-ordering hint only; earns no objective credit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_teacher: Option<String>,
}

impl Tandem {
    /// Creates a new tandem for two children.
    pub fn new(
        id: impl Into<String>,
        child_a: impl Into<String>,
        child_b: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            child_a: child_a.into(),
            child_b: child_b.into(),
            preferred_teacher: None,
        }
    }

    /// Sets the preferred teacher for the joint session.
    pub fn with_preferred_teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.preferred_teacher = Some(teacher_id.into());
        self
    }

    /// Both member IDs.
    pub fn members(&self) -> [&str; 2] {
        [&self.child_a, &self.child_b]
    }

    /// Whether a child belongs to this tandem.
    pub fn contains(&self, child_id: &str) -> bool {
        self.child_a == child_id || self.child_b == child_id
    }

    /// The other member, if `child_id` belongs to this tandem.
    pub fn partner_of(&self, child_id: &str) -> Option<&str> {
        if self.child_a == child_id {
            Some(&self.child_b)
        } else if self.child_b == child_id {
            Some(&self.child_a)
        } else {
            None
        }
    }
}
