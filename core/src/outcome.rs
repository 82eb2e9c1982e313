//! Credit-line-increase evaluation outcomes as recorded in the warehouse.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Approved,
    /// PIE: approval blocked only by a stale-income requirement.
    PreEvalApproved,
    PreEvalDeclined,
    Declined,
    Other(String),
}

impl Outcome {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "APPROVED" => Self::Approved,
            "PRE_EVAL_APPROVED" => Self::PreEvalApproved,
            "PRE_EVAL_DECLINED" => Self::PreEvalDeclined,
            "DECLINED" => Self::Declined,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Approved => "APPROVED",
            Self::PreEvalApproved => "PRE_EVAL_APPROVED",
            Self::PreEvalDeclined => "PRE_EVAL_DECLINED",
            Self::Declined => "DECLINED",
            Self::Other(s) => s,
        }
    }

    pub fn is_pie(&self) -> bool {
        matches!(self, Self::PreEvalApproved)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
