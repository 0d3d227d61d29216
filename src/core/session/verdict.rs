/*!
Validation outcomes.
*/

use crate::core::error::RejectReason;

/// Details of an accepted signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acceptance {
    pub epoch: u64,
    pub sequence: u64,
    /// Anomaly score after this validation
    pub anomaly_score: f64,
}

/// Result of `validate`. Never an error; every failure is a typed rejection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Accept(Acceptance),
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept(_))
    }

    pub fn acceptance(&self) -> Option<&Acceptance> {
        match self {
            Verdict::Accept(acceptance) => Some(acceptance),
            Verdict::Reject(_) => None,
        }
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Verdict::Accept(_) => None,
            Verdict::Reject(reason) => Some(*reason),
        }
    }
}

impl From<RejectReason> for Verdict {
    fn from(reason: RejectReason) -> Self {
        Verdict::Reject(reason)
    }
}
