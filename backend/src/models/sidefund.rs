//! Side-fund records
//!
//! A side-fund is a signing bonus or a termination/resignation benefit
//! grant awaiting disbursement through payroll. Records are reviewed
//! (approved/rejected) before payroll can touch them, and the claim that
//! moves money onto a payslip flips the record to PAID in the same step —
//! so a given record is ever paid into at most one run.
//!
//! # State machine
//!
//! ```text
//! PENDING → APPROVED → PAID      (terminal)
//!    ↓
//! REJECTED                        (terminal)
//! ```
//!
//! CRITICAL: All money values are i64 (cents)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What kind of grant this record is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SideFundKind {
    SigningBonus,
    TerminationBenefit,
}

impl SideFundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SideFundKind::SigningBonus => "signing bonus",
            SideFundKind::TerminationBenefit => "termination benefit",
        }
    }
}

/// Review/disbursement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideFundStatus {
    Pending,
    Approved,
    Paid,
    Rejected,
}

/// Errors raised by side-fund review and claiming.
#[derive(Debug, Error, PartialEq)]
pub enum SideFundError {
    #[error("side-fund record is {status:?}, expected PENDING")]
    NotPending { status: SideFundStatus },

    #[error("side-fund record is {status:?}, expected APPROVED")]
    NotApproved { status: SideFundStatus },

    #[error("approver {approver_id} cannot review their own grant")]
    SelfApproval { approver_id: String },

    #[error("rejection requires a reason")]
    MissingReason,

    #[error("side-fund record already paid in run {run_id}")]
    AlreadyPaid { run_id: String },
}

/// One signing-bonus or termination-benefit grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideFund {
    /// Record id (UUID)
    id: String,

    kind: SideFundKind,
    employee_id: String,

    /// Grant amount (i64 cents)
    amount: i64,

    status: SideFundStatus,

    approver_id: Option<String>,
    decided_at: Option<DateTime<Utc>>,

    /// Run that disbursed this grant; set exactly once, on claim
    paid_in_run: Option<String>,

    rejection_reason: Option<String>,
}

impl SideFund {
    /// Create a PENDING grant.
    pub fn new(kind: SideFundKind, employee_id: String, amount: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            employee_id,
            amount,
            status: SideFundStatus::Pending,
            approver_id: None,
            decided_at: None,
            paid_in_run: None,
            rejection_reason: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> SideFundKind {
        self.kind
    }

    pub fn employee_id(&self) -> &str {
        &self.employee_id
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn status(&self) -> SideFundStatus {
        self.status
    }

    pub fn approver_id(&self) -> Option<&str> {
        self.approver_id.as_deref()
    }

    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }

    pub fn paid_in_run(&self) -> Option<&str> {
        self.paid_in_run.as_deref()
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// PENDING → APPROVED. The approver may not be the grantee.
    pub fn approve(&mut self, approver_id: &str, at: DateTime<Utc>) -> Result<(), SideFundError> {
        if approver_id == self.employee_id {
            return Err(SideFundError::SelfApproval {
                approver_id: approver_id.to_string(),
            });
        }
        if self.status != SideFundStatus::Pending {
            return Err(SideFundError::NotPending { status: self.status });
        }
        self.status = SideFundStatus::Approved;
        self.approver_id = Some(approver_id.to_string());
        self.decided_at = Some(at);
        Ok(())
    }

    /// PENDING → REJECTED. Reason mandatory.
    pub fn reject(
        &mut self,
        approver_id: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<(), SideFundError> {
        if reason.trim().is_empty() {
            return Err(SideFundError::MissingReason);
        }
        if approver_id == self.employee_id {
            return Err(SideFundError::SelfApproval {
                approver_id: approver_id.to_string(),
            });
        }
        if self.status != SideFundStatus::Pending {
            return Err(SideFundError::NotPending { status: self.status });
        }
        self.status = SideFundStatus::Rejected;
        self.approver_id = Some(approver_id.to_string());
        self.decided_at = Some(at);
        self.rejection_reason = Some(reason.to_string());
        Ok(())
    }

    /// APPROVED → PAID, recording the disbursing run.
    ///
    /// Returns the grant amount so the caller records it on the payslip in
    /// the same step that flips the status. A second claim fails with
    /// `AlreadyPaid` naming the run that got the money.
    pub(crate) fn claim_for_payment(&mut self, run_id: &str) -> Result<i64, SideFundError> {
        match self.status {
            SideFundStatus::Approved => {
                self.status = SideFundStatus::Paid;
                self.paid_in_run = Some(run_id.to_string());
                Ok(self.amount)
            }
            SideFundStatus::Paid => Err(SideFundError::AlreadyPaid {
                run_id: self
                    .paid_in_run
                    .clone()
                    .unwrap_or_else(|| "<unknown>".to_string()),
            }),
            _ => Err(SideFundError::NotApproved { status: self.status }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fund() -> SideFund {
        SideFund::new(SideFundKind::SigningBonus, "E-1".to_string(), 250_000)
    }

    #[test]
    fn test_claim_requires_approval() {
        let mut f = fund();
        let err = f.claim_for_payment("PR-1").unwrap_err();
        assert_eq!(
            err,
            SideFundError::NotApproved {
                status: SideFundStatus::Pending
            }
        );
    }

    #[test]
    fn test_claim_pays_at_most_once() {
        let mut f = fund();
        f.approve("MGR-1", Utc::now()).unwrap();
        assert_eq!(f.claim_for_payment("PR-1").unwrap(), 250_000);
        assert_eq!(f.status(), SideFundStatus::Paid);
        assert_eq!(f.paid_in_run(), Some("PR-1"));

        let err = f.claim_for_payment("PR-2").unwrap_err();
        assert_eq!(
            err,
            SideFundError::AlreadyPaid {
                run_id: "PR-1".to_string()
            }
        );
    }

    #[test]
    fn test_grantee_cannot_review_own_grant() {
        let mut f = fund();
        assert!(matches!(
            f.approve("E-1", Utc::now()),
            Err(SideFundError::SelfApproval { .. })
        ));
        assert!(matches!(
            f.reject("E-1", "duplicate grant", Utc::now()),
            Err(SideFundError::SelfApproval { .. })
        ));
    }

    #[test]
    fn test_reject_requires_reason_and_is_terminal() {
        let mut f = fund();
        assert_eq!(
            f.reject("MGR-1", "  ", Utc::now()).unwrap_err(),
            SideFundError::MissingReason
        );
        f.reject("MGR-1", "offer rescinded", Utc::now()).unwrap();
        assert_eq!(f.status(), SideFundStatus::Rejected);
        assert!(f.approve("MGR-2", Utc::now()).is_err());
    }
}
