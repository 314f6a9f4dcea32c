//! Application status vocabulary and the legality of every workflow transition.
//!
//! Nothing outside this module decides whether a status change is allowed; the
//! service asks [`transition`] before mutating anything.

use serde::{Deserialize, Serialize};

/// Workflow status of a loan application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    Pending,
    UnderReview,
    PendingInfo,
    Approved,
    Rejected,
    Cancelled,
    Disbursed,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::PendingInfo => "pending_info",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Cancelled => "cancelled",
            ApplicationStatus::Disbursed => "disbursed",
        }
    }

    /// Rejected, cancelled, and disbursed applications accept no further events.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Rejected
                | ApplicationStatus::Cancelled
                | ApplicationStatus::Disbursed
        )
    }

    /// Field mutation is only permitted while drafting or answering an
    /// information request.
    pub const fn permits_edit(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Draft | ApplicationStatus::PendingInfo
        )
    }
}

/// Events an operator (or the system) can raise against an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowEvent {
    Submit,
    StartReview,
    RequestInfo,
    Approve,
    Reject,
    Cancel,
    Disburse,
    Edit,
}

impl WorkflowEvent {
    pub const fn label(self) -> &'static str {
        match self {
            WorkflowEvent::Submit => "submit",
            WorkflowEvent::StartReview => "start_review",
            WorkflowEvent::RequestInfo => "request_info",
            WorkflowEvent::Approve => "approve",
            WorkflowEvent::Reject => "reject",
            WorkflowEvent::Cancel => "cancel",
            WorkflowEvent::Disburse => "disburse",
            WorkflowEvent::Edit => "edit",
        }
    }
}

/// Raised for any (status, event) pair outside the transition table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {} an application in {} status", .event.label(), .from.label())]
pub struct IllegalTransition {
    pub from: ApplicationStatus,
    pub event: WorkflowEvent,
}

/// Resolve the status an event leads to, or refuse the event.
///
/// `Pending` is accepted as a source for review-side events so that records
/// originated by upstream intake channels flow through the same table, even
/// though this core never produces it.
pub fn transition(
    from: ApplicationStatus,
    event: WorkflowEvent,
) -> Result<ApplicationStatus, IllegalTransition> {
    use ApplicationStatus::*;
    use WorkflowEvent::*;

    let to = match (from, event) {
        (Draft, Submit) | (PendingInfo, Submit) => Submitted,
        (Submitted, StartReview) | (Pending, StartReview) => UnderReview,
        (Submitted, RequestInfo)
        | (Pending, RequestInfo)
        | (UnderReview, RequestInfo)
        | (PendingInfo, RequestInfo) => PendingInfo,
        (Submitted, Approve) | (Pending, Approve) | (UnderReview, Approve)
        | (PendingInfo, Approve) => Approved,
        (Submitted, Reject) | (Pending, Reject) | (UnderReview, Reject)
        | (PendingInfo, Reject) => Rejected,
        (current, Cancel) if !current.is_terminal() => Cancelled,
        (Approved, Disburse) => Disbursed,
        (current, Edit) if current.permits_edit() => current,
        (from, event) => return Err(IllegalTransition { from, event }),
    };

    Ok(to)
}
