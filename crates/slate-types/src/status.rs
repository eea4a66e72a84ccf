use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a placement (one media item on one platform).
///
/// `Scheduled` is the sole initial state. `Posted`, `Cancelled` and
/// `Rejected` are terminal. `Failed` can be retried back to `Submitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Scheduled,
    Submitted,
    Pending,
    Posted,
    Cancelled,
    Rejected,
    Failed,
}

impl PostStatus {
    pub const ALL: [PostStatus; 7] = [
        PostStatus::Scheduled,
        PostStatus::Submitted,
        PostStatus::Pending,
        PostStatus::Posted,
        PostStatus::Cancelled,
        PostStatus::Rejected,
        PostStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Scheduled => "scheduled",
            PostStatus::Submitted => "submitted",
            PostStatus::Pending => "pending",
            PostStatus::Posted => "posted",
            PostStatus::Cancelled => "cancelled",
            PostStatus::Rejected => "rejected",
            PostStatus::Failed => "failed",
        }
    }

    /// Terminal states accept no further events.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PostStatus::Posted | PostStatus::Cancelled | PostStatus::Rejected
        )
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(PostStatus::Scheduled),
            "submitted" => Ok(PostStatus::Submitted),
            "pending" => Ok(PostStatus::Pending),
            "posted" => Ok(PostStatus::Posted),
            "cancelled" => Ok(PostStatus::Cancelled),
            "rejected" => Ok(PostStatus::Rejected),
            "failed" => Ok(PostStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown post status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

/// An external trigger that may move a placement to its next status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleEvent {
    /// Scheduled time reached and a submission attempt was issued.
    Submit,
    /// User cancelled before submission.
    Cancel,
    /// Platform acknowledged receipt, awaiting moderation.
    Acknowledge,
    /// Platform confirmed publication.
    Confirm,
    /// Platform refused the content.
    Reject,
    /// Transport or platform-side error.
    Fail,
    /// Retry a failed submission.
    Retry,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 7] = [
        LifecycleEvent::Submit,
        LifecycleEvent::Cancel,
        LifecycleEvent::Acknowledge,
        LifecycleEvent::Confirm,
        LifecycleEvent::Reject,
        LifecycleEvent::Fail,
        LifecycleEvent::Retry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Submit => "submit",
            LifecycleEvent::Cancel => "cancel",
            LifecycleEvent::Acknowledge => "acknowledge",
            LifecycleEvent::Confirm => "confirm",
            LifecycleEvent::Reject => "reject",
            LifecycleEvent::Fail => "fail",
            LifecycleEvent::Retry => "retry",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_roundtrip() {
        for status in PostStatus::ALL {
            let parsed: PostStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn unknown_status_rejected() {
        assert!("published".parse::<PostStatus>().is_err());
        assert!("".parse::<PostStatus>().is_err());
        assert!("SCHEDULED".parse::<PostStatus>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(PostStatus::Posted.is_terminal());
        assert!(PostStatus::Cancelled.is_terminal());
        assert!(PostStatus::Rejected.is_terminal());
        assert!(!PostStatus::Scheduled.is_terminal());
        assert!(!PostStatus::Submitted.is_terminal());
        assert!(!PostStatus::Pending.is_terminal());
        assert!(!PostStatus::Failed.is_terminal());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&PostStatus::Scheduled).unwrap();
        assert_eq!(json, "\"scheduled\"");
        let event: LifecycleEvent = serde_json::from_str("\"acknowledge\"").unwrap();
        assert_eq!(event, LifecycleEvent::Acknowledge);
    }
}
