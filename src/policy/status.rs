//! Lifecycle status values and the transitions allowed between them
//!
//! Each status is stored as lowercase TEXT and serialized the same way.
//! Parsing is exact: `"Accepted"` is not a status.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, Value, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::MemberError;

fn invalid_status(value: &str, allowed: &[&str]) -> MemberError {
    MemberError::InvalidArgument(format!(
        "Invalid status value '{}'. Allowed: {}",
        value,
        allowed.join(", ")
    ))
}

// ============================================================================
// Connection
// ============================================================================

/// Connection request lifecycle: pending -> accepted | rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ConnectionStatus {
    /// Values a recipient may answer with
    pub const ANSWERS: [&'static str; 2] = ["accepted", "rejected"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Validate a recipient's answer against the current status.
    ///
    /// The target must be `accepted` or `rejected`, and only a pending
    /// request can be answered.
    pub fn answer(self, target: &str) -> Result<Self, MemberError> {
        let next = match target.parse::<Self>() {
            Ok(status) if status != Self::Pending => status,
            _ => return Err(invalid_status(target, &Self::ANSWERS)),
        };

        if self.is_terminal() {
            return Err(MemberError::InvalidArgument(format!(
                "Connection request was already {self}"
            )));
        }

        Ok(next)
    }
}

impl FromStr for ConnectionStatus {
    type Err = MemberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(invalid_status(s, &["pending", "accepted", "rejected"])),
        }
    }
}

// ============================================================================
// Referral
// ============================================================================

/// Referral lifecycle; any value may follow any other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    #[default]
    Open,
    Closed,
    Lost,
}

impl ReferralStatus {
    pub const ALL: [&'static str; 3] = ["open", "closed", "lost"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Lost => "lost",
        }
    }

    /// Referral status is unrestricted by the current value
    pub fn transition(self, target: &str) -> Result<Self, MemberError> {
        target.parse()
    }
}

impl FromStr for ReferralStatus {
    type Err = MemberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "lost" => Ok(Self::Lost),
            _ => Err(invalid_status(s, &Self::ALL)),
        }
    }
}

// ============================================================================
// Meeting
// ============================================================================

/// Meeting lifecycle. No dedicated transition; the generic meeting update
/// may set any of these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    #[default]
    Scheduled,
    Completed,
    Canceled,
}

impl MeetingStatus {
    pub const ALL: [&'static str; 3] = ["scheduled", "completed", "canceled"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }
}

impl FromStr for MeetingStatus {
    type Err = MemberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            _ => Err(invalid_status(s, &Self::ALL)),
        }
    }
}

// ============================================================================
// SQLite / Display glue
// ============================================================================

macro_rules! status_glue {
    ($($ty:ty),+) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$ty> for Value {
            fn from(status: $ty) -> Self {
                Value::Text(status.as_str().to_string())
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: MemberError| FromSqlError::Other(Box::new(e)))
            }
        }
    )+};
}

status_glue!(ConnectionStatus, ReferralStatus, MeetingStatus);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_answers() {
        let pending = ConnectionStatus::Pending;
        assert_eq!(pending.answer("accepted").unwrap(), ConnectionStatus::Accepted);
        assert_eq!(pending.answer("rejected").unwrap(), ConnectionStatus::Rejected);
    }

    #[test]
    fn test_connection_rejects_other_targets() {
        let pending = ConnectionStatus::Pending;
        for target in ["pending", "open", "ACCEPTED", "", "blocked"] {
            assert!(
                matches!(pending.answer(target), Err(MemberError::InvalidArgument(_))),
                "{target} should be refused"
            );
        }
    }

    #[test]
    fn test_connection_terminal_states() {
        assert!(ConnectionStatus::Accepted.is_terminal());
        assert!(ConnectionStatus::Rejected.is_terminal());
        assert!(!ConnectionStatus::Pending.is_terminal());

        let err = ConnectionStatus::Accepted.answer("rejected").unwrap_err();
        assert!(err.message().contains("already accepted"));
    }

    #[test]
    fn test_referral_any_to_any() {
        for from in [ReferralStatus::Open, ReferralStatus::Closed, ReferralStatus::Lost] {
            for to in ReferralStatus::ALL {
                assert_eq!(from.transition(to).unwrap().as_str(), to);
            }
        }
        assert!(ReferralStatus::Open.transition("won").is_err());
    }

    #[test]
    fn test_meeting_parse() {
        assert_eq!("canceled".parse::<MeetingStatus>().unwrap(), MeetingStatus::Canceled);
        assert!("cancelled".parse::<MeetingStatus>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&ConnectionStatus::Accepted).unwrap(),
            "\"accepted\""
        );
        assert_eq!(
            serde_json::from_str::<ReferralStatus>("\"lost\"").unwrap(),
            ReferralStatus::Lost
        );
    }

    #[test]
    fn test_sqlite_round_trip_rejects_unknown_text() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let ok: MeetingStatus = conn
            .query_row("SELECT 'completed'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(ok, MeetingStatus::Completed);

        let bad: rusqlite::Result<MeetingStatus> =
            conn.query_row("SELECT 'bogus'", [], |row| row.get(0));
        assert!(bad.is_err());
    }
}
