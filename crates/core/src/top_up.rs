//! Top-up request status machine.
//!
//! A request is created `pending` and moves to `completed` exactly once.
//! `completed` is terminal. The status strings are stored verbatim in the
//! `top_up_requests.status` column and must match its CHECK constraint.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_COMPLETED: &str = "completed";

/// All valid status strings.
pub const VALID_STATUSES: &[&str] = &[STATUS_PENDING, STATUS_COMPLETED];

/// Default age after which a pending request is reported as stale.
pub const DEFAULT_STALE_AFTER_MINS: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopUpStatus {
    Pending,
    Completed,
}

impl TopUpStatus {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            STATUS_PENDING => Ok(Self::Pending),
            STATUS_COMPLETED => Ok(Self::Completed),
            _ => Err(format!(
                "Invalid top-up status '{s}'. Must be one of: {}",
                VALID_STATUSES.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => STATUS_PENDING,
            Self::Completed => STATUS_COMPLETED,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// The only legal move is `pending -> completed`.
    pub fn can_transition_to(&self, next: TopUpStatus) -> bool {
        matches!((self, next), (Self::Pending, Self::Completed))
    }
}

/// The creation cutoff for requests older than `mins` minutes at `now`.
///
/// Rejects negative ages and ages that fall outside the representable
/// timestamp range.
pub fn created_cutoff(now: Timestamp, mins: i64) -> Result<Timestamp, CoreError> {
    if mins < 0 {
        return Err(CoreError::Validation(
            "Age in minutes must not be negative".into(),
        ));
    }
    Duration::try_minutes(mins)
        .and_then(|age| now.checked_sub_signed(age))
        .ok_or_else(|| CoreError::Validation(format!("Age of {mins} minutes is out of range")))
}
