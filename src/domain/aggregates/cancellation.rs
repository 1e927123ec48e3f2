//! Cancellation requests
//!
//! A request records that the owner wants an order reversed. It carries its
//! own decision and never moves the order's status by itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use super::{OrderDetails, UserSummary};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationRequest {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub reason: String,
    pub decision: Decision,
    pub reply_content: Option<String>,
    pub reply_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Admin decision, `0`/`1`/`2` on the wire and in storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum Decision {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl From<Decision> for i16 {
    fn from(d: Decision) -> i16 {
        match d { Decision::Pending => 0, Decision::Accepted => 1, Decision::Rejected => 2 }
    }
}

impl TryFrom<i16> for Decision {
    type Error = UnknownDecision;
    fn try_from(v: i16) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Accepted),
            2 => Ok(Self::Rejected),
            other => Err(UnknownDecision(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)] pub struct UnknownDecision(pub i16);
impl std::error::Error for UnknownDecision {}
impl fmt::Display for UnknownDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown decision value: {}", self.0) }
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCancellation {
    #[validate(required(message = "orderId is required"))]
    pub order_id: Option<Uuid>,
    #[validate(required(message = "reason is required"), length(min = 1, message = "reason is required"))]
    pub reason: Option<String>,
}

/// Fields a caller submitted; which of them count depends on the caller's role.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationUpdate {
    pub reason: Option<String>,
    pub decision: Option<Decision>,
    pub reply_content: Option<String>,
}

impl CancellationUpdate {
    /// Applies the fields `is_admin` is allowed to change. Returns `false`
    /// when nothing recognized was supplied, leaving `req` untouched.
    pub fn apply(self, req: &mut CancellationRequest, is_admin: bool, now: DateTime<Utc>) -> bool {
        if !is_admin {
            return match self.reason.filter(|r| !r.is_empty()) {
                Some(reason) => { req.reason = reason; true }
                None => false,
            };
        }
        let mut changed = false;
        if let Some(reason) = self.reason { req.reason = reason; changed = true; }
        if let Some(decision) = self.decision { req.decision = decision; changed = true; }
        if let Some(reply) = self.reply_content.filter(|r| !r.is_empty()) {
            req.reply_content = Some(reply);
            req.reply_at = Some(now);
            changed = true;
        }
        changed
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CancellationFilter {
    pub user_id: Option<Uuid>,
}

impl CancellationFilter {
    pub fn matches(&self, req: &CancellationRequest) -> bool {
        self.user_id.map_or(true, |u| req.user_id == u)
    }
}

/// A request with its requester and the order it targets, expanded the same
/// way order responses are.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationDetails {
    #[serde(flatten)]
    pub request: CancellationRequest,
    pub user: Option<UserSummary>,
    pub order: Option<OrderDetails>,
}
