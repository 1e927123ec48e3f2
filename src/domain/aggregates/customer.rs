//! Users and their shipping addresses

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Role;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub nickname: Option<String>,
    pub full_name: Option<String>,
    pub role: Role,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary { id: self.id, username: self.username.clone(), nickname: self.nickname.clone(), full_name: self.full_name.clone() }
    }
}

/// Public projection embedded in order responses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub nickname: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipient: String,
    pub phone: String,
    pub line: String,
}
