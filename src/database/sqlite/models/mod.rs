#[cfg(test)]
mod tests;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Request counter row for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserUsage {
    pub user_id: String,
    pub request_count: i64,
    pub last_request_at: NaiveDateTime,
}
