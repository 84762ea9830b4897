use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account identity plus the cumulative seat counter.
///
/// `adopted_students` only ever grows, by exactly the number of seats confirmed
/// in each successful selection. Credential hashing happens outside the core;
/// `password_hash` is carried as an opaque string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub designation: String,
    pub email: String,
    pub phone_number: String,
    pub company_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub adopted_students: i32,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub full_name: String,
    pub designation: String,
    pub email: String,
    pub phone_number: String,
    pub company_name: String,
    pub password_hash: String,
}
