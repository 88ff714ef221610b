//! User Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Staff / customer role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserType {
    Admin,
    Kitchen,
    #[default]
    Customer,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Admin => "ADMIN",
            UserType::Kitchen => "KITCHEN",
            UserType::Customer => "CUSTOMER",
        }
    }

    /// Admins satisfy every role requirement
    pub fn satisfies(&self, required: UserType) -> bool {
        *self == UserType::Admin || *self == required
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(UserType::Admin),
            "KITCHEN" => Ok(UserType::Kitchen),
            "CUSTOMER" => Ok(UserType::Customer),
            other => Err(format!("unknown user type: {other}")),
        }
    }
}

/// User entity (the password hash is never serialized)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    pub first_name: Option<String>,
    pub user_type: UserType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a user (password already hashed)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub first_name: Option<String>,
    pub user_type: UserType,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub auth_token: String,
    pub user_id: i64,
    pub first_name: Option<String>,
    pub email: String,
    pub user_type: UserType,
}

/// Admin registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub user_type: Option<UserType>,
    pub first_name: Option<String>,
}
