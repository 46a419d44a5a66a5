use std::fmt;

use serde::{Deserialize, Serialize};

/// Access level of a session. Derived from the email, never stored as a
/// permission in its own right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Emails containing `user` map to [`Role::User`], everything else to
    /// [`Role::Admin`].
    pub fn from_email(email: &str) -> Self {
        if email.contains("user") {
            Role::User
        } else {
            Role::Admin
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Session document stored under its token key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub token: String,
    pub name: String,
    pub role: Role,
}

impl Session {
    pub fn new(email: &str, token: String) -> Self {
        Self {
            email: email.to_string(),
            token,
            name: local_part(email).to_string(),
            role: Role::from_email(email),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_email() {
        assert_eq!(Role::from_email("alice@user.com"), Role::User);
        assert_eq!(Role::from_email("bob@admin.com"), Role::Admin);
        assert_eq!(Role::from_email("superuser@example.com"), Role::User);
    }

    #[test]
    fn test_session_name_is_local_part() {
        let session = Session::new("alice@user.com", "42".to_string());
        assert_eq!(session.name, "alice");
        assert!(session.is_user());

        let session = Session::new("no-at-sign", "43".to_string());
        assert_eq!(session.name, "no-at-sign");
        assert_eq!(session.role, Role::Admin);
    }

    #[test]
    fn test_session_wire_format() {
        let session = Session::new("bob@admin.com", "7".to_string());
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "email": "bob@admin.com",
                "token": "7",
                "name": "bob",
                "role": "admin"
            })
        );
    }
}
