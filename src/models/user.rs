use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub department: String,
    pub team_id: Option<i64>,
    pub is_admin: bool,
    pub role: Role,
    pub join_date: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role")]
pub enum Role {
    Employee,
    Administrator,
}

impl Default for Role {
    fn default() -> Self {
        Self::Employee
    }
}

impl Role {
    pub fn for_admin_flag(is_admin: bool) -> Self {
        if is_admin {
            Self::Administrator
        } else {
            Self::Employee
        }
    }
}

/// A user about to be inserted; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub department: String,
    pub team_id: Option<i64>,
    pub is_admin: bool,
    pub role: Role,
    pub join_date: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl NewUser {
    pub fn into_user(self, id: i64) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            username: self.username,
            password_hash: self.password_hash,
            department: self.department,
            team_id: self.team_id,
            is_admin: self.is_admin,
            role: self.role,
            join_date: self.join_date,
            last_login_at: self.last_login_at,
        }
    }
}

/// POST /api/users (admin). Every field is optional; blanks get defaults.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(max = 100, message = "Name must be under 100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 50, message = "Username must be under 50 characters"))]
    pub username: Option<String>,
    pub password: Option<String>,
    pub department: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

/// PUT /api/users/:id (partial update)
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub password: Option<String>,
    pub department: Option<String>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: String,
    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,
    pub department: Option<String>,
}

/// Trimmed value, or `None` when missing or blank.
fn filled(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl CreateUserRequest {
    /// Blank text fields become `None` so they pick up defaults.
    pub fn trimmed(self) -> Self {
        Self {
            name: filled(self.name),
            email: filled(self.email),
            username: filled(self.username),
            password: self.password.filter(|p| !p.trim().is_empty()),
            department: filled(self.department),
            is_admin: self.is_admin,
        }
    }
}

impl UpdateUserRequest {
    /// Text fields are trimmed so whitespace-only names fail validation.
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.map(|n| n.trim().to_string()),
            email: self.email.map(|e| e.trim().to_string()),
            password: self.password.filter(|p| !p.is_empty()),
            department: filled(self.department),
            is_admin: self.is_admin,
        }
    }
}

impl RegisterRequest {
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password,
            department: filled(self.department),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserList {
    pub users: Vec<User>,
    pub data_source: crate::db::DataSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_is_never_serialized() {
        let now = Utc::now();
        let user = NewUser {
            name: "Emily Johnson".into(),
            email: "emily.johnson@example.com".into(),
            username: "emily".into(),
            password_hash: "secret-hash".into(),
            department: "HR".into(),
            team_id: None,
            is_admin: false,
            role: Role::Employee,
            join_date: now,
            last_login_at: now,
        }
        .into_user(3);

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["username"], "emily");
        assert_eq!(json["isAdmin"], false);
    }

    #[test]
    fn test_register_request_rejects_short_password() {
        let req = RegisterRequest {
            name: "Sam".into(),
            email: "sam@example.com".into(),
            username: "sam".into(),
            password: "abc".into(),
            department: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_blank_username_fails_after_trimming() {
        let req = RegisterRequest {
            name: "Sam".into(),
            email: " sam@example.com ".into(),
            username: "   ".into(),
            password: "secret1".into(),
            department: Some("  ".into()),
        }
        .trimmed();

        assert_eq!(req.email, "sam@example.com");
        assert_eq!(req.department, None);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_rejects_whitespace_name() {
        let req = UpdateUserRequest {
            name: Some("   ".into()),
            ..Default::default()
        }
        .trimmed();
        assert!(req.validate().is_err());
    }
}
