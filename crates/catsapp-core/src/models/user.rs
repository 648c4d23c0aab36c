use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user account as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// `_id` on login/register, `userId` on the profile endpoint.
    #[serde(rename = "_id", alias = "userId")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "isActive", default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Profile of the signed-in user, as held by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

/// Successful response of the login and register endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_auth_response() {
        let json = r#"{"access_token":"t1","user":{"_id":"u1","name":"Ann","email":"a@x.com","isActive":true,"createdAt":"2024-05-01T10:00:00.000Z","updatedAt":"2024-05-02T10:00:00.000Z"}}"#;

        let resp: AuthResponse = serde_json::from_str(json).expect("Failed to parse auth response JSON");
        assert_eq!(resp.access_token, "t1");
        assert_eq!(resp.user.is_active, Some(true));
        assert!(resp.user.created_at.is_some());
        assert_eq!(
            resp.user.profile(),
            UserProfile {
                user_id: "u1".to_string(),
                name: "Ann".to_string(),
                email: "a@x.com".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_minimal_user() {
        let user: User = serde_json::from_str(r#"{"_id":"u2","name":"Bo","email":"b@x.com"}"#)
            .expect("Failed to parse user JSON");
        assert_eq!(user.id, "u2");
        assert!(user.is_active.is_none());

        // Absent optional fields are not written back out
        let json = serde_json::to_string(&user).expect("Failed to serialize user");
        assert_eq!(json, r#"{"_id":"u2","name":"Bo","email":"b@x.com"}"#);
    }

    #[test]
    fn test_parse_profile_shaped_user() {
        let user: User = serde_json::from_str(r#"{"userId":"u3","name":"Cy","email":"c@x.com"}"#)
            .expect("Failed to parse profile JSON");
        assert_eq!(user.id, "u3");
        assert_eq!(user.profile().user_id, "u3");

        // Stored back under the login/register key
        let json = serde_json::to_string(&user).expect("Failed to serialize user");
        assert!(json.starts_with(r#"{"_id":"u3""#));
    }
}
