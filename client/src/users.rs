//! User management for admins.
//!
//! Every operation reports through [`ActionResult`]; validation, transport
//! and backend failures all end up in its message.

use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use crate::decode as wire;
use crate::http::{segment, ApiClient};
use crate::models::{ActionResult, UserAccount, UserRole, UserStatus};
use crate::validation::{email_domain, first_message_in, password_strength, require};
use crate::{Error, Result};

/// Which field's message wins when several are invalid.
const NEW_USER_ORDER: &[&str] = &["username", "password", "email"];
const UPDATE_ORDER: &[&str] = &["email", "password"];

/// Account creation form. New accounts always get the `user` role.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(
        email(message = "Invalid email format"),
        custom(function = "email_domain")
    )]
    pub email: String,
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = "password_strength")
    )]
    pub password: String,
}

/// Partial update; absent fields are left alone. Username cannot change.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(
        email(message = "Invalid email format"),
        custom(function = "email_domain")
    )]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = "password_strength")
    )]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.role.is_none()
    }
}

#[derive(Serialize)]
struct CreateBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    role: UserRole,
}

#[derive(Serialize)]
struct StatusBody {
    status: UserStatus,
}

#[derive(Clone)]
pub struct UserAdminClient {
    api: ApiClient,
}

impl UserAdminClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /api/admin/users`
    pub async fn list_users(&self) -> ActionResult<Vec<UserAccount>> {
        report("list users", self.try_list().await)
    }

    /// `POST /api/admin/add-user`
    pub async fn add_user(&self, user: &NewUser) -> ActionResult<()> {
        let result = self.try_add(user).await;
        if result.is_ok() {
            info!(username = %user.username.trim(), "user created");
        }
        with_default(report("add user", result), "User created successfully")
    }

    /// `PATCH /api/admin/update-user/{id}`
    pub async fn update_user(&self, id: &str, update: &UserUpdate) -> ActionResult<()> {
        let result = self.try_update(id, update).await;
        with_default(report("update user", result), "User updated successfully")
    }

    /// `PATCH /api/admin/change-status/{id}`
    pub async fn change_status(&self, id: &str, status: UserStatus) -> ActionResult<()> {
        let result = self.try_change_status(id, status).await;
        if result.is_ok() {
            info!(user_id = %id, %status, "user status changed");
        }
        with_default(report("change status", result), "Status updated")
    }

    /// Flip between active and inactive.
    pub async fn toggle_status(&self, user: &UserAccount) -> ActionResult<()> {
        self.change_status(&user.id, user.status.toggled()).await
    }

    async fn try_list(&self) -> Result<Vec<UserAccount>> {
        let body = self.api.get_json("/api/admin/users", &[]).await?;
        wire::user_list(body)
    }

    async fn try_add(&self, user: &NewUser) -> Result<Option<String>> {
        require(&user.username, "Username is required")?;
        user.validate()
            .map_err(|e| Error::Validation(first_message_in(&e, NEW_USER_ORDER)))?;

        let reply = self
            .api
            .post_json("/api/admin/add-user", &CreateBody {
                username: user.username.trim(),
                email: user.email.trim(),
                password: &user.password,
                role: UserRole::User,
            })
            .await?;
        wire::action_ack(reply)
    }

    async fn try_update(&self, id: &str, update: &UserUpdate) -> Result<Option<String>> {
        require(id, "User ID is missing.")?;
        if update.is_empty() {
            return Err(Error::Validation("Nothing to update".to_string()));
        }
        update
            .validate()
            .map_err(|e| Error::Validation(first_message_in(&e, UPDATE_ORDER)))?;

        let path = format!("/api/admin/update-user/{}", segment(id.trim()));
        let reply = self.api.patch_json(&path, update).await?;
        wire::action_ack(reply)
    }

    async fn try_change_status(&self, id: &str, status: UserStatus) -> Result<Option<String>> {
        require(id, "User ID is missing.")?;
        let path = format!("/api/admin/change-status/{}", segment(id.trim()));
        let reply = self.api.patch_json(&path, &StatusBody { status }).await?;
        wire::action_ack(reply)
    }
}

fn report<T>(action: &str, result: Result<T>) -> ActionResult<T> {
    if let Err(e) = &result {
        warn!(action, error = %e, "user admin request failed");
    }
    result.into()
}

/// Use the backend's message when it sent one.
fn with_default(result: ActionResult<Option<String>>, fallback: &str) -> ActionResult<()> {
    match result.data {
        Some(message) if result.success => {
            ActionResult::success(()).with_message(message.unwrap_or_else(|| fallback.to_string()))
        }
        _ => ActionResult {
            success: false,
            data: None,
            message: result.message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{api, json, ok, FakeTransport};
    use crate::http::Method;
    use serde_json::json as j;

    fn new_user(password: &str, email: &str) -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn new_user_validation_messages() {
        assert!(new_user("Secret@12", "alice@example.com").validate().is_ok());

        let err = crate::Error::from(new_user("Secret@12", "not-an-email").validate().unwrap_err());
        assert_eq!(err.to_string(), "Invalid email format");

        let err = crate::Error::from(new_user("abcdefgh1", "alice@example.com").validate().unwrap_err());
        assert_eq!(err.to_string(), crate::validation::PASSWORD_RULE);
    }

    #[tokio::test]
    async fn add_user_posts_user_role() {
        let transport = FakeTransport::new(|_| ok(j!({"status": "success", "message": "User added"})));
        let users = UserAdminClient::new(api(transport.clone()));

        let result = users.add_user(&new_user("Secret@12", "alice@example.com")).await;
        assert!(result.success);
        assert_eq!(result.message.as_deref(), Some("User added"));

        let sent = transport.sent();
        assert_eq!(sent[0].path, "/api/admin/add-user");
        let body = sent[0].body.as_ref().unwrap();
        assert_eq!(body["role"], "user");
        assert_eq!(body["username"], "alice");
    }

    #[tokio::test]
    async fn invalid_user_is_rejected_before_request() {
        let transport = FakeTransport::new(|_| ok(j!({})));
        let users = UserAdminClient::new(api(transport.clone()));

        let result = users.add_user(&new_user("short1!", "alice@example.com")).await;
        assert!(!result.success);
        assert_eq!(result.message.as_deref(), Some("Password must be at least 8 characters"));

        let mut blank = new_user("Secret@12", "alice@example.com");
        blank.username = "   ".to_string();
        assert_eq!(
            users.add_user(&blank).await.message.as_deref(),
            Some("Username is required")
        );
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn undotted_email_domain_is_rejected_before_request() {
        let transport = FakeTransport::new(|_| ok(j!({"status": "success"})));
        let users = UserAdminClient::new(api(transport.clone()));

        let result = users.add_user(&new_user("Secret@12", "alice@localhost")).await;
        assert!(!result.success);
        assert_eq!(result.message.as_deref(), Some("Invalid email format"));

        let update = UserUpdate {
            email: Some("alice@localhost".to_string()),
            ..UserUpdate::default()
        };
        let result = users.update_user("7", &update).await;
        assert_eq!(result.message.as_deref(), Some("Invalid email format"));
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn first_reported_problem_follows_form_order() {
        let transport = FakeTransport::new(|_| ok(j!({"status": "success"})));
        let users = UserAdminClient::new(api(transport.clone()));

        let result = users.add_user(&new_user("abcdefgh1", "alice@localhost")).await;
        assert_eq!(result.message.as_deref(), Some(crate::validation::PASSWORD_RULE));

        let update = UserUpdate {
            email: Some("alice@localhost".to_string()),
            password: Some("abcdefgh1".to_string()),
            role: None,
        };
        let result = users.update_user("7", &update).await;
        assert_eq!(result.message.as_deref(), Some("Invalid email format"));
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn backend_rejection_becomes_message() {
        let transport = FakeTransport::new(|_| json(409, j!({"detail": "Email already exists"})));
        let users = UserAdminClient::new(api(transport));
        let result = users.add_user(&new_user("Secret@12", "alice@example.com")).await;
        assert!(!result.success);
        assert!(result.message.unwrap().contains("Email already exists"));
    }

    #[tokio::test]
    async fn update_sends_only_present_fields() {
        let transport = FakeTransport::new(|_| ok(j!({"status": "success"})));
        let users = UserAdminClient::new(api(transport.clone()));

        let update = UserUpdate {
            email: Some("new@example.com".to_string()),
            ..UserUpdate::default()
        };
        let result = users.update_user("7", &update).await;
        assert!(result.success);
        assert_eq!(result.message.as_deref(), Some("User updated successfully"));

        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::Patch);
        assert_eq!(sent[0].path, "/api/admin/update-user/7");
        assert_eq!(sent[0].body, Some(j!({"email": "new@example.com"})));

        let bad = UserUpdate {
            password: Some("password".to_string()),
            ..UserUpdate::default()
        };
        assert!(!users.update_user("7", &bad).await.success);
        assert!(!users.update_user("7", &UserUpdate::default()).await.success);
        assert_eq!(transport.count(), 1);
    }

    #[tokio::test]
    async fn toggle_flips_status() {
        let transport = FakeTransport::new(|_| ok(j!({"status": "success"})));
        let users = UserAdminClient::new(api(transport.clone()));
        let account = UserAccount {
            id: "5".to_string(),
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            role: UserRole::User,
            status: UserStatus::Active,
            reports_count: 2,
            created_at: None,
        };

        assert!(users.toggle_status(&account).await.success);
        let sent = transport.sent();
        assert_eq!(sent[0].path, "/api/admin/change-status/5");
        assert_eq!(sent[0].body, Some(j!({"status": "inactive"})));
    }

    #[tokio::test]
    async fn list_users_decodes() {
        let transport = FakeTransport::new(|_| {
            ok(j!({"users": [{"id": 1, "username": "alice", "email": "a@example.com",
                              "role": "admin", "status": "active"}]}))
        });
        let users = UserAdminClient::new(api(transport));
        let listed = users.list_users().await;
        assert!(listed.success);
        assert_eq!(listed.data.unwrap()[0].role, UserRole::Admin);
    }

    #[tokio::test]
    async fn list_failure_is_swallowed_into_message() {
        let transport = FakeTransport::new(|_| Err(crate::Error::Transport("offline".into())));
        let users = UserAdminClient::new(api(transport));
        let listed = users.list_users().await;
        assert!(!listed.success);
        assert!(listed.data.is_none());
        assert!(listed.message.unwrap().contains("offline"));
    }
}
