//! Account operations that do not need an existing session, plus the
//! admin and password calls that do.
//!
//! Admin calls that hit the signed-in account itself keep the local session
//! in step: a role change is written to the store, a deletion ends the
//! session locally.

use crate::endpoints;
use crate::error::{ApiError, ApiResult};
use crate::identity::{Identity, Role};
use crate::request::ApiRequest;
use crate::session::SessionService;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// New account registered by the visitor themselves.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUp {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Account created by a super admin on someone else's behalf.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
}

#[derive(Serialize)]
struct EmailOnly<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewPassword<'a> {
    new_password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordChange<'a> {
    old_password: &'a str,
    new_password: &'a str,
}

#[derive(Serialize)]
struct RoleChange<'a> {
    id: &'a str,
    role: Role,
}

#[derive(Deserialize)]
struct UpdatedUser {
    user: Identity,
}

#[derive(Deserialize)]
struct Acknowledgement {
    #[serde(default)]
    success: bool,
}

impl SessionService {
    /// Register a participant or organizer account.
    pub async fn sign_up(&self, account: &SignUp) -> ApiResult<()> {
        if !account.role.is_self_assignable() {
            return Err(ApiError::InvalidInput(format!(
                "role {} cannot be chosen at sign-up",
                account.role
            )));
        }
        let request = ApiRequest::post(endpoints::SIGN_UP)
            .json(account)?
            .without_refresh();
        self.client().send(request).await?;
        info!(email = %account.email, role = %account.role, "Account registered");
        Ok(())
    }

    /// Email a password reset link.
    pub async fn forgot_password(&self, email: &str) -> ApiResult<()> {
        let request = ApiRequest::post(endpoints::PASSWORD_RESET_REQUEST)
            .json(&EmailOnly { email })?
            .without_refresh();
        self.client().send(request).await?;
        info!(email = %email, "Password reset requested");
        Ok(())
    }

    /// Set a new password using the token from the reset link.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> ApiResult<()> {
        let request = ApiRequest::post(endpoints::PASSWORD_RESET_VERIFY)
            .query("token", token)
            .json(&NewPassword { new_password })?
            .without_refresh();
        self.client().send(request).await?;
        info!("Password reset completed");
        Ok(())
    }

    /// Create an account for someone else. Requires a super admin session.
    pub async fn add_user(&self, account: &NewAccount) -> ApiResult<Identity> {
        let request = ApiRequest::post(endpoints::ADMIN_CREATE_ACCOUNT).json(account)?;
        let created: Identity = self.client().send_data(request).await?;
        info!(user_id = %created.id, role = %created.role, "Account created");
        Ok(created)
    }

    /// Give another account a different role. Requires a super admin session.
    pub async fn update_user_role(&self, user_id: &str, role: Role) -> ApiResult<Identity> {
        let request = ApiRequest::patch(endpoints::USER_ROLE).json(&RoleChange { id: user_id, role })?;
        let UpdatedUser { user } = self.client().send(request).await?.json::<UpdatedUser>()?;

        if self.store().replace_same_user(&user.id, user.clone()) {
            warn!(user_id = %user.id, role = %user.role, "Signed-in account changed its own role");
        }
        info!(user_id = %user.id, role = %user.role, "User role updated");
        Ok(user)
    }

    /// Delete an account. Requires a super admin session.
    pub async fn delete_user(&self, user_id: &str) -> ApiResult<()> {
        let response = self
            .client()
            .send(ApiRequest::delete(endpoints::delete_user(user_id)))
            .await?;
        let ack: Acknowledgement = response.json()?;
        if !ack.success {
            return Err(ApiError::Status {
                status: response.status.as_u16(),
                message: response.error_message(),
            });
        }

        if self.current_user().is_some_and(|u| u.id == user_id) {
            warn!(user_id = %user_id, "Signed-in account deleted, ending session");
            self.store().clear_local();
        }
        info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    /// Change the signed-in user's password.
    pub async fn update_password(&self, old_password: &str, new_password: &str) -> ApiResult<()> {
        let user = self.current_user().ok_or(ApiError::NotLoggedIn)?;
        let request = ApiRequest::put(endpoints::profile_password(&user.id)).json(&PasswordChange {
            old_password,
            new_password,
        })?;
        self.client().send(request).await?;
        info!(user_id = %user.id, "Password updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestBody;
    use crate::test_support::{identity, identity_body, ScriptedTransport};
    use reqwest::Method;
    use serde_json::json;
    use std::sync::Arc;

    fn service(transport: &Arc<ScriptedTransport>) -> SessionService {
        SessionService::new(transport.clone(), None)
    }

    fn body_of(transport: &ScriptedTransport, path: &str) -> Option<RequestBody> {
        transport
            .calls()
            .into_iter()
            .find(|r| r.path == path)
            .and_then(|r| r.body)
    }

    #[tokio::test]
    async fn test_sign_up_sends_camel_case_payload() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::POST, endpoints::SIGN_UP, 201, "{}");
        let session = service(&transport);

        session
            .sign_up(&SignUp {
                full_name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                password: "s3cret".to_string(),
                role: Role::Organizer,
            })
            .await
            .unwrap();

        assert_eq!(
            body_of(&transport, endpoints::SIGN_UP),
            Some(RequestBody::Json(json!({
                "fullName": "Ada Lovelace",
                "email": "ada@example.com",
                "password": "s3cret",
                "role": "ORGANIZER"
            })))
        );
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_rejects_super_admin_locally() {
        let transport = Arc::new(ScriptedTransport::new());
        let session = service(&transport);

        let err = session
            .sign_up(&SignUp {
                full_name: "Mallory".to_string(),
                email: "m@example.com".to_string(),
                password: "x".to_string(),
                role: Role::SuperAdmin,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reset_password_passes_token_as_query() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::POST, endpoints::PASSWORD_RESET_VERIFY, 200, "{}");
        let session = service(&transport);

        session.reset_password("tok123", "n3w").await.unwrap();

        let call = &transport.calls()[0];
        assert_eq!(call.query, vec![("token".to_string(), "tok123".to_string())]);
        assert_eq!(
            call.body,
            Some(RequestBody::Json(json!({"newPassword": "n3w"})))
        );
        assert!(!call.refreshes_on_unauthorized());
    }

    #[tokio::test]
    async fn test_expired_reset_token_is_not_treated_as_expired_session() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            Method::POST,
            endpoints::PASSWORD_RESET_VERIFY,
            401,
            r#"{"error":"Token expired"}"#,
        );
        let session = service(&transport);

        let err = session.reset_password("old", "n3w").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 401, .. }));
        assert_eq!(transport.calls_to(Method::GET, endpoints::REFRESH), 0);
    }

    #[tokio::test]
    async fn test_forgot_password() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::POST, endpoints::PASSWORD_RESET_REQUEST, 200, "{}");
        let session = service(&transport);

        session.forgot_password("ada@example.com").await.unwrap();
        assert_eq!(
            body_of(&transport, endpoints::PASSWORD_RESET_REQUEST),
            Some(RequestBody::Json(json!({"email": "ada@example.com"})))
        );
    }

    #[tokio::test]
    async fn test_add_user_returns_created_identity() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            Method::POST,
            endpoints::ADMIN_CREATE_ACCOUNT,
            201,
            identity_body("u9", Role::Organizer),
        );
        let session = service(&transport);
        session.set_identity(identity("admin", Role::SuperAdmin));

        let created = session
            .add_user(&NewAccount {
                full_name: "User u9".to_string(),
                email: "u9@example.com".to_string(),
                phone: "+15550100".to_string(),
                role: Role::Organizer,
            })
            .await
            .unwrap();

        assert_eq!(created.id, "u9");
        // The admin stays signed in as themselves
        assert_eq!(session.current_user().unwrap().id, "admin");
    }

    #[tokio::test]
    async fn test_update_password_requires_login() {
        let transport = Arc::new(ScriptedTransport::new());
        let session = service(&transport);

        let err = session.update_password("old", "new").await.unwrap_err();
        assert!(matches!(err, ApiError::NotLoggedIn));
    }

    #[tokio::test]
    async fn test_update_password_targets_current_user() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::PUT, "/api/user/profile/u1/password", 200, "{}");
        let session = service(&transport);
        session.set_identity(identity("u1", Role::Participant));

        session.update_password("old", "new").await.unwrap();
        assert_eq!(
            body_of(&transport, "/api/user/profile/u1/password"),
            Some(RequestBody::Json(json!({"oldPassword": "old", "newPassword": "new"})))
        );
    }

    #[tokio::test]
    async fn test_update_user_role_sends_id_and_role() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut promoted = identity("u7", Role::Organizer);
        promoted.full_name = "Promoted".to_string();
        transport.respond(
            Method::PATCH,
            endpoints::USER_ROLE,
            200,
            json!({ "message": "Role updated", "user": promoted }).to_string(),
        );
        let session = service(&transport);
        session.set_identity(identity("admin", Role::SuperAdmin));

        let updated = session.update_user_role("u7", Role::Organizer).await.unwrap();

        assert_eq!(updated, promoted);
        assert_eq!(
            body_of(&transport, endpoints::USER_ROLE),
            Some(RequestBody::Json(json!({"id": "u7", "role": "ORGANIZER"})))
        );
        assert_eq!(session.current_user().unwrap().role, Role::SuperAdmin);
    }

    #[tokio::test]
    async fn test_update_own_role_updates_session() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            Method::PATCH,
            endpoints::USER_ROLE,
            200,
            json!({ "user": identity("admin", Role::Participant) }).to_string(),
        );
        let session = service(&transport);
        session.set_identity(identity("admin", Role::SuperAdmin));

        session
            .update_user_role("admin", Role::Participant)
            .await
            .unwrap();
        assert_eq!(session.current_user().unwrap().role, Role::Participant);
    }

    #[tokio::test]
    async fn test_update_user_role_forbidden() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            Method::PATCH,
            endpoints::USER_ROLE,
            403,
            r#"{"error":"Only super admins can change roles"}"#,
        );
        let session = service(&transport);
        session.set_identity(identity("org1", Role::Organizer));

        let err = session
            .update_user_role("u7", Role::SuperAdmin)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 403, .. }));
        assert_eq!(transport.calls_to(Method::GET, endpoints::REFRESH), 0);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            Method::DELETE,
            "/api/user/delete/u7",
            200,
            r#"{"success":true,"message":"User deleted"}"#,
        );
        let session = service(&transport);
        session.set_identity(identity("admin", Role::SuperAdmin));

        session.delete_user("u7").await.unwrap();
        assert_eq!(transport.calls_to(Method::DELETE, "/api/user/delete/u7"), 1);
        assert_eq!(session.current_user().unwrap().id, "admin");
    }

    #[tokio::test]
    async fn test_delete_user_without_success_flag_fails() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            Method::DELETE,
            "/api/user/delete/u7",
            200,
            r#"{"success":false,"message":"User has active events"}"#,
        );
        let session = service(&transport);
        session.set_identity(identity("admin", Role::SuperAdmin));

        let err = session.delete_user("u7").await.unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 200);
                assert_eq!(message, "User has active events");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_deleting_own_account_ends_session() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::DELETE, "/api/user/delete/admin", 200, r#"{"success":true}"#);
        let session = service(&transport);
        session.set_identity(identity("admin", Role::SuperAdmin));

        session.delete_user("admin").await.unwrap();
        assert!(session.current_user().is_none());
    }
}
