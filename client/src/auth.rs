//! Login, logout and the current user.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::decode as wire;
use crate::http::ApiClient;
use crate::models::{ActionResult, Session, UserProfile, UserRole, UserStatus, View};
use crate::{Error, Result};

/// Claims we read from the bearer token.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub role: Option<String>,
    pub exp: Option<i64>,
}

/// Decode token claims without verifying the signature.
///
/// The backend owns verification; the client only reads identity fields.
pub fn read_claims(token: &str) -> Result<TokenClaims> {
    let token = token.strip_prefix("Bearer ").unwrap_or(token);

    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let key = DecodingKey::from_secret(b"unused");

    decode::<TokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| Error::Auth(format!("Failed to decode token: {}", e)))
}

/// Result of a login attempt.
pub type LoginOutcome = ActionResult<UserProfile>;

impl LoginOutcome {
    /// View a successful login navigates to.
    pub fn landing(&self) -> Option<View> {
        self.data.as_ref().map(|user| View::from(user.role))
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// Talks to `/api/login` and owns the stored session.
#[derive(Clone)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Exchange credentials for a session. Never returns an error; failures
    /// come back as an unsuccessful outcome with a message.
    pub async fn login(&self, identifier: &str, password: &str) -> LoginOutcome {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return LoginOutcome::error("Username and password are required");
        }

        match self.try_login(identifier, password).await {
            Ok(profile) => {
                info!(user = %profile.username, role = %profile.role, "login succeeded");
                LoginOutcome::success(profile)
            }
            Err(e) => {
                warn!(user = %identifier, error = %e, "login failed");
                let message = match e {
                    Error::Auth(message) => message,
                    Error::Api { message, .. } => message,
                    other => other.to_string(),
                };
                LoginOutcome::error(message)
            }
        }
    }

    async fn try_login(&self, identifier: &str, password: &str) -> Result<UserProfile> {
        let body = self
            .api
            .post_json("/api/login", &LoginBody {
                email: identifier,
                password,
            })
            .await?;
        let reply = wire::login(body)?;

        let token = match (reply.success, reply.token) {
            (true, Some(token)) => token,
            _ => {
                return Err(Error::Auth(
                    reply
                        .message
                        .unwrap_or_else(|| "Invalid username or password".to_string()),
                ))
            }
        };

        let profile = profile_from(identifier, &token, reply.role);
        self.api.session().save(&Session {
            token,
            profile: profile.clone(),
        })?;
        Ok(profile)
    }

    /// Drop the stored token and profile. Tokens are stateless, so nothing
    /// is sent to the backend.
    pub fn logout(&self) -> Result<()> {
        if let Some(user) = self.current_user() {
            info!(user = %user.username, "logged out");
        }
        self.api.session().clear()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.api.session().current_user()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user()
            .map(|u| u.role == UserRole::Admin)
            .unwrap_or(false)
    }

    /// Fail with `Unauthorized` unless an admin is logged in.
    pub fn require_admin(&self) -> Result<UserProfile> {
        match self.current_user() {
            Some(user) if user.role == UserRole::Admin => Ok(user),
            Some(_) => Err(Error::Unauthorized("Admin access required".to_string())),
            None => Err(Error::Auth("Not logged in".to_string())),
        }
    }
}

/// Build the profile from token claims, with the login reply's role taking
/// precedence and the typed identifier as the fallback identity.
fn profile_from(identifier: &str, token: &str, role: Option<UserRole>) -> UserProfile {
    let claims = read_claims(token).unwrap_or_else(|e| {
        warn!(error = %e, "token claims unreadable, using login identifier");
        TokenClaims::default()
    });

    let email = claims
        .email
        .or_else(|| identifier.contains('@').then(|| identifier.to_string()))
        .unwrap_or_default();
    let username = claims.username.unwrap_or_else(|| {
        identifier
            .split('@')
            .next()
            .unwrap_or(identifier)
            .to_string()
    });
    let role = role
        .or_else(|| claims.role.and_then(|r| r.parse().ok()))
        .unwrap_or(UserRole::User);

    UserProfile {
        id: claims.sub.unwrap_or_else(|| identifier.to_string()),
        username,
        email,
        role,
        status: UserStatus::Active,
    }
}
