/*!
 * # Authentication Module
 *
 * Email/password accounts with argon2 hashes and HS256 JWT bearer tokens.
 *
 * - [`AuthService`] signs users up, checks credentials, records every login
 *   attempt and issues/validates tokens.
 * - [`auth_middleware`] turns a bearer token into an [`AuthUser`] request extension.
 * - [`employee_middleware`] restricts a route group to `EMPLOYEE` users.
 */

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Duration as ChronoDuration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::entities::{enums::UserType, login_attempt, user};
use crate::errors::ServiceError;

pub mod password;

pub use password::{hash_password, verify_password};

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,         // Subject (user ID)
    pub email: String,       // User's email
    pub name: String,        // "first last"
    pub is_admin: bool,      // Admin flag
    pub user_type: UserType, // EMPLOYEE | CUSTOMER | DEMO
    pub jti: String,         // JWT ID (unique identifier for this token)
    pub iat: i64,            // Issued at time
    pub exp: i64,            // Expiration time
    pub nbf: i64,            // Not valid before time
    pub iss: String,         // Issuer
    pub aud: String,         // Audience
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub user_type: UserType,
    pub token_id: String,
}

impl AuthUser {
    pub fn is_employee(&self) -> bool {
        self.user_type == UserType::Employee
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthUser {
            user_id,
            email: claims.email,
            name: claims.name,
            is_admin: claims.is_admin,
            user_type: claims.user_type,
            token_id: claims.jti,
        })
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_audience: String,
        jwt_issuer: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            access_token_expiration,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_audience.clone(),
            cfg.auth_issuer.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
        )
    }
}

/// Request metadata stored alongside each login attempt.
#[derive(Debug, Clone)]
pub struct LoginContext {
    pub ip_address: String,
    pub user_agent: String,
}

impl LoginContext {
    /// First `x-forwarded-for` hop and the `user-agent`, `"unknown"` when absent.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip_address = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("unknown")
            .to_string();
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        Self {
            ip_address,
            user_agent,
        }
    }
}

/// Signup payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    pub user_type: Option<UserType>,
}

/// Login credentials
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// A freshly signed access token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Authentication service that handles accounts and token issuance
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DatabaseConnection>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, user: &user::Model) -> Result<IssuedToken, AuthError> {
        let now = chrono::Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user.user_id.to_string(),
            email: user.email.clone(),
            name: user.full_name(),
            is_admin: user.is_admin,
            user_type: user.user_type,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
        })
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.validate_nbf = true;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    /// Creates an account. Emails are stored lower-cased.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: SignupRequest) -> Result<user::Model, ServiceError> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();

        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(email.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)?;
        let user = user::ActiveModel {
            user_id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(password_hash),
            first_name: Set(request.first_name.trim().to_string()),
            last_name: Set(request.last_name.trim().to_string()),
            is_active: Set(true),
            is_admin: Set(false),
            user_type: Set(request.user_type.unwrap_or(UserType::Customer)),
            customer_id: Set(None),
            last_login: Set(None),
            login_count: Set(0),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(user_id = %user.user_id, "user signed up");
        Ok(user)
    }

    /// Checks credentials, records the attempt and issues a token.
    ///
    /// Unknown email, wrong password and inactive accounts are indistinguishable
    /// to the caller.
    #[instrument(skip(self, credentials, ctx), fields(email = %credentials.email))]
    pub async fn login(
        &self,
        credentials: &LoginCredentials,
        ctx: &LoginContext,
    ) -> Result<(IssuedToken, user::Model), AuthError> {
        let email = credentials.email.trim().to_lowercase();

        let found = user::Entity::find()
            .filter(user::Column::Email.eq(email.clone()))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let user = match found {
            Some(user) => user,
            None => {
                self.record_attempt(None, &email, ctx, Some("User not found"))
                    .await;
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !user.is_active {
            self.record_attempt(Some(user.user_id), &email, ctx, Some("Account inactive"))
                .await;
            return Err(AuthError::InvalidCredentials);
        }

        let valid = verify_password(&credentials.password, &user.password_hash)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        if !valid {
            self.record_attempt(Some(user.user_id), &email, ctx, Some("Invalid password"))
                .await;
            return Err(AuthError::InvalidCredentials);
        }

        let mut active: user::ActiveModel = user.clone().into();
        active.login_count = Set(user.login_count + 1);
        active.last_login = Set(Some(crate::db::now()));
        let user = active
            .update(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        self.record_attempt(Some(user.user_id), &email, ctx, None)
            .await;

        let token = self.generate_token(&user)?;
        debug!(user_id = %user.user_id, "issued access token");
        Ok((token, user))
    }

    /// Writes a login_attempts row; a failed audit write never fails the login.
    async fn record_attempt(
        &self,
        user_id: Option<Uuid>,
        email: &str,
        ctx: &LoginContext,
        error_message: Option<&str>,
    ) {
        let attempt = login_attempt::ActiveModel {
            login_attempt_id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            email: Set(email.to_string()),
            success: Set(error_message.is_none()),
            ip_address: Set(Some(ctx.ip_address.clone())),
            user_agent: Set(Some(ctx.user_agent.clone())),
            error_message: Set(error_message.map(str::to_string)),
            created_at: Set(crate::db::now()),
        };
        if let Err(e) = attempt.insert(&*self.db).await {
            warn!(error = %e, "failed to record login attempt");
        }
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Employee access required")]
    NotEmployee,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message): (StatusCode, &str, &str) = match &self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                "Authentication required",
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                "Invalid credentials",
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token",
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Token has expired",
            ),
            Self::NotEmployee => (StatusCode::UNAUTHORIZED, "AUTH_NOT_EMPLOYEE", "Unauthorized"),
            Self::TokenCreation(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_TOKEN_CREATION_FAILED",
                "Internal server error",
            ),
            Self::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_DATABASE_ERROR",
                "Internal server error",
            ),
            Self::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_INTERNAL_ERROR",
                "Internal server error",
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "authentication failure");
        }

        let body = Json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": error_message,
            }
        }));

        (status, body).into_response()
    }
}

/// Authentication middleware that extracts and validates bearer tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return AuthError::InternalError("Authentication service not available".into())
                .into_response();
        }
    };

    match extract_auth_from_headers(request.headers(), &auth_service) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Employee guard; must run after [`auth_middleware`].
pub async fn employee_middleware(request: Request, next: Next) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuth)?;

    if !user.is_employee() {
        warn!(user_id = %user.user_id, "non-employee rejected by employee guard");
        return Err(AuthError::NotEmployee);
    }

    Ok(next.run(request).await)
}

fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingAuth)?;

    let claims = auth_service.validate_token(token)?;
    AuthUser::try_from(claims)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_employee(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_employee(self) -> Self {
        self.layer(axum::middleware::from_fn(employee_middleware))
            .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use sea_orm::{ConnectOptions, Database};

    const SECRET: &str = "k9Qz4vT1mW8pL2nR7sY5bX3cJ6hF0dG_integration_suite_signing_key_for_tests_only";

    async fn service() -> AuthService {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();
        crate::db::run_migrations(&db).await.unwrap();
        AuthService::new(
            AuthConfig::new(
                SECRET.into(),
                "backoffice-clients".into(),
                "backoffice-api".into(),
                Duration::from_secs(3600),
            ),
            Arc::new(db),
        )
    }

    fn signup(email: &str) -> SignupRequest {
        SignupRequest {
            email: email.into(),
            password: "secret1".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            user_type: Some(UserType::Employee),
        }
    }

    fn ctx() -> LoginContext {
        LoginContext {
            ip_address: "10.0.0.1".into(),
            user_agent: "tests".into(),
        }
    }

    #[tokio::test]
    async fn token_round_trip_carries_user_claims() {
        let svc = service().await;
        let user = svc.signup(signup("ada@example.com")).await.unwrap();
        let token = svc.generate_token(&user).unwrap();

        let claims = svc.validate_token(&token.access_token).unwrap();
        assert_eq!(claims.sub, user.user_id.to_string());
        assert_eq!(claims.name, "Ada Lovelace");
        assert_eq!(claims.user_type, UserType::Employee);
        assert!(!claims.is_admin);

        let auth_user = AuthUser::try_from(claims).unwrap();
        assert!(auth_user.is_employee());
    }

    #[tokio::test]
    async fn tokens_signed_for_another_audience_are_rejected() {
        let svc = service().await;
        let user = svc.signup(signup("aud@example.com")).await.unwrap();
        let mut other = svc.clone();
        other.config.jwt_audience = "someone-else".into();
        let token = other.generate_token(&user).unwrap();
        assert!(matches!(
            svc.validate_token(&token.access_token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn login_records_attempts_and_bumps_counters() {
        let svc = service().await;
        svc.signup(signup("Grace@Example.com")).await.unwrap();

        let bad = LoginCredentials {
            email: "grace@example.com".into(),
            password: "wrong".into(),
        };
        assert!(matches!(
            svc.login(&bad, &ctx()).await,
            Err(AuthError::InvalidCredentials)
        ));

        let good = LoginCredentials {
            email: "grace@example.com".into(),
            password: "secret1".into(),
        };
        let (_, user) = svc.login(&good, &ctx()).await.unwrap();
        assert_eq!(user.login_count, 1);
        assert!(user.last_login.is_some());

        let attempts = login_attempt::Entity::find().all(&*svc.db).await.unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts.iter().filter(|a| a.success).count(), 1);
        assert!(attempts
            .iter()
            .any(|a| a.error_message.as_deref() == Some("Invalid password")));
    }

    #[tokio::test]
    async fn duplicate_signup_is_a_conflict() {
        let svc = service().await;
        svc.signup(signup("dup@example.com")).await.unwrap();
        let err = svc.signup(signup("DUP@example.com")).await.unwrap_err();
        assert_matches::assert_matches!(err, ServiceError::Conflict(_));
    }

    #[test]
    fn login_context_uses_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.2"),
        );
        let ctx = LoginContext::from_headers(&headers);
        assert_eq!(ctx.ip_address, "203.0.113.9");
        assert_eq!(ctx.user_agent, "unknown");
    }
}
