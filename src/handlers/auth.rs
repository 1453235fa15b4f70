use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{AuthError, IssuedToken, LoginContext, LoginCredentials, SignupRequest},
    errors::ServiceError,
    handlers::common::AppJson,
    events::Event,
    services::users::UserProfile,
    AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub success: bool,
    pub user_id: Uuid,
}

/// Signup failures use their own body shape: `{ success: false, errorMessage }`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupErrorResponse {
    pub success: bool,
    pub error_message: String,
}

pub struct SignupError(ServiceError);

impl IntoResponse for SignupError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if self.0.is_internal() {
            tracing::error!(error = %self.0, "signup failed");
        }
        let body = SignupErrorResponse {
            success: false,
            error_message: self.0.response_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub token: IssuedToken,
    pub user: UserProfile,
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created", body = SignupResponse),
        (status = 400, description = "Invalid input or duplicate email", body = SignupErrorResponse),
        (status = 500, description = "Internal server error", body = SignupErrorResponse),
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<AppJson<SignupRequest>, ServiceError>,
) -> Result<Json<SignupResponse>, SignupError> {
    let AppJson(request) = payload.map_err(SignupError)?;
    let user = state.auth.signup(request).await.map_err(SignupError)?;
    info!(user_id = %user.user_id, "user signed up");
    state
        .event_sender
        .send_or_log(Event::UserSignedUp(user.user_id))
        .await;

    Ok(Json(SignupResponse {
        success: true,
        user_id: user.user_id,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginCredentials,
    responses(
        (status = 200, description = "Access token issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(credentials): AppJson<LoginCredentials>,
) -> Result<Json<LoginResponse>, AuthError> {
    let context = LoginContext::from_headers(&headers);
    match state.auth.login(&credentials, &context).await {
        Ok((token, user)) => Ok(Json(LoginResponse {
            token,
            user: UserProfile::from(user),
        })),
        Err(e) => {
            if matches!(e, AuthError::InvalidCredentials) {
                warn!(ip = %context.ip_address, "login rejected");
                state
                    .event_sender
                    .send_or_log(Event::LoginFailed {
                        email: credentials.email.trim().to_lowercase(),
                    })
                    .await;
            }
            Err(e)
        }
    }
}
