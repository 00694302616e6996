/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login with email and password
/// - `GET /v1/auth/google` - Redirect to the Google consent page
/// - `GET /v1/auth/google/callback` - Finish Google sign-in
/// - `GET /v1/auth/me` - Current session user
///
/// # Google sign-in state
///
/// The redirect issues a signed, short-lived `state` value, sends it to Google
/// and stores it in the [`STATE_COOKIE`] cookie. The callback only proceeds
/// when the `state` query parameter matches that cookie and still validates,
/// so a callback started from another browser is rejected.
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppQuery, ValidatedJson},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::{identity::NewAccount, middleware::AuthContext},
    models::user::PublicUser,
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Strength rules are checked by the identity resolver
    pub password: String,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token plus the user it was issued for
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Cookie binding the OAuth `state` to the browser that started sign-in
pub const STATE_COOKIE: &str = "taskdeck_oauth_state";

const STATE_COOKIE_PATH: &str = "/v1/auth/google";

/// Query string Google appends to the redirect URL
#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn state_cookie(state: &AppState, value: String) -> Cookie<'static> {
    let secure = state
        .config
        .google
        .as_ref()
        .is_some_and(|google| google.redirect_url.starts_with("https://"));

    Cookie::build((STATE_COOKIE, value))
        .path(STATE_COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Requires the callback `state` to equal the cookie and to still validate
fn check_state(state: &AppState, jar: &CookieJar, returned: Option<&str>) -> ApiResult<()> {
    let invalid = || ApiError::BadRequest("Invalid OAuth state".to_string());

    let returned = returned.filter(|s| !s.is_empty()).ok_or_else(invalid)?;
    let expected = jar.get(STATE_COOKIE).map(|c| c.value()).ok_or_else(invalid)?;
    if returned != expected {
        tracing::warn!("OAuth state does not match the sign-in cookie");
        return Err(invalid());
    }

    state.tokens.validate_state(returned).map_err(|_| invalid())?;
    Ok(())
}

/// Register a new user
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let user = state
        .identity
        .register(NewAccount {
            email: req.email,
            password: req.password,
            name: req.name,
        })
        .await?;

    let token = state.tokens.issue(&user)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Login endpoint
///
/// Unknown email and wrong password produce the same `401`.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = state.identity.login(&req.email, &req.password).await?;
    let token = state.tokens.issue(&user)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse { token, user }))
}

/// Sends the browser to the provider consent page
///
/// `503` when Google sign-in is not configured.
pub async fn google_redirect(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Redirect)> {
    let provider = state.oauth_provider()?;
    let oauth_state = state.tokens.issue_state()?;

    let url = provider
        .authorize_url(&oauth_state)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let jar = jar.add(state_cookie(&state, oauth_state));
    Ok((jar, Redirect::temporary(&url)))
}

/// Completes the authorization-code flow
///
/// With `FRONTEND_URL` set the browser is redirected to
/// `{FRONTEND_URL}/auth/callback?token=...`; otherwise the token is returned
/// as JSON. A missing or mismatched `state` answers `400`.
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    AppQuery(query): AppQuery<GoogleCallbackQuery>,
) -> ApiResult<Response> {
    let provider = state.oauth_provider()?;

    if let Some(error) = query.error {
        return Err(ApiError::BadRequest(format!("Google sign-in failed: {error}")));
    }
    check_state(&state, &jar, query.state.as_deref())?;
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".to_string()))?;

    let profile = provider.fetch_profile(&code).await.map_err(|e| {
        tracing::warn!(error = %e, "Google code exchange failed");
        ApiError::Unauthorized("Google sign-in failed".to_string())
    })?;

    let user = state.identity.oauth_login(profile).await?;
    let token = state.tokens.issue(&user)?;

    let jar = jar.remove(Cookie::build(STATE_COOKIE).path(STATE_COOKIE_PATH));

    match state.config.frontend_url.as_deref() {
        Some(frontend) => {
            let target = format!("{}/auth/callback?token={}", frontend.trim_end_matches('/'), token);
            Ok((jar, Redirect::temporary(&target)).into_response())
        }
        None => Ok((jar, Json(AuthResponse { token, user })).into_response()),
    }
}

/// Returns the authenticated user
pub async fn me(Extension(auth): Extension<AuthContext>) -> Json<PublicUser> {
    Json(auth.user)
}
