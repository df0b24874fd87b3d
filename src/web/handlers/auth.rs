//! Authentication handlers.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::auth::{AuthService, AuthSession, SessionCookie, TokenIssuer};
use crate::config::Config;
use crate::file::{BlobStore, UploadPolicy};
use crate::web::dto::{
    ApiResponse, AuthResponse, LoginRequest, MeResponse, MessageResponse, RegisterRequest,
    UserInfo, ValidateResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;
use crate::Database;

/// Application state shared across handlers.
pub struct AppState {
    /// Database handle (the pool is internally shared).
    pub db: Database,
    /// Session token signer/verifier.
    pub tokens: TokenIssuer,
    /// Session cookie settings.
    pub cookie: SessionCookie,
    /// Whether login/register also set the session cookie.
    pub sso_cookie: bool,
    /// Original and thumbnail blob roots.
    pub blobs: BlobStore,
    /// Upload limits.
    pub policy: UploadPolicy,
    /// Quota for new accounts, in bytes.
    pub default_quota: i64,
}

impl AppState {
    /// Build the state from the loaded config and an opened database.
    ///
    /// Creates the blob directories if they do not exist.
    pub fn new(config: &Config, db: Database) -> crate::Result<Self> {
        let blobs = BlobStore::new(
            &config.storage.upload_path,
            &config.storage.thumbnail_path,
        )?;

        Ok(Self {
            db,
            tokens: TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_expiry_secs),
            cookie: SessionCookie::from_config(&config.auth),
            sso_cookie: config.auth.sso_cookie,
            blobs,
            policy: UploadPolicy::from_config(&config.storage),
            default_quota: config.storage.default_quota_bytes,
        })
    }

    pub(crate) fn auth_service(&self) -> AuthService<'_> {
        AuthService::new(&self.db, &self.tokens, self.default_quota)
    }

    /// Body for a freshly issued session, plus the cookie if SSO is on.
    fn session_response(&self, jar: CookieJar, session: AuthSession) -> (CookieJar, AuthResponse) {
        let jar = if self.sso_cookie {
            jar.add(self.cookie.build(&session.token))
        } else {
            jar
        };

        let response = AuthResponse {
            access_token: session.token,
            token_type: "bearer".to_string(),
            expires_in: self.tokens.expiry_secs(),
            user: UserInfo::from(session.user),
        };
        (jar, response)
    }
}

/// POST /api/auth/register - Create an account and log it in.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<ApiResponse<AuthResponse>>), ApiError> {
    let session = state.auth_service().register(&req.email, &req.password).await?;
    let (jar, response) = state.session_response(jar, session);

    Ok((StatusCode::CREATED, jar, Json(ApiResponse::new(response))))
}

/// POST /api/auth/login - Exchange credentials for a session token.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<AuthResponse>>), ApiError> {
    let session = state.auth_service().login(&req.identifier, &req.password).await?;
    let (jar, response) = state.session_response(jar, session);

    Ok((jar, Json(ApiResponse::new(response))))
}

/// POST /api/auth/logout - Clear the session cookie.
///
/// Tokens are stateless; the token itself stays valid until it expires.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    tracing::info!(user_id = user.id, "User logged out");
    let jar = jar.add(state.cookie.removal());

    (jar, Json(ApiResponse::new(MessageResponse::new("Logged out"))))
}

/// GET /api/auth/me - Current user.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(AuthUser(user): AuthUser) -> Json<ApiResponse<MeResponse>> {
    Json(ApiResponse::new(MeResponse {
        user: UserInfo::from(user),
    }))
}

/// GET /api/auth/validate - Check a token (used by sibling applications).
#[utoipa::path(
    get,
    path = "/auth/validate",
    tag = "auth",
    responses(
        (status = 200, description = "Token is valid", body = ValidateResponse),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn validate(AuthUser(user): AuthUser) -> Json<ApiResponse<ValidateResponse>> {
    Json(ApiResponse::new(ValidateResponse {
        valid: true,
        user: UserInfo::from(user),
    }))
}
