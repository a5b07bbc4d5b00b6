//! Authentication endpoints

use axum::{extract::State, Json};
use axum_extra::extract::{cookie::Cookie, CookieJar};

use super::{remember_cookie, session_cookie, ApiResponse, AppJson, CurrentAdmin, REMEMBER_COOKIE, SESSION_COOKIE};
use crate::{
    error::AppResult,
    models::{
        admin::ChangePassword,
        auth::{LoginRequest, LoginResponse, MeResponse},
    },
};

/// Log in with username or email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; also sets the session cookie", body = LoginResponse),
        (status = 401, description = "Invalid credentials or inactive account")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    jar: CookieJar,
    AppJson(request): AppJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<LoginResponse>>)> {
    let mut response = state.services.auth.login(&request).await?;
    let secure = state.config.session.cookie_secure;

    let mut jar = jar.add(session_cookie(response.token.clone(), secure));
    if let Some((raw, expires_at)) = response.remember_token.take() {
        jar = jar.add(remember_cookie(raw, secure, expires_at));
    }

    Ok((jar, ApiResponse::with_message(response, "Login successful")))
}

/// End the current session and forget the remember-me token
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<ApiResponse<()>>)> {
    state.services.auth.logout(&ctx).await?;

    let jar = jar
        .remove(Cookie::build(SESSION_COOKIE).path("/"))
        .remove(Cookie::build(REMEMBER_COOKIE).path("/"));
    Ok((jar, ApiResponse::with_message((), "Logged out")))
}

/// Get the current admin and effective permissions
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current admin", body = MeResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
) -> AppResult<Json<ApiResponse<MeResponse>>> {
    let me = state.services.auth.me(&ctx).await?;
    Ok(ApiResponse::ok(me))
}

/// Change own password
#[utoipa::path(
    post,
    path = "/auth/change-password",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = ChangePassword,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Current password is incorrect")
    )
)]
pub async fn change_password(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(data): AppJson<ChangePassword>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.services.auth.change_password(&ctx, &data).await?;
    Ok(ApiResponse::with_message((), "Password changed"))
}
