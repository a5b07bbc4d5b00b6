//! API handlers for Depot REST endpoints

pub mod activity;
pub mod admins;
pub mod auth;
pub mod borrowing_items;
pub mod borrowing_requests;
pub mod categories;
pub mod customers;
pub mod damage_reports;
pub mod employees;
pub mod health;
pub mod item_types;
pub mod locations;
pub mod materials;
pub mod openapi;
pub mod return_items;
pub mod transactions;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request, State},
    http::{
        header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE},
        request::Parts,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar, SameSite},
    Multipart,
};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{transfer::ExportFormat, AuthContext},
    services::transfer::to_csv,
    AppState,
};

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "depot_session";
/// Cookie carrying the raw remember-me token
pub const REMEMBER_COOKIE: &str = "depot_remember";

/// Success envelope of every JSON response
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            message: None,
        })
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            message: Some(message.into()),
        })
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Rows of the requested page
    pub items: Vec<T>,
    /// Total number of matching rows
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Rows per page
    pub per_page: i64,
}

/// JSON body extractor that rejects with the error envelope
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// JSON body that may be left out; an empty body yields `T::default()`
pub struct OptionalJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        serde_json::from_slice(&body)
            .map(Self)
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e)))
    }
}

/// Extractor for the admin resolved by [`auth_gate`]
pub struct CurrentAdmin(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(CurrentAdmin)
            .ok_or_else(|| AppError::Authentication("Not authenticated".to_string()))
    }
}

fn bearer_token(parts: &Request) -> Option<String> {
    parts
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Cookie holding a session token
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Cookie holding a remember-me token, valid until `expires_at`
pub fn remember_cookie(token: String, secure: bool, expires_at: DateTime<Utc>) -> Cookie<'static> {
    let max_age = (expires_at - Utc::now()).num_seconds().max(0);
    Cookie::build((REMEMBER_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age))
        .build()
}

/// Resolve the caller from a bearer token, the session cookie or the
/// remember-me cookie, and make it available to [`CurrentAdmin`]. A
/// remember-me hit opens a new session whose cookie is set on the response.
pub async fn auth_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let session_token = bearer_token(&request)
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()));
    let remember_token = jar.get(REMEMBER_COOKIE).map(|c| c.value().to_string());

    if session_token.is_none() && remember_token.is_none() {
        return next.run(request).await;
    }

    let resolved = match state
        .services
        .auth
        .authenticate(session_token.as_deref(), remember_token.as_deref())
        .await
    {
        Ok(resolved) => resolved,
        Err(e) => return e.into_response(),
    };

    match resolved {
        Some(auth) => {
            request.extensions_mut().insert(auth.context);
            let response = next.run(request).await;
            match auth.renewed_session {
                Some((token, _)) => {
                    let secure = state.config.session.cookie_secure;
                    (jar.add(session_cookie(token, secure)), response).into_response()
                }
                None => response,
            }
        }
        None => next.run(request).await,
    }
}

/// Download response for an export, as CSV or a JSON array
pub fn export_response<T: Serialize>(
    rows: Vec<T>,
    format: ExportFormat,
    name: &str,
) -> AppResult<Response> {
    let date = Utc::now().format("%Y-%m-%d");
    let (content_type, extension, body) = match format {
        ExportFormat::Csv => ("text/csv; charset=utf-8", "csv", to_csv(&rows)?),
        ExportFormat::Json => (
            "application/json",
            "json",
            serde_json::to_vec(&rows)
                .map_err(|e| AppError::Internal(format!("JSON encoding failed: {}", e)))?,
        ),
    };
    let disposition = format!("attachment; filename=\"{}_{}.{}\"", name, date, extension);

    Ok((
        [(CONTENT_TYPE, content_type.to_string()), (CONTENT_DISPOSITION, disposition)],
        body,
    )
        .into_response())
}

/// Content of the `file` field of a multipart upload
pub async fn read_upload(mut multipart: Multipart) -> AppResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
            return Ok(data.to_vec());
        }
    }
    Err(AppError::BadRequest("Missing multipart field 'file'".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_empty_message() {
        let Json(body) = ApiResponse::ok(vec![1, 2]);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "success": true, "data": [1, 2] })
        );

        let Json(body) = ApiResponse::with_message((), "Logged out");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "success": true, "data": null, "message": "Logged out" })
        );
    }

    #[test]
    fn test_csv_export_headers() {
        #[derive(Serialize)]
        struct Row {
            id: i32,
            name: &'static str,
        }

        let response = export_response(vec![Row { id: 1, name: "Drill" }], ExportFormat::Csv, "materials")
            .unwrap();
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "text/csv; charset=utf-8");
        let disposition = headers[CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"materials_"));
        assert!(disposition.ends_with(".csv\""));
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_field_gets_error_envelope() {
        use crate::models::transaction::CreateTransaction;

        let rejection = AppJson::<CreateTransaction>::from_request(
            json_request(r#"{"borrowing_request_id": 1, "transaction_type": "borrow"}"#),
            &(),
        )
        .await
        .err()
        .unwrap();

        let response = rejection.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("processed_by"));
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_bad_request() {
        use crate::models::transaction::CreateReturnItem;

        let request = Request::builder()
            .body(axum::body::Body::from("{}"))
            .unwrap();
        let rejection = AppJson::<CreateReturnItem>::from_request(request, &())
            .await
            .err()
            .unwrap();
        assert_eq!(rejection.into_response().status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_optional_body_defaults_when_empty() {
        use crate::models::borrowing::{ApproveBorrowingRequest, RejectBorrowingRequest};

        let OptionalJson(data) = OptionalJson::<ApproveBorrowingRequest>::from_request(json_request(""), &())
            .await
            .unwrap();
        assert!(data.items.is_empty());

        let OptionalJson(data) =
            OptionalJson::<RejectBorrowingRequest>::from_request(json_request(r#"{"reason": "broken"}"#), &())
                .await
                .unwrap();
        assert_eq!(data.reason.as_deref(), Some("broken"));

        let malformed = OptionalJson::<ApproveBorrowingRequest>::from_request(
            json_request(r#"{"items": [{"id": 1}]}"#),
            &(),
        )
        .await;
        assert!(matches!(malformed, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_session_cookie_flags() {
        let cookie = session_cookie("abc".to_string(), true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
