// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! axum router and server loop.

use std::sync::Arc;

use anyhow::Result;
use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, error, info};

use crate::confirmation_handlers::handle_confirm_volunteer;
use crate::error::CoreError;
use crate::identity::require_caller;
use crate::management_handlers::handle_health_check;
use crate::roster_handlers::{ListVolunteersQuery, handle_list_volunteers};
use crate::signup_handlers::handle_create_signup;
use crate::state::HandlerState;

/// Shared state for the HTTP server
pub type HttpServerState = HandlerState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuccessBody<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    data: T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    error: String,
    error_code: &'static str,
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            debug!(error_code = self.error_code(), error = %self, "Request rejected");
            self.to_string()
        };

        let body = ErrorBody {
            success: false,
            error: message,
            error_code: self.error_code(),
        };
        (status, Json(body)).into_response()
    }
}

fn success<T: Serialize>(status: StatusCode, message: Option<String>, data: T) -> Response {
    let body = SuccessBody {
        success: true,
        message,
        data,
    };
    (status, Json(body)).into_response()
}

/// Decode a JSON body, reporting malformed input as a validation error.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, CoreError> {
    serde_json::from_slice(body)
        .map_err(|e| CoreError::validation("body", format!("Invalid JSON body: {}", e)))
}

/// Build the router over shared handler state.
pub fn router(state: Arc<HttpServerState>) -> Router {
    Router::new()
        .route("/volunteer-signups", post(create_signup))
        .route("/volunteer-signups/confirm", post(confirm_volunteer))
        .route("/events/{event_id}/volunteers", get(list_volunteers))
        .route("/health", get(health))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

async fn create_signup(
    State(state): State<Arc<HttpServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, CoreError> {
    let caller = state.identity.resolve(&headers);
    // Identity failures take precedence over a malformed body.
    let caller = require_caller(caller.as_ref())?;
    let request = parse_body(&body)?;
    let created = handle_create_signup(&state, Some(caller), request).await?;

    Ok(success(
        StatusCode::CREATED,
        Some("Successfully signed up for event".to_string()),
        created,
    ))
}

async fn confirm_volunteer(
    State(state): State<Arc<HttpServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, CoreError> {
    let caller = state.identity.resolve(&headers);
    let caller = require_caller(caller.as_ref())?;
    caller.require_group(&state.settings.manager_group)?;
    let request = parse_body(&body)?;
    let reviewed = handle_confirm_volunteer(&state, Some(caller), request).await?;

    Ok(success(
        StatusCode::OK,
        Some(format!("Volunteer {} successfully", reviewed.status)),
        reviewed,
    ))
}

async fn list_volunteers(
    State(state): State<Arc<HttpServerState>>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
    Query(query): Query<ListVolunteersQuery>,
) -> Result<Response, CoreError> {
    let caller = state.identity.resolve(&headers);
    let roster = handle_list_volunteers(&state, caller.as_ref(), &event_id, query).await?;

    Ok(success(StatusCode::OK, None, roster))
}

async fn health(State(state): State<Arc<HttpServerState>>) -> Response {
    let status = handle_health_check(&state).await;
    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status)).into_response()
}

/// Serve the router on `listener` until `shutdown_rx` flips to `true`.
pub async fn run_http_server(
    listener: TcpListener,
    state: Arc<HttpServerState>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            // A dropped sender also ends the server.
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
        })
        .await?;

    info!(addr = %addr, "HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EVENT_ID, open_event, seed, test_state};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_signup_route_envelope() {
        let (store, state) = test_state().await;
        seed(&store, &open_event(1, 3)).await;
        let app = router(Arc::new(state));

        let request = Request::post("/volunteer-signups")
            .header("x-caller-id", "vol-1")
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"eventId":"{}"}}"#, EVENT_ID)))
            .unwrap();
        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["volunteerId"], "vol-1");
    }

    #[tokio::test]
    async fn test_invalid_json_is_validation_error() {
        let (_store, state) = test_state().await;
        let app = router(Arc::new(state));

        let request = Request::post("/volunteer-signups")
            .header("x-caller-id", "vol-1")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["errorCode"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_identity_checked_before_body() {
        let (_store, state) = test_state().await;
        let app = router(Arc::new(state));

        let request = Request::post("/volunteer-signups")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errorCode"], "UNAUTHENTICATED");

        let request = Request::post("/volunteer-signups/confirm")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = Request::post("/volunteer-signups/confirm")
            .header("x-caller-id", "vol-1")
            .header("x-caller-groups", "Volunteers")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["errorCode"], "FORBIDDEN");

        let request = Request::post("/volunteer-signups/confirm")
            .header("x-caller-id", "manager-1")
            .header("x-caller-groups", "Managers")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorCode"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_missing_identity_is_401() {
        let (_store, state) = test_state().await;
        let app = router(Arc::new(state));

        let request = Request::get(format!("/events/{}/volunteers", EVENT_ID))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errorCode"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_health_route() {
        let (_store, state) = test_state().await;
        let app = router(Arc::new(state));

        let (status, body) = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], true);
        assert!(body["uptimeMs"].is_number());
    }

    #[test]
    fn test_database_error_hides_details() {
        let response = CoreError::DatabaseError {
            operation: "get_event".to_string(),
            details: "password authentication failed".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
