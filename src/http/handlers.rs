//! Route handlers.
//!
//! Thin adapters between axum extractors and the gateway: marshal the
//! request, call the gateway, map the outcome to an [`ApiError`] and record
//! metrics per branch.

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::gateway::{ForwardResponse, GatewayError};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Inbound login credentials.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Response to a successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Inbound command/payload pair.
#[derive(Debug, Deserialize)]
pub struct Package {
    pub command: String,
    pub payload: String,
}

/// Liveness/health snapshot.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
}

/// POST /authenticate - check credentials and issue a bearer token.
pub async fn authenticate(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let start = Instant::now();

    let Json(creds) = body.map_err(|rejection| {
        let err = ApiError::BadRequest(rejection.body_text());
        metrics::record_request("authenticate", err.status_code().as_u16(), start);
        err
    })?;

    match state.gateway.login(&creds.username, &creds.password).await {
        Ok(token) => {
            metrics::record_request("authenticate", 200, start);
            Ok(Json(TokenResponse { token }))
        }
        Err(GatewayError::InvalidCredentials) => {
            tracing::warn!(username = %creds.username, "Login rejected");
            metrics::record_request("authenticate", 401, start);
            Err(ApiError::Unauthorized)
        }
        Err(GatewayError::Store(e)) => {
            tracing::error!(error = %e, "Credential store failure");
            metrics::record_request("authenticate", 500, start);
            Err(ApiError::Internal)
        }
        Err(e) => {
            tracing::error!(error = %e, "Login failed");
            metrics::record_request("authenticate", 500, start);
            Err(ApiError::Internal)
        }
    }
}

/// POST /request-payload - authenticated command forwarding.
pub async fn request_payload(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Package>, JsonRejection>,
) -> Result<Json<ForwardResponse>, ApiError> {
    let start = Instant::now();

    let Json(req) = body.map_err(|rejection| {
        let err = ApiError::BadRequest(rejection.body_text());
        metrics::record_request("request-payload", err.status_code().as_u16(), start);
        err
    })?;

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match state
        .gateway
        .handle_forward(auth_header, &req.command, &req.payload)
        .await
    {
        Ok(response) => {
            metrics::record_request("request-payload", 200, start);
            metrics::record_round_trip("ok", start);
            state
                .backend_health
                .mark_success(state.health_config.healthy_threshold);
            Ok(Json(response))
        }
        Err(GatewayError::Unauthorized(e)) => {
            tracing::warn!(error = %e, "Rejected unauthenticated forward");
            metrics::record_request("request-payload", 401, start);
            Err(ApiError::Unauthorized)
        }
        Err(GatewayError::Backend(e)) => {
            tracing::error!(kind = e.kind(), error = %e, "Backend round trip failed");
            metrics::record_request("request-payload", 502, start);
            metrics::record_round_trip(e.kind(), start);
            state
                .backend_health
                .mark_failure(state.health_config.unhealthy_threshold);
            Err(ApiError::BadGateway)
        }
        Err(e) => {
            tracing::error!(error = %e, "Forward failed");
            metrics::record_request("request-payload", 500, start);
            Err(ApiError::Internal)
        }
    }
}

/// GET /healthz - gateway liveness and last observed backend health.
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.backend_health.state().as_str(),
    })
}
