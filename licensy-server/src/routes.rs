//! HTTP handlers.

use crate::auth::Credentials;
use crate::error::ApiError;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use licensy_license::{LicenseResult, Verdict};
use licensy_types::wire::{IssueLicenseRequest, VerdictBody};
use licensy_types::{License, LicenseKey, OwnerId, UsageLogEntry};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub owner: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsageParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/v1/verify`
///
/// Answers 503 with the full verdict array when any verdict is an error, so
/// callers see which keys were still decided.
pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let credentials = Credentials::from_headers(&headers);

    let keys: Vec<String> = match serde_json::from_slice(&body) {
        Ok(keys) => keys,
        Err(e) => {
            state.endpoint.authenticate(credentials.as_ref())?;
            return Err(ApiError::BadRequest(format!(
                "body must be a JSON array of key strings: {e}"
            )));
        }
    };

    let verdicts = state.endpoint.verify(credentials.as_ref(), keys).await?;
    let status = if verdicts.iter().any(|v| v.verdict == Verdict::Error) {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    let body: Vec<VerdictBody> = verdicts.into_iter().map(|v| v.into_wire()).collect();
    Ok((status, Json(body)).into_response())
}

/// `POST /api/v1/licenses`
pub async fn issue_license(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<IssueLicenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<License>), ApiError> {
    state.require_admin(&headers)?;
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let issuer = state.issuer.clone();
    let license = blocking(move || {
        issuer.issue(&OwnerId::new(request.owner), request.key.as_deref())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(license)))
}

/// `GET /api/v1/licenses?owner=`
pub async fn list_licenses(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<License>>, ApiError> {
    state.require_admin(&headers)?;
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let issuer = state.issuer.clone();
    let owner = params.owner.map(OwnerId::new);
    let licenses = blocking(move || issuer.list(owner.as_ref())).await?;
    Ok(Json(licenses))
}

/// `GET /api/v1/licenses/{key}`
pub async fn get_license(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<Json<License>, ApiError> {
    state.require_admin(&headers)?;
    let issuer = state.issuer.clone();
    let license = blocking(move || issuer.get(&LicenseKey::new(key))).await?;
    Ok(Json(license))
}

/// `POST /api/v1/licenses/{key}/revoke`
pub async fn revoke_license(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<Json<License>, ApiError> {
    state.require_admin(&headers)?;
    let issuer = state.issuer.clone();
    let license = blocking(move || issuer.revoke(&LicenseKey::new(key))).await?;
    Ok(Json(license))
}

/// `GET /api/v1/licenses/{key}/usage?from=&to=`
///
/// Both bounds are inclusive RFC 3339 timestamps; either may be omitted.
pub async fn license_usage(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
    params: Result<Query<UsageParams>, QueryRejection>,
) -> Result<Json<Vec<UsageLogEntry>>, ApiError> {
    state.require_admin(&headers)?;
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let from = params.from.unwrap_or(DateTime::<Utc>::MIN_UTC);
    let to = params.to.unwrap_or(DateTime::<Utc>::MAX_UTC);
    if from > to {
        return Err(ApiError::BadRequest("from must not be after to".to_string()));
    }

    let issuer = state.issuer.clone();
    let entries = blocking(move || issuer.usage(&LicenseKey::new(key), from, to)).await?;
    Ok(Json(entries))
}

/// Runs a store-backed admin operation off the async workers.
async fn blocking<T, F>(op: F) -> Result<T, ApiError>
where
    F: FnOnce() -> LicenseResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(op).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            warn!("admin task failed: {e}");
            Err(ApiError::Internal)
        }
    }
}
