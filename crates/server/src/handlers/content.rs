//! Script and binary content handlers.

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use scout_core::{ContentClass, ContentPath};
use scout_storage::StorageError;
use serde::{Deserialize, Serialize};

/// Response header carrying the hex signature of the body.
pub const X_SIGNATURE: HeaderName = HeaderName::from_static("x-signature");

/// Integrity metadata for a script, without its bytes.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScriptHashResponse {
    /// SHA-256 of the script, lowercase hex.
    pub script_hash: String,
}

/// GET /scripts/{*path} - Signed script, or its hash under `hash/`.
///
/// `path` is `[namespace/]filename`. A leading `hash/` selects the hash
/// response for the remainder, so `hash` is never read as a namespace.
pub async fn get_script(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Response> {
    let Path(path) = match path {
        Ok(path) => path,
        Err(rejection) => {
            let result = undecodable(ContentClass::Scripts, rejection);
            record("script", &result);
            return result;
        }
    };

    match path.strip_prefix("hash/") {
        Some(rest) => {
            let result = script_hash(&state, rest).await;
            record("script_hash", &result);
            result.map(IntoResponse::into_response)
        }
        None => {
            let result = serve_signed(&state, ContentClass::Scripts, &path).await;
            record("script", &result);
            result
        }
    }
}

/// GET /bin/{*path} - Signed binary.
pub async fn get_bin(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Response> {
    let result = match path {
        Ok(Path(path)) => serve_signed(&state, ContentClass::Bin, &path).await,
        Err(rejection) => undecodable(ContentClass::Bin, rejection),
    };
    record("bin", &result);
    result
}

/// A path that does not decode (e.g. percent-encoded invalid UTF-8) names
/// nothing we could serve.
fn undecodable(class: ContentClass, rejection: PathRejection) -> ApiResult<Response> {
    tracing::debug!(class = %class, error = %rejection, "Rejected undecodable content path");
    Err(ApiError::content_not_found(class))
}

async fn script_hash(state: &AppState, raw: &str) -> ApiResult<Json<ScriptHashResponse>> {
    let content = resolve(state, ContentClass::Scripts, raw).await?;
    Ok(Json(ScriptHashResponse {
        script_hash: state.signer.hash(&content),
    }))
}

async fn serve_signed(state: &AppState, class: ContentClass, raw: &str) -> ApiResult<Response> {
    let content = resolve(state, class, raw).await?;

    let signer = state.signer.clone();
    let to_sign = content.clone();
    let timer = metrics::SIGNING_DURATION.start_timer();
    let signature = tokio::task::spawn_blocking(move || signer.sign(&to_sign))
        .await
        .map_err(|e| ApiError::Internal(format!("signing task failed: {e}")))??;
    timer.observe_duration();

    let signature = HeaderValue::from_str(&signature)
        .map_err(|e| ApiError::Internal(format!("unencodable signature: {e}")))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (X_SIGNATURE, signature),
        ],
        content,
    )
        .into_response())
}

/// Validate `raw` and resolve it. Every miss becomes the class's not-found.
async fn resolve(state: &AppState, class: ContentClass, raw: &str) -> ApiResult<Bytes> {
    let parsed = match class {
        ContentClass::Scripts => ContentPath::parse_script(raw),
        ContentClass::Bin => ContentPath::parse_bin(raw),
    };
    let path = match parsed {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!(class = %class, path = raw, error = %e, "Rejected content path");
            return Err(ApiError::content_not_found(class));
        }
    };

    let result = state.resolver.resolve(&path).await;
    if let Some(len) = state.resolver.cache_len() {
        metrics::CACHE_ENTRIES.set(len as i64);
    }

    match result {
        Ok(Some(content)) => Ok(content),
        Ok(None) => Err(ApiError::content_not_found(class)),
        Err(StorageError::InvalidKey(reason)) => {
            tracing::warn!(key = %path, reason = %reason, "Refused key outside content root");
            Err(ApiError::content_not_found(class))
        }
        Err(e) => Err(e.into()),
    }
}

fn record<T>(kind: &str, result: &ApiResult<T>) {
    let outcome = match result {
        Ok(_) => "served",
        Err(ApiError::NotFound(_)) => "not_found",
        Err(_) => "error",
    };
    metrics::CONTENT_REQUESTS
        .with_label_values(&[kind, outcome])
        .inc();
}
