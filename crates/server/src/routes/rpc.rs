use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde_json::Value;

use common::types::{OperationList, RpcReply};
use service::storage::with_namespace;

use crate::errors::ApiError;
use crate::routes::AppState;

/// Header carrying the caller's storage namespace.
pub const NAMESPACE_HEADER: &str = "x-namespace";

pub async fn list_operations(State(state): State<AppState>) -> Json<OperationList> {
    let operations = state.registry.operations().into_iter().map(str::to_string).collect();
    Json(OperationList { operations })
}

/// `POST /rpc/:name` with a JSON array of positional arguments.
pub async fn call_operation(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RpcReply>, ApiError> {
    let args = parse_args(&body)?;
    let registry = state.registry.clone();
    let call = async move { registry.call(&name, &args).await };
    let result = match namespace_from(&headers)? {
        Some(ns) => with_namespace(ns, call).await?,
        None => call.await?,
    };
    Ok(Json(RpcReply { result }))
}

fn parse_args(body: &[u8]) -> Result<Vec<Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Array(args)) => Ok(args),
        Ok(_) => Err(ApiError::BadRequest("arguments must be a JSON array".into())),
        Err(e) => Err(ApiError::BadRequest(format!("invalid JSON arguments: {e}"))),
    }
}

pub(crate) fn namespace_from(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    match headers.get(NAMESPACE_HEADER) {
        None => Ok(None),
        Some(v) => {
            let ns = v
                .to_str()
                .map_err(|_| ApiError::BadRequest("x-namespace must be visible ASCII".into()))?;
            let ns = ns.trim();
            Ok((!ns.is_empty()).then(|| ns.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn empty_body_means_no_arguments() {
        assert!(parse_args(b"").unwrap().is_empty());
        assert!(parse_args(b"  \n").unwrap().is_empty());
        assert_eq!(parse_args(br#"["party", 1]"#).unwrap().len(), 2);
    }

    #[test]
    fn non_array_body_is_rejected() {
        assert!(matches!(parse_args(br#"{"a":1}"#), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_args(b"[oops"), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn namespace_header_is_optional() {
        let mut headers = HeaderMap::new();
        assert_eq!(namespace_from(&headers).unwrap(), None);
        headers.insert(NAMESPACE_HEADER, HeaderValue::from_static("  "));
        assert_eq!(namespace_from(&headers).unwrap(), None);
        headers.insert(NAMESPACE_HEADER, HeaderValue::from_static("player-1"));
        assert_eq!(namespace_from(&headers).unwrap().as_deref(), Some("player-1"));
    }
}
