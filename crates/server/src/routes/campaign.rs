use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};

use service::campaign::{CampaignSnapshot, Section};
use service::storage::with_namespace;

use crate::errors::ApiError;
use crate::routes::rpc::namespace_from;
use crate::routes::AppState;

pub async fn load_all(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<CampaignSnapshot>, ApiError> {
    let campaign = state.campaign.clone();
    let load = async move { campaign.load_all().await };
    let snapshot = match namespace_from(&headers)? {
        Some(ns) => with_namespace(ns, load).await,
        None => load.await,
    };
    Ok(Json(snapshot))
}

pub async fn save_all(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(snapshot): Json<CampaignSnapshot>,
) -> Result<Json<Value>, ApiError> {
    let campaign = state.campaign.clone();
    let save = async move { campaign.save_all(&snapshot).await };
    let ok = match namespace_from(&headers)? {
        Some(ns) => with_namespace(ns, save).await,
        None => save.await,
    };
    Ok(Json(json!({"ok": ok})))
}

pub async fn load_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Value>>, ApiError> {
    let section: Section = section.parse()?;
    let campaign = state.campaign.clone();
    let load = async move { campaign.load_section(section).await };
    let items = match namespace_from(&headers)? {
        Some(ns) => with_namespace(ns, load).await,
        None => load.await,
    };
    Ok(Json(items))
}

pub async fn save_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
    headers: HeaderMap,
    Json(items): Json<Vec<Value>>,
) -> Result<Json<Value>, ApiError> {
    let section: Section = section.parse()?;
    let campaign = state.campaign.clone();
    let save = async move { campaign.save_section(section, &items).await };
    let ok = match namespace_from(&headers)? {
        Some(ns) => with_namespace(ns, save).await,
        None => save.await,
    };
    Ok(Json(json!({"ok": ok})))
}
