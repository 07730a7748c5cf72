//! Static catalog listings.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::schemas::catalog::{PersonalityInfo, TechniqueInfo};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_personalities, list_techniques),
    components(schemas(PersonalityInfo, TechniqueInfo))
)]
pub struct CatalogApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/personalities", get(list_personalities))
        .route("/techniques", get(list_techniques))
}

#[utoipa::path(
    get,
    path = "/personalities",
    tag = "catalog",
    responses(
        (status = 200, description = "Available personalities", body = Vec<PersonalityInfo>)
    )
)]
pub async fn list_personalities(State(state): State<Arc<AppState>>) -> Json<Vec<PersonalityInfo>> {
    Json(
        state
            .engine
            .catalog()
            .personalities()
            .iter()
            .map(PersonalityInfo::from)
            .collect(),
    )
}

#[utoipa::path(
    get,
    path = "/techniques",
    tag = "catalog",
    responses(
        (status = 200, description = "Available prompt techniques", body = Vec<TechniqueInfo>)
    )
)]
pub async fn list_techniques(State(state): State<Arc<AppState>>) -> Json<Vec<TechniqueInfo>> {
    Json(
        state
            .engine
            .catalog()
            .techniques()
            .iter()
            .map(TechniqueInfo::from)
            .collect(),
    )
}
