use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::routes::{benchmark, catalog, chat, health, metrics, root, sessions};
use crate::state::AppState;

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(info(
    title = "persona-server",
    description = "Personality chat API with prompt techniques and session analytics",
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.merge(root::RootApi::openapi());
    doc.merge(health::HealthApi::openapi());
    doc.merge(metrics::MetricsApi::openapi());
    doc.merge(catalog::CatalogApi::openapi());
    doc.merge(sessions::SessionApi::openapi());
    doc.merge(chat::ChatApi::openapi());
    doc.merge(benchmark::BenchmarkApi::openapi());
    doc
}

/// Serve the OpenAPI document, plus Swagger UI when compiled in and enabled.
pub fn mount(app: Router<Arc<AppState>>, enable_swagger: bool) -> Router<Arc<AppState>> {
    #[cfg(feature = "swagger-ui")]
    if enable_swagger {
        return app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, get_docs()),
        );
    }
    #[cfg(not(feature = "swagger-ui"))]
    if enable_swagger {
        tracing::debug!("built without the `swagger-ui` feature; serving the OpenAPI JSON only");
    }
    app.route(OPENAPI_PATH, get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(get_docs())
}
