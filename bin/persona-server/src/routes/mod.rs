//! Axum router construction.
//!
//! [`build`] assembles the complete application router:
//! - middleware layers (gzip, CORS, per-request trace id)
//! - the OpenAPI document, with optional Swagger UI
//! - API index, health, metrics, benchmark, catalog, session and chat routes
//! - the embedded dashboard page

mod benchmark;
mod catalog;
mod chat;
mod dashboard;
pub mod doc;
mod health;
mod metrics;
mod root;
mod sessions;

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::compression::CompressionLayer;

use crate::middleware::{cors, trace};
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .merge(root::router())
        .merge(benchmark::router())
        .merge(health::router())
        .merge(metrics::router())
        .merge(catalog::router())
        .merge(sessions::router())
        .merge(chat::router())
        .merge(dashboard::router());

    let app = doc::mount(api_router, state.config.enable_swagger);

    app
        // Outermost layers execute first on the way in.
        .layer(CompressionLayer::new())
        .layer(cors::cors_layer(&state))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        build(Arc::new(AppState::build(Config::default())))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(v) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn response_carries_trace_id() {
        let res = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(res.headers().contains_key(trace::X_TRACE_ID));
    }

    #[tokio::test]
    async fn index_lists_personalities_and_endpoints() {
        let (status, body) = send(&app(), Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["personalities"].as_array().unwrap().len(), 5);
        assert_eq!(body["techniques"].as_array().unwrap().len(), 7);
        assert!(body["endpoints"]
            .as_array()
            .unwrap()
            .iter()
            .any(|e| e == "POST /chat"));
        assert!(body["endpoints"]
            .as_array()
            .unwrap()
            .iter()
            .any(|e| e == "GET /benchmark"));
    }

    #[tokio::test]
    async fn personalities_expose_capabilities() {
        let (status, body) = send(&app(), Method::GET, "/personalities", None).await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 5);
        let tech = list.iter().find(|p| p["id"] == "technical_expert").unwrap();
        assert!(tech["capabilities"]
            .as_array()
            .unwrap()
            .iter()
            .any(|k| k == "memory"));
    }

    #[tokio::test]
    async fn chat_without_session_creates_one() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/chat",
            Some(json!({
                "message": "my app has a memory leak",
                "personality": "technical_expert",
                "technique": "chain_of_thought"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["personality"], "technical_expert");
        assert_eq!(body["technique"], "chain_of_thought");
        assert_eq!(body["source"]["kind"], "keyword");
        let session_id = body["session_id"].as_str().unwrap().to_owned();

        let (_, sessions) = send(&app, Method::GET, "/sessions", None).await;
        assert_eq!(sessions["total"], 1);
        assert_eq!(sessions["sessions"][0]["session_id"], session_id);
        assert_eq!(sessions["sessions"][0]["message_count"], 2);
    }

    #[tokio::test]
    async fn chat_continues_existing_session_with_its_personality() {
        let app = app();
        let (status, created) = send(
            &app,
            Method::POST,
            "/sessions",
            Some(json!({"personality": "business_advisor"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = created["session_id"].as_str().unwrap();

        let (status, body) = send(
            &app,
            Method::POST,
            "/chat",
            Some(json!({"message": "pricing ideas?", "session_id": id, "personality": "learning_tutor"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session_id"], id);
        assert_eq!(body["personality"], "business_advisor");
    }

    #[tokio::test]
    async fn chat_with_unknown_session_is_404() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/chat",
            Some(json!({"message": "hello", "session_id": "session_1_00000000"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Session session_1_00000000 not found");

        // Caller errors are not tracked as failed requests.
        let (_, metrics) = send(&app, Method::GET, "/metrics", None).await;
        assert_eq!(metrics["total_requests"], 0);
        assert_eq!(metrics["error_count"], 0);
        assert_eq!(metrics["error_rate"], 0.0);
    }

    #[tokio::test]
    async fn invalid_bodies_are_422() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/chat",
            Some(json!({"message": "hi", "technique": "telepathy"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().is_some());

        let (status, _) = send(&app, Method::POST, "/chat", Some(json!({"message": ""}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(
            &app,
            Method::POST,
            "/sessions",
            Some(json!({"personality": "pirate"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let res = app
            .clone()
            .oneshot(
                Request::post("/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn session_config_is_echoed_and_validated() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/sessions",
            Some(json!({"personality": "creative_partner", "config": {"temperature": 0.3}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["config"]["temperature"], 0.3);

        let (status, _) = send(
            &app,
            Method::POST,
            "/sessions",
            Some(json!({"config": {"temperature": 9.0}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn delete_session_then_404() {
        let app = app();
        let (_, created) = send(&app, Method::POST, "/sessions", Some(json!({}))).await;
        let id = created["session_id"].as_str().unwrap();
        let uri = format!("/session/{id}");

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], format!("Session {id} deleted successfully"));

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, &format!("{uri}/analysis"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn clear_sessions_reports_count() {
        let app = app();
        for _ in 0..3 {
            send(&app, Method::POST, "/sessions", Some(json!({}))).await;
        }
        let (status, body) = send(&app, Method::DELETE, "/sessions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cleared"], 3);
        assert_eq!(body["message"], "Cleared 3 sessions successfully");

        let (_, metrics) = send(&app, Method::GET, "/metrics", None).await;
        assert_eq!(metrics["active_sessions"], 0);
    }

    #[tokio::test]
    async fn analysis_after_chats() {
        let app = app();
        let (_, first) = send(
            &app,
            Method::POST,
            "/chat",
            Some(json!({"message": "explain recursion", "personality": "learning_tutor", "technique": "socratic"})),
        )
        .await;
        let id = first["session_id"].as_str().unwrap();
        send(
            &app,
            Method::POST,
            "/chat",
            Some(json!({"message": "and loops?", "session_id": id, "technique": "analogical"})),
        )
        .await;

        let (status, body) = send(&app, Method::GET, &format!("/session/{id}/analysis"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["conversation_stats"]["total_messages"], 4);
        assert_eq!(
            body["prompt_engineering"]["techniques_used"],
            json!(["socratic", "analogical"])
        );
    }

    #[tokio::test]
    async fn compare_returns_every_personality_and_leaves_no_sessions() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/chat/compare",
            Some(json!({"message": "how do I start?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r["response"].is_string()));

        let (_, sessions) = send(&app, Method::GET, "/sessions", None).await;
        assert_eq!(sessions["total"], 0);
    }

    #[tokio::test]
    async fn metrics_reflect_chat_traffic() {
        let app = app();
        send(
            &app,
            Method::POST,
            "/chat",
            Some(json!({"message": "hello there", "personality": "helpful_assistant"})),
        )
        .await;
        let (status, body) = send(&app, Method::GET, "/metrics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_requests"], 1);
        assert_eq!(body["error_rate"], 0.0);
        assert_eq!(body["active_sessions"], 1);
        assert_eq!(body["sessions_by_personality"]["helpful_assistant"], 1);
        assert_eq!(body["model_status"]["state"], "disabled");
        assert_eq!(body["recent_response_times"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn demo_creates_a_session() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/demo/test", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["test_response"].as_str().unwrap().ends_with("..."));
        let (_, sessions) = send(&app, Method::GET, "/sessions", None).await;
        assert_eq!(sessions["total"], 1);
    }

    #[tokio::test]
    async fn benchmark_runs_five_cases_on_a_throwaway_session() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/benchmark", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["test_count"], 5);
        let results = body["detailed_results"].as_array().unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results[0]["message"], "Hello, how are you?");
        assert_eq!(results[4]["technique"], "role_playing");
        assert!(results.iter().all(|r| r["response_length"].as_u64().unwrap() > 0));
        assert!(body["average_response_time"].as_f64().is_some());
        assert!(body["system_info"]["memory_gb"].as_f64().is_some());
        assert!(body["system_info"]["platform"].as_str().is_some());

        let (_, sessions) = send(&app, Method::GET, "/sessions", None).await;
        assert_eq!(sessions["total"], 0);
        let (_, metrics) = send(&app, Method::GET, "/metrics", None).await;
        assert_eq!(metrics["total_requests"], 0);
    }

    #[tokio::test]
    async fn model_enabled_chat_answers_while_the_model_loads() {
        let state = AppState::build(Config {
            model_enabled: true,
            ..Config::default()
        });
        let app = build(Arc::new(state));
        let (status, body) = send(
            &app,
            Method::POST,
            "/chat",
            Some(json!({"message": "my app has a memory leak"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"]["kind"], "keyword");

        let (_, metrics) = send(&app, Method::GET, "/metrics", None).await;
        assert_ne!(metrics["model_status"]["state"], "disabled");
        assert_ne!(metrics["model_status"]["state"], "not_loaded");
    }

    #[tokio::test]
    async fn chat_accepts_role_playing() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/chat",
            Some(json!({"message": "help me plan", "technique": "role_playing"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["technique"], "role_playing");
        assert!(body["response"]
            .as_str()
            .unwrap()
            .starts_with("Speaking from the perspective of an expert"));
    }

    #[tokio::test]
    async fn dashboard_is_html() {
        let res = app()
            .oneshot(Request::get("/dashboard").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let content_type = res.headers()[header::CONTENT_TYPE].to_str().unwrap().to_owned();
        assert!(content_type.starts_with("text/html"));
    }

    #[tokio::test]
    async fn openapi_document_lists_chat() {
        let (status, body) = send(&app(), Method::GET, doc::OPENAPI_PATH, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/chat"].is_object());
        assert!(body["paths"]["/session/{id}/analysis"].is_object());
        assert!(body["paths"]["/benchmark"].is_object());
    }
}
