pub mod health;

use axum::{
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::analysis::handlers;
use crate::state::AppState;

/// Browser clients call the analyzer directly, so any origin is accepted.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/analyze-resume", post(handlers::handle_analyze))
        .route("/api/v1/resume-scores", get(handlers::handle_history))
        .layer(cors_layer())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::analysis::reference::DocumentReference;
    use crate::analysis::result::AnalysisResult;
    use crate::analysis::testing::{analyzer, CountingFetcher, FixedScorer, MemoryStore};
    use crate::analysis::ResultStore;
    use crate::extraction::fixtures;

    fn app(store: Option<Arc<MemoryStore>>) -> Router {
        let fetcher = CountingFetcher::new(fixtures::pdf_with_pages(&[
            "Software Engineer with 5 years experience",
        ]));
        let mut analyzer = analyzer(fetcher, FixedScorer::new(82, "Solid keyword coverage."));
        let store: Option<Arc<dyn ResultStore>> = store.map(|s| s as Arc<dyn ResultStore>);
        if let Some(store) = &store {
            analyzer = analyzer.with_store(store.clone());
        }
        build_router(AppState {
            analyzer: Arc::new(analyzer),
            store,
        })
    }

    fn analyze_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/analyze-resume")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(None)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_preflight_allows_any_origin_with_empty_body() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/v1/analyze-resume")
            .header("origin", "https://app.example.com")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "authorization,x-client-info,apikey,content-type")
            .body(Body::empty())
            .unwrap();

        let response = app(None).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
        let allowed = response.headers()["access-control-allow-headers"]
            .to_str()
            .unwrap()
            .to_string();
        for name in ["authorization", "x-client-info", "apikey", "content-type"] {
            assert!(allowed.contains(name), "{name} not in {allowed}");
        }
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_returns_score() {
        let response = app(None)
            .oneshot(analyze_request(r#"{"file_url":"user123/1700000000000.pdf"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ats_score"], 82);
        assert_eq!(body["feedback"], "Solid keyword coverage.");
        assert_eq!(body["persisted"], false);
    }

    #[tokio::test]
    async fn test_analyze_persists_when_store_attached() {
        let store = MemoryStore::new();
        let response = app(Some(store.clone()))
            .oneshot(analyze_request(r#"{"file_url":"user123/1700000000000.pdf"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["persisted"], true);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_format_is_415() {
        let response = app(None)
            .oneshot(analyze_request(r#"{"file_url":"user123/resume.txt"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("txt"));
    }

    #[tokio::test]
    async fn test_missing_file_url_is_400() {
        for body in [r#"{}"#, r#"{"file_url":"   "}"#, "not json"] {
            let response = app(None).oneshot(analyze_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert!(json_body(response).await["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for (minutes_ago, score) in [(30, 40u8), (5, 75), (15, 60)] {
            store
                .append(&AnalysisResult {
                    ats_score: Some(score),
                    feedback: None,
                    owner_id: "user123".to_string(),
                    document_ref: DocumentReference::parse(&format!("user123/{minutes_ago}.pdf"))
                        .unwrap(),
                    created_at: now - Duration::minutes(minutes_ago),
                })
                .await
                .unwrap();
        }

        let response = app(Some(store))
            .oneshot(
                Request::get("/api/v1/resume-scores?user_id=user123&limit=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let scores: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["ats_score"].as_i64().unwrap())
            .collect();
        assert_eq!(scores, vec![75, 60]);
    }

    #[tokio::test]
    async fn test_history_without_user_id_is_json_400() {
        let response = app(Some(MemoryStore::new()))
            .oneshot(
                Request::get("/api/v1/resume-scores?limit=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["error"].as_str().unwrap().contains("user_id"));
    }

    #[tokio::test]
    async fn test_history_without_store_is_501() {
        let response = app(None)
            .oneshot(
                Request::get("/api/v1/resume-scores?user_id=user123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }
}
