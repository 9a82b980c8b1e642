use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use research_flow::ConversationTurn;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::agent::ResearchAgent;
use crate::models::ResearchResult;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;

fn bad_request_error(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    #[serde(default)]
    pub query: Option<String>,
}

pub fn router(agent: Arc<ResearchAgent>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/research", post(research))
        .route("/api/reset", post(reset))
        .route("/api/history", get(history))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(agent)
}

pub async fn serve(agent: Arc<ResearchAgent>, port: u16) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    let addr = listener.local_addr()?;
    info!("Research service listening on {}", addr);
    info!("Research endpoint: POST http://{}/api/research", addr);

    axum::serve(listener, router(agent)).await?;
    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn research(
    State(agent): State<Arc<ResearchAgent>>,
    Json(request): Json<ResearchRequest>,
) -> ApiResult<ResearchResult> {
    let query = request
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| bad_request_error("No query provided"))?;

    info!(query = %query, "research request");
    Ok(Json(agent.research(query).await))
}

async fn reset(State(agent): State<Arc<ResearchAgent>>) -> Json<Value> {
    agent.reset().await;
    Json(json!({ "status": "success", "message": "Research session reset" }))
}

async fn history(State(agent): State<Arc<ResearchAgent>>) -> Json<Vec<ConversationTurn>> {
    Json(agent.history().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgentConfig, ExtractionConfig};
    use crate::extract::ContentExtractor;
    use crate::search::RetrievalBroker;
    use crate::testing::{ScriptedModel, StaticFetcher, StaticSearch};
    use crate::workflow::ResearchComponents;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        let config = AgentConfig::from_lookup(|_| None);
        let components = ResearchComponents::assemble(
            ScriptedModel::replying("{}"),
            RetrievalBroker::new(Box::new(StaticSearch::new())),
            ContentExtractor::new(Arc::new(StaticFetcher::new()), &ExtractionConfig::default()),
            &config,
        );
        router(Arc::new(ResearchAgent::new(components, 5)))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn blank_query_is_rejected() {
        for body in [json!({}), json!({ "query": "   " })] {
            let response = app().oneshot(post_json("/api/research", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(response).await["error"], "No query provided");
        }
    }

    #[tokio::test]
    async fn research_then_history_then_reset() {
        let app = app();

        let response = app
            .clone()
            .oneshot(post_json("/api/research", json!({ "query": "obscure topic" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let result = json_body(response).await;
        assert_eq!(result["success"], false);
        assert_eq!(result["error_kind"], "no_results");

        let history = |app: Router| async move {
            let response = app
                .oneshot(Request::builder().uri("/api/history").body(Body::empty()).unwrap())
                .await
                .unwrap();
            json_body(response).await
        };
        let turns = history(app.clone()).await;
        assert_eq!(turns.as_array().map(Vec::len), Some(2));
        assert_eq!(turns[0]["role"], "user");
        assert_eq!(turns[0]["content"], "obscure topic");

        let response = app
            .clone()
            .oneshot(post_json("/api/reset", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(history(app).await.as_array().map(Vec::len), Some(0));
    }
}
