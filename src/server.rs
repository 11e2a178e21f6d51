use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::{self, AppState};
use crate::clock::SystemClock;
use crate::completion::HostedCompletion;
use crate::db::{DbHandle, MentivaDb};
use crate::orchestrator::Orchestrator;

/// Configuration for the Mentiva server.
pub struct ServerConfig {
    pub port: u16,
    pub db_path: std::path::PathBuf,
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4280,
            db_path: std::path::PathBuf::from(".mentiva/mentiva.db"),
            dev_mode: false,
        }
    }
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_router().with_state(state)
}

/// Start the server. The completion credential is resolved once here, so
/// a missing key fails startup rather than every generation call.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let db = MentivaDb::new(&config.db_path).context("Failed to initialize database")?;
    let completion = HostedCompletion::from_env()
        .map_err(|e| anyhow::anyhow!(e.to_string()))
        .context("Completion service configuration")?;

    let state = Arc::new(AppState {
        orchestrator: Orchestrator::new(
            DbHandle::new(db),
            Arc::new(completion),
            Arc::new(SystemClock),
        ),
    });

    let mut app = build_router(state);
    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let host = if config.dev_mode { "0.0.0.0" } else { "127.0.0.1" };
    let addr = format!("{}:{}", host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!("Mentiva running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::clock::FixedClock;
    use crate::completion::ScriptedCompletion;

    const TODAY: &str = "2026-08-25"; // a Tuesday

    fn missions_json() -> String {
        r#"{
            "missions": [
                {"task_text": "Test three recipes", "task_type": "non_negotiable", "enfoque_name": "Recipes", "estimated_minutes": 45},
                {"task_text": "Draft an Instagram post", "task_type": "secondary", "enfoque_name": "Marketing", "estimated_minutes": 20},
                {"task_text": "Write down one flavor idea", "task_type": "micro", "enfoque_name": "Recipes", "estimated_minutes": 5}
            ],
            "motivational_pulse": "Small ovens bake big dreams."
        }"#
        .to_string()
    }

    /// Router plus a valid session cookie for a seeded, allow-listed user.
    fn test_router(responses: Vec<String>) -> (Router, String) {
        let db = MentivaDb::new_in_memory().unwrap();
        let user = db.create_user("ana@example.com", None).unwrap();
        db.allow_email("ana@example.com").unwrap();
        let token = db.create_session(user.id).unwrap();

        let state = Arc::new(AppState {
            orchestrator: Orchestrator::new(
                DbHandle::new(db),
                Arc::new(ScriptedCompletion::new(responses)),
                Arc::new(FixedClock(TODAY.parse().unwrap())),
            ),
        });
        (
            build_router(state),
            format!("mentiva_session={}", token),
        )
    }

    fn post(uri: &str, cookie: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, cookie)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str, cookie: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_router(vec![]);
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_session_is_401() {
        let (app, _) = test_router(vec![]);
        let req = Request::builder()
            .method("POST")
            .uri("/generate-missions")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(resp).await["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let (app, cookie) = test_router(vec![missions_json()]);

        // No north star yet: generation is a 400 with the contract message.
        let resp = app
            .clone()
            .oneshot(post("/generate-missions", &cookie, serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "No North Star set");

        // Set the north star.
        let resp = app
            .clone()
            .oneshot(post(
                "/north-star",
                &cookie,
                serde_json::json!({"goalText": "Launch my bakery"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        // Still no enfoques.
        let resp = app
            .clone()
            .oneshot(post("/generate-missions", &cookie, serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // Set two enfoques.
        let resp = app
            .clone()
            .oneshot(post(
                "/enfoques",
                &cookie,
                serde_json::json!({"enfoques": ["Recipes", "Marketing"]}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        // Now generation succeeds with 3 typed missions.
        let resp = app
            .clone()
            .oneshot(post("/generate-missions", &cookie, serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["generated"], true);
        let missions = body["missions"].as_array().unwrap();
        assert_eq!(missions.len(), 3);
        let types: Vec<&str> = missions
            .iter()
            .map(|m| m["task_type"].as_str().unwrap())
            .collect();
        assert_eq!(types, vec!["non_negotiable", "secondary", "micro"]);
        for m in missions {
            let enfoque = m["enfoque_name"].as_str().unwrap();
            assert!(["Recipes", "Marketing"].contains(&enfoque));
        }
        assert_eq!(body["motivational_pulse"], "Small ovens bake big dreams.");
    }

    #[tokio::test]
    async fn test_generation_idempotent_via_http() {
        let (app, cookie) = test_router(vec![missions_json()]);
        seed_plan(&app, &cookie).await;

        let first = json_body(
            app.clone()
                .oneshot(post("/generate-missions", &cookie, serde_json::json!({})))
                .await
                .unwrap(),
        )
        .await;
        let second = json_body(
            app.clone()
                .oneshot(post("/generate-missions", &cookie, serde_json::json!({})))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(first["generated"], true);
        assert_eq!(second["generated"], false);
        assert_eq!(first["missions"], second["missions"]);
    }

    #[tokio::test]
    async fn test_enfoque_cap() {
        let (app, cookie) = test_router(vec![]);
        let resp = app
            .clone()
            .oneshot(post(
                "/enfoques",
                &cookie,
                serde_json::json!({"enfoques": ["a", "b", "c", "d"]}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "Maximum 3 enfoques");

        // Exactly 3 replaces any prior set.
        for names in [vec!["a", "b"], vec!["x", "y", "z"]] {
            let resp = app
                .clone()
                .oneshot(post(
                    "/enfoques",
                    &cookie,
                    serde_json::json!({"enfoques": names}),
                ))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }
        let body = json_body(
            app.clone().oneshot(get("/enfoques", &cookie)).await.unwrap(),
        )
        .await;
        let names: Vec<&str> = body["enfoques"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[tokio::test]
    async fn test_north_star_replace_semantics() {
        let (app, cookie) = test_router(vec![]);
        for goal in ["Goal A", "Goal B"] {
            let resp = app
                .clone()
                .oneshot(post(
                    "/north-star",
                    &cookie,
                    serde_json::json!({"goalText": goal}),
                ))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }
        let body = json_body(
            app.clone().oneshot(get("/north-star", &cookie)).await.unwrap(),
        )
        .await;
        assert_eq!(body["northStar"]["goal_text"], "Goal B");
        assert_eq!(body["northStar"]["is_active"], true);
    }

    #[tokio::test]
    async fn test_north_star_requires_goal_text() {
        let (app, cookie) = test_router(vec![]);
        let resp = app
            .oneshot(post("/north-star", &cookie, serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "goalText is required");
    }

    #[tokio::test]
    async fn test_swap_task_guard_via_http() {
        let (app, cookie) = test_router(vec![missions_json()]);
        seed_plan(&app, &cookie).await;
        let body = json_body(
            app.clone()
                .oneshot(post("/generate-missions", &cookie, serde_json::json!({})))
                .await
                .unwrap(),
        )
        .await;
        let non_negotiable_id = body["missions"][0]["id"].as_i64().unwrap();
        let resp = app
            .clone()
            .oneshot(post(
                "/swap-task",
                &cookie,
                serde_json::json!({"taskId": non_negotiable_id}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .oneshot(post(
                "/swap-task",
                &cookie,
                serde_json::json!({"taskId": 9999}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_weekly_plan_flow() {
        let (app, cookie) = test_router(vec![missions_json()]);
        // North star only; the weekly plan supplies the enfoques itself.
        app.clone()
            .oneshot(post(
                "/north-star",
                &cookie,
                serde_json::json!({"goalText": "Launch my bakery"}),
            ))
            .await
            .unwrap();

        let resp = app
            .clone()
            .oneshot(post(
                "/weekly-plan",
                &cookie,
                serde_json::json!({
                    "focusGoals": ["Recipes", "Marketing"],
                    "context": {"Recipes": "use grandma's notebook"}
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["generated"], true);
        assert_eq!(body["coreCount"], 1);
        assert_eq!(body["bonusCount"], 2);
        assert_eq!(body["tasks"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_weekly_plan_requires_focus_goals() {
        let (app, cookie) = test_router(vec![]);
        let resp = app
            .oneshot(post("/weekly-plan", &cookie, serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "focusGoals is required");
    }

    #[tokio::test]
    async fn test_toggle_updates_streak() {
        let (app, cookie) = test_router(vec![missions_json()]);
        seed_plan(&app, &cookie).await;
        let body = json_body(
            app.clone()
                .oneshot(post("/generate-missions", &cookie, serde_json::json!({})))
                .await
                .unwrap(),
        )
        .await;
        let id = body["missions"][0]["id"].as_i64().unwrap();

        let body = json_body(
            app.clone()
                .oneshot(post(
                    &format!("/tasks/{}/toggle", id),
                    &cookie,
                    serde_json::json!({}),
                ))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["task"]["completed"], true);
        assert_eq!(body["streak"], 1);

        let body = json_body(app.clone().oneshot(get("/streak", &cookie)).await.unwrap()).await;
        assert_eq!(body["streak"], 1);
    }

    #[tokio::test]
    async fn test_parse_failure_is_500() {
        let (app, cookie) = test_router(vec!["garbage".into(), "still garbage".into()]);
        seed_plan(&app, &cookie).await;
        let resp = app
            .oneshot(post("/generate-missions", &cookie, serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(resp).await;
        assert!(body["error"].as_str().unwrap().contains("unusable"));
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 4280);
        assert_eq!(
            config.db_path,
            std::path::PathBuf::from(".mentiva/mentiva.db")
        );
        assert!(!config.dev_mode);
    }

    async fn seed_plan(app: &Router, cookie: &str) {
        app.clone()
            .oneshot(post(
                "/north-star",
                cookie,
                serde_json::json!({"goalText": "Launch my bakery"}),
            ))
            .await
            .unwrap();
        app.clone()
            .oneshot(post(
                "/enfoques",
                cookie,
                serde_json::json!({"enfoques": ["Recipes", "Marketing"]}),
            ))
            .await
            .unwrap();
    }
}
