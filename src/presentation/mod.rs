// Presentation layer - HTTP routes over the layout engine
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::*;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    // Compression is handled in the response builders, so no CompressionLayer.
    Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboards", get(list_dashboards))
        .route("/dashboards/:id", get(get_dashboard))
        .route("/dashboards/:id/diagnostics", get(get_diagnostics))
        .route("/dashboards/:id/events", get(stream_events))
        .route("/dashboards/:id/panels", post(add_panel))
        .route("/dashboards/:id/panels/:panel", delete(remove_panel))
        .route("/dashboards/:id/panels/:panel/duplicate", post(duplicate_panel))
        .route("/dashboards/:id/selection", post(select_panel))
        .route("/dashboards/:id/reset", post(reset_layout))
        .route("/dashboards/:id/auto-arrange", post(auto_arrange))
        .route("/dashboards/:id/breakpoints/:key", put(set_breakpoint_layout))
        .route("/dashboards/:id/viewport", post(set_viewport))
        .route("/dashboards/:id/drag/start", post(drag_start))
        .route("/dashboards/:id/drag/move", post(drag_move))
        .route("/dashboards/:id/drag/end", post(drag_end))
        .route("/dashboards/:id/drag/cancel", post(drag_cancel))
        .route("/dashboards/:id/resize/start", post(resize_start))
        .route("/dashboards/:id/resize/move", post(resize_move))
        .route("/dashboards/:id/resize/end", post(resize_end))
        .route("/dashboards/:id/resize/cancel", post(resize_cancel))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_service::DashboardService;
    use crate::application::layout_manager::LayoutOptions;
    use crate::infrastructure::memory_repository::InMemoryRepository;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let service = DashboardService::new(
            Arc::new(InMemoryRepository::new()),
            LayoutOptions::default(),
            1280.0,
        );
        router(Arc::new(AppState {
            dashboard_service: service,
        }))
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn add(w: u32, h: u32) -> Option<Value> {
        Some(json!({ "kind": "bar", "title": "Panel", "w": w, "h": h }))
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = app();
        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_dashboard_is_not_found() {
        let app = app();
        let (status, _) = call(&app, Method::GET, "/dashboards/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, Method::GET, "/dashboards/bad.id", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_add_panels_and_fetch_document() {
        let app = app();
        for _ in 0..3 {
            let (status, _) = call(&app, Method::POST, "/dashboards/main/panels", add(4, 2)).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, document) = call(&app, Method::GET, "/dashboards/main", None).await;
        assert_eq!(status, StatusCode::OK);
        let xs: Vec<i64> = document["panels"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["position"]["x"].as_i64().unwrap())
            .collect();
        assert_eq!(xs, vec![0, 4, 8]);

        let (_, ids) = call(&app, Method::GET, "/dashboards", None).await;
        assert_eq!(ids, json!(["main"]));
    }

    #[tokio::test]
    async fn test_drag_round_trip() {
        let app = app();
        call(&app, Method::POST, "/dashboards/d/panels", add(4, 2)).await;

        let start = json!({ "panelId": "panel-1", "x": 20.0, "y": 20.0 });
        let (_, started) = call(&app, Method::POST, "/dashboards/d/drag/start", Some(start)).await;
        assert_eq!(started["started"], true);

        // a second gesture is refused while the first runs
        let resize = json!({ "panelId": "panel-1", "handle": "se", "x": 0.0, "y": 0.0 });
        let (_, refused) =
            call(&app, Method::POST, "/dashboards/d/resize/start", Some(resize)).await;
        assert_eq!(refused["started"], false);

        // 104px columns at 1280px on lg
        let pointer = json!({ "x": 20.0 + 2.0 * 104.0, "y": 20.0 });
        let (_, moved) = call(&app, Method::POST, "/dashboards/d/drag/move", Some(pointer)).await;
        assert_eq!(moved["rect"]["x"], 2);

        let (_, ended) = call(&app, Method::POST, "/dashboards/d/drag/end", None).await;
        assert_eq!(ended["outcome"], "committed");
        assert_eq!(ended["rect"], json!({ "x": 2, "y": 0, "w": 4, "h": 2 }));

        let (_, idle) = call(&app, Method::POST, "/dashboards/d/drag/end", None).await;
        assert_eq!(idle["outcome"], "idle");
    }

    #[tokio::test]
    async fn test_unknown_panel_and_breakpoint() {
        let app = app();
        call(&app, Method::POST, "/dashboards/d/panels", add(4, 2)).await;

        let (status, _) = call(&app, Method::DELETE, "/dashboards/d/panels/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let profile = json!({ "columns": 6, "rowHeight": 60, "margin": 10, "padding": 10 });
        let (status, _) =
            call(&app, Method::PUT, "/dashboards/d/breakpoints/huge", Some(profile.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, layout) =
            call(&app, Method::PUT, "/dashboards/d/breakpoints/sm", Some(profile)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(layout["type"], "layout:change");
        assert_eq!(layout["breakpoint"], "sm");
    }

    #[tokio::test]
    async fn test_duplicate_and_select() {
        let app = app();
        call(&app, Method::POST, "/dashboards/d/panels", add(4, 2)).await;

        let (status, copy) =
            call(&app, Method::POST, "/dashboards/d/panels/panel-1/duplicate", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(copy["id"], "panel-2");

        let (status, _) = call(
            &app,
            Method::POST,
            "/dashboards/d/selection",
            Some(json!({ "panelId": "panel-2" })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(
            &app,
            Method::POST,
            "/dashboards/d/selection",
            Some(json!({ "panelId": "ghost" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
