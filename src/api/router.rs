//! HTTP router.
//!
//! Routes keep the paths the browser UI already calls. The list/create
//! endpoints answer with and without the trailing slash.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the API router with CORS restricted to `allowed_origin`.
pub fn api_router(ctx: ApiContext, allowed_origin: &str) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/manage-file/", post(endpoints::files::manage))
        .route("/manage-file", post(endpoints::files::manage))
        .route("/save-folder/", post(endpoints::folders::create))
        .route("/save-folder", post(endpoints::folders::create))
        .route("/get-folders/", get(endpoints::folders::list))
        .route("/get-folders", get(endpoints::folders::list))
        .route("/get/:id", get(endpoints::folders::detail))
        .route("/edit/:id", put(endpoints::folders::update))
        .route("/delete/:id", delete(endpoints::folders::remove))
        .with_state(ctx)
        .layer(cors_layer(allowed_origin))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let origin = match HeaderValue::from_str(allowed_origin) {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            tracing::warn!(origin = allowed_origin, "Invalid CORS origin; cross-origin requests disabled");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::db::{open_memory_database, SqliteRegistry};
    use crate::pipeline::classification::MockOracle;
    use crate::pipeline::extraction::ContentExtractor;
    use crate::pipeline::routing::Router as FileRouter;
    use crate::pipeline::ClassificationPipeline;

    const ORIGIN: &str = "http://localhost:5173";

    struct TestApp {
        app: Router,
        root: PathBuf,
        _dir: tempfile::TempDir,
    }

    fn test_app(answer: &str) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        std::fs::create_dir(root.join("inbox")).unwrap();

        let registry = SqliteRegistry::new(Arc::new(Mutex::new(open_memory_database().unwrap())));
        let pipeline = ClassificationPipeline::new(
            ContentExtractor::new(),
            Arc::new(registry.clone()),
            Box::new(MockOracle::new(answer)),
            FileRouter::new(root.join("na")),
        );
        let app = api_router(ApiContext::new(pipeline, registry), ORIGIN);
        TestApp {
            app,
            root,
            _dir: dir,
        }
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 65536).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn folder_body(name: &str, path: &std::path::Path, reqs: &[&str]) -> Value {
        json!({
            "folder_name": name,
            "folder_path": path,
            "requirements": reqs.iter().map(|d| json!({"description": d})).collect::<Vec<_>>(),
        })
    }

    fn inbox_file(t: &TestApp, name: &str, content: &str) -> Value {
        let path = t.root.join("inbox").join(name);
        std::fs::write(&path, content).unwrap();
        json!({
            "uuid": uuid::Uuid::new_v4().to_string(),
            "name": name,
            "path": path,
        })
    }

    #[tokio::test]
    async fn health_reports_destination_count() {
        let t = test_app(r#"{"folder_id": "none"}"#);
        let (status, json) = send(&t.app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["name"], crate::config::APP_NAME);
        assert_eq!(json["destinations"], 0);
        assert_eq!(json["version"], crate::config::APP_VERSION);
    }

    #[tokio::test]
    async fn folder_crud_round() {
        let t = test_app(r#"{"folder_id": "none"}"#);
        let invoices = t.root.join("invoices");

        let (status, created) = send(
            &t.app,
            Method::POST,
            "/save-folder/",
            Some(folder_body("Invoices", &invoices, &["Must contain 'Invoice'"])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["requirements"][0]["description"], "Must contain 'Invoice'");

        let (status, all) = send(&t.app, Method::GET, "/get-folders", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all.as_array().unwrap().len(), 1);

        let (status, edited) = send(
            &t.app,
            Method::PUT,
            &format!("/edit/{id}"),
            Some(folder_body("Bills", &invoices, &["Must contain 'Bill'", "Must be a PDF"])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["folder_name"], "Bills");
        assert_eq!(edited["requirements"].as_array().unwrap().len(), 2);

        let (status, one) = send(&t.app, Method::GET, &format!("/get/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["requirements"][1]["description"], "Must be a PDF");

        let (status, _) = send(&t.app, Method::DELETE, &format!("/delete/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, json) = send(&t.app, Method::GET, &format!("/get/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");

        let (status, _) = send(&t.app, Method::DELETE, &format!("/delete/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_or_relative_path_rejected() {
        let t = test_app(r#"{"folder_id": "none"}"#);
        let invoices = t.root.join("invoices");
        let body = folder_body("Invoices", &invoices, &["Must contain 'Invoice'"]);

        let (status, _) = send(&t.app, Method::POST, "/save-folder/", Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let (status, json) = send(&t.app, Method::POST, "/save-folder/", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");

        let relative = folder_body("Rel", std::path::Path::new("relative/dir"), &[]);
        let (status, _) = send(&t.app, Method::POST, "/save-folder/", Some(relative)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn manage_file_routes_to_matching_folder() {
        let t = test_app(r#"{"folder_id": "1"}"#);
        let invoices = t.root.join("invoices");
        send(
            &t.app,
            Method::POST,
            "/save-folder/",
            Some(folder_body("Invoices", &invoices, &["Must contain 'Invoice'"])),
        )
        .await;

        let body = inbox_file(&t, "a.txt", "Invoice 42\nTotal: 10 EUR\n");
        let (status, json) = send(&t.app, Method::POST, "/manage-file/", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "routed");
        assert_eq!(json["destinationId"], 1);
        assert!(invoices.join("a.txt").exists());
        assert!(!t.root.join("inbox/a.txt").exists());
    }

    #[tokio::test]
    async fn manage_file_unmatched_goes_to_fallback() {
        let t = test_app(r#"{"folder_id": "none"}"#);
        send(
            &t.app,
            Method::POST,
            "/save-folder/",
            Some(folder_body("Invoices", &t.root.join("invoices"), &["Must contain 'Invoice'"])),
        )
        .await;

        let body = inbox_file(&t, "notes.txt", "shopping list");
        let (status, json) = send(&t.app, Method::POST, "/manage-file", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "routed-fallback");
        assert!(t.root.join("na/notes.txt").exists());
    }

    #[tokio::test]
    async fn manage_file_malformed_answer_is_422() {
        let t = test_app("I think it is an invoice");
        send(
            &t.app,
            Method::POST,
            "/save-folder/",
            Some(folder_body("Invoices", &t.root.join("invoices"), &["Must contain 'Invoice'"])),
        )
        .await;

        let body = inbox_file(&t, "a.txt", "Invoice");
        let (status, json) = send(&t.app, Method::POST, "/manage-file/", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "malformed_response");
        assert!(t.root.join("inbox/a.txt").exists());
    }

    #[tokio::test]
    async fn manage_file_rejects_bad_uuid() {
        let t = test_app(r#"{"folder_id": "none"}"#);
        let mut body = inbox_file(&t, "a.txt", "x");
        body["uuid"] = json!("not-a-uuid");
        let (status, _) = send(&t.app, Method::POST, "/manage-file/", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let t = test_app(r#"{"folder_id": "none"}"#);
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/get-folders/")
            .header(header::ORIGIN, ORIGIN)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = t.app.clone().oneshot(req).await.unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            ORIGIN
        );
    }
}
