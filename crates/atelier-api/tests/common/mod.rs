#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use atelier_api::storage::ImageStore;
use atelier_api::{AppStateInner, router};
use atelier_db::Database;

pub struct TestApp {
    pub router: Router,
    pub storage_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.storage_dir);
    }
}

pub struct User {
    pub id: String,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let storage_dir =
            std::env::temp_dir().join(format!("atelier-test-{}", uuid::Uuid::new_v4()));
        let state = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".into(),
            images: ImageStore::new(storage_dir.clone()).await.unwrap(),
            public_base_url: "http://cdn.test".into(),
            max_upload_bytes: 1024,
        });
        Self {
            router: router(state),
            storage_dir,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn signup(&self, name: &str, role: &str) -> User {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({
                    "email": format!("{name}@example.com"),
                    "password": "correct horse battery",
                    "role": role,
                    "display_name": name,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        User {
            id: body["user_id"].as_str().unwrap().to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn post_work(&self, creator: &User, public: bool) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/works",
                Some(&creator.token),
                Some(json!({
                    "title": "Harbour at dusk",
                    "tags": ["Film", "portrait"],
                    "is_public": public,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn open_request(&self, client: &User, creator: &User, work_id: Option<&str>) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/requests",
                Some(&client.token),
                Some(json!({
                    "creator_id": creator.id,
                    "work_id": work_id,
                    "title": "Photo shoot",
                    "message": "Available Saturday?",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["request"]["id"].as_str().unwrap().to_string()
    }
}
