#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use reqwest::Url;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use roost_api::contact::ContactRelay;
use roost_api::geocode::Geocoder;
use roost_api::mailer::{MailTransport, OutgoingMail};
use roost_api::probe::UrlProbe;
use roost_api::uploads::ImageStore;
use roost_api::{AppState, AppStateInner};
use roost_db::Database;
use roost_types::models::Coordinates;

pub const LYON: Coordinates = Coordinates {
    latitude: 45.764,
    longitude: 4.8357,
};

pub struct FixedGeocoder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode(&self, _query: &str) -> anyhow::Result<Option<Coordinates>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(LYON))
    }
}

/// Reachable only for hosts ending in `.ok`.
pub struct HostProbe;

#[async_trait]
impl UrlProbe for HostProbe {
    async fn is_reachable(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|h| h.ends_with(".ok"))
    }
}

#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }

    async fn verify(&self) -> anyhow::Result<bool> {
        Ok(true)
    }
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub geocoder: Arc<FixedGeocoder>,
    pub transport: Arc<RecordingTransport>,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("roost_api_test_{}", Uuid::new_v4()));
        let geocoder = Arc::new(FixedGeocoder {
            calls: AtomicUsize::new(0),
        });
        let transport = Arc::new(RecordingTransport::default());

        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".into(),
            images: ImageStore::new(dir).await.unwrap(),
            geocoder: geocoder.clone(),
            probe: Arc::new(HostProbe),
            contact: Arc::new(ContactRelay::new(transport.clone(), "contact@roost.test")),
        });

        Self {
            router: roost_api::routes::router(state.clone()),
            state,
            geocoder,
            transport,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        (status, body)
    }

    pub async fn json(&self, method: &str, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(req.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.bare("GET", uri, token).await
    }

    pub async fn bare(&self, method: &str, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    pub async fn multipart(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        data: Option<Value>,
        images: &[(&str, &[u8])],
    ) -> (StatusCode, Value) {
        const BOUNDARY: &str = "roost-test-boundary";
        let mut body: Vec<u8> = Vec::new();
        if let Some(data) = data {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"data\"\r\n\r\n{}\r\n",
                    data
                )
                .as_bytes(),
            );
        }
        for (file_name, bytes) in images {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }

    /// Sign up and sign in; returns (user id, token).
    pub async fn register(&self, username: &str) -> (String, String) {
        let (status, _) = self
            .json(
                "POST",
                "/auth/signup",
                None,
                serde_json::json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "correct horse",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .json(
                "POST",
                "/auth/signin",
                None,
                serde_json::json!({ "username": username, "password": "correct horse" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        (
            body["userId"].as_str().unwrap().to_string(),
            body["access_token"].as_str().unwrap().to_string(),
        )
    }

    /// Publish a listing in Lyon at `price`; returns its id.
    pub async fn publish(&self, token: &str, price: f64) -> String {
        let (status, body) = self
            .multipart(
                "POST",
                "/item",
                token,
                Some(serde_json::json!({
                    "title": "Bright flat",
                    "price": price,
                    "address": "12 quai Saint-Antoine",
                    "city": "Lyon",
                    "country": "France",
                    "rooms": 3,
                })),
                &[],
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }
}
