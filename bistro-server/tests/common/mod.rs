//! Shared harness: the real router over an in-memory store

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use bistro_server::db::{CatalogStore, MemoryStore};
use bistro_server::{AppState, Config, build_router};
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use shared::models::{MenuItemDraft, RegisterRequest, UserType};
use tower::ServiceExt;

pub const PASSWORD: &str = "kitchen-pass-123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(Config::for_testing()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::with_store(&config, store.clone());
        let router = build_router(state.clone());
        Self {
            router,
            state,
            store,
        }
    }

    /// Register an account directly through the service layer
    pub async fn create_user(&self, email: &str, user_type: UserType) {
        self.state
            .users
            .register(RegisterRequest {
                email: Some(email.to_string()),
                password: Some(PASSWORD.to_string()),
                user_type: Some(user_type),
                first_name: Some("Test".to_string()),
            })
            .await
            .unwrap();
    }

    /// Create an account and log it in through the API
    pub async fn token_for(&self, email: &str, user_type: UserType) -> String {
        self.create_user(email, user_type).await;
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["auth_token"].as_str().unwrap().to_string()
    }

    pub async fn kitchen_token(&self) -> String {
        self.token_for("kitchen@bistro.test", UserType::Kitchen).await
    }

    pub async fn admin_token(&self) -> String {
        self.token_for("admin@bistro.test", UserType::Admin).await
    }

    /// Seed a category with priced items; returns the item ids in order
    pub async fn seed_menu(&self, prices: &[&str]) -> Vec<i64> {
        let category = self.store.create_category("Mains").await.unwrap();
        let mut ids = Vec::new();
        for (i, price) in prices.iter().enumerate() {
            let item = self
                .store
                .create_item(&MenuItemDraft {
                    name: format!("Dish {i}"),
                    price: price.parse::<Decimal>().unwrap(),
                    is_available: true,
                    category_id: category.id,
                    description: None,
                    image: None,
                })
                .await
                .unwrap();
            ids.push(item.id);
        }
        ids
    }

    /// Send a request through the router, returning status and JSON body
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn create_order(&self, items: &[i64]) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/orders/create",
            None,
            Some(serde_json::json!({ "items": items })),
        )
        .await
    }
}
