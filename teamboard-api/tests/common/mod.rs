/// Common test utilities for the HTTP tests
///
/// Builds the real router over an in-memory store, seeds three users and
/// issues access tokens for them. No database required.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use teamboard_api::app::{build_router, AppState};
use teamboard_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, MembershipConfig};
use teamboard_shared::auth::jwt::{create_token, Claims, TokenType};
use teamboard_shared::models::user::{CreateUser, User};
use teamboard_shared::store::InMemoryMembershipStore;
use tower::Service as _;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
        membership: MembershipConfig {
            max_owned_projects: 5,
            invitation_ttl_hours: None,
        },
    }
}

/// Test context: router, backing store and three registered users
pub struct TestContext {
    pub store: InMemoryMembershipStore,
    pub app: axum::Router,
    pub alice: User,
    pub bob: User,
    pub carol: User,
}

impl TestContext {
    pub fn new() -> anyhow::Result<Self> {
        let store = InMemoryMembershipStore::new();

        let alice = store.insert_user(CreateUser::local("alice@example.com", "Alice"))?;
        let bob = store.insert_user(CreateUser::local("bob@example.com", "Bob"))?;
        let carol = store.insert_user(CreateUser::local("carol@example.com", "Carol"))?;

        let state = AppState::new(Arc::new(store.clone()), test_config());
        let app = build_router(state);

        Ok(Self {
            store,
            app,
            alice,
            bob,
            carol,
        })
    }

    /// Bearer header value for `user`
    pub fn auth_header(&self, user: &User) -> String {
        let claims = Claims::new(user.id, TokenType::Access);
        let token = create_token(&claims, TEST_SECRET).expect("token");
        format!("Bearer {}", token)
    }

    /// Sends a request, returning the status and the JSON body (`Null` when empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        as_user: Option<&User>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = as_user {
            builder = builder.header(header::AUTHORIZATION, self.auth_header(user));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Creates a project as `owner` and returns its id
    pub async fn create_project(&self, owner: &User, name: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/v1/projects",
                Some(owner),
                Some(serde_json::json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project: {body}");
        body["id"].as_str().expect("project id").to_string()
    }

    /// Invites `email` into `project_id` as `owner` and returns the invitation id
    pub async fn invite(&self, owner: &User, project_id: &str, email: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                &format!("/v1/projects/{project_id}/invitations"),
                Some(owner),
                Some(serde_json::json!({ "email": email })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "invite: {body}");
        body["invitationId"].as_str().expect("invitation id").to_string()
    }
}
