#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use curenet::AppState;
use serde_json::Value;
use tower::ServiceExt;

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::fake();
        let router = curenet::build_app(state.clone());
        Self { state, router }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = req
            .body(match body {
                Some(b) => Body::from(serde_json::to_vec(&b).unwrap()),
                None => Body::empty(),
            })
            .unwrap();

        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let location = res
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply {
            status,
            location,
            json,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Reply {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Reply {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Reply {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    /// Registers through the API and returns the session token.
    pub async fn register(&self, username: &str, role: &str) -> String {
        let reply = self
            .post(
                "/register",
                None,
                serde_json::json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password1": "correct-horse",
                    "password2": "correct-horse",
                    "role": role,
                }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER, "{:?}", reply.json);
        reply.token().expect("registration opens a session")
    }

    pub async fn login(&self, username: &str, password: &str) -> Reply {
        self.post(
            "/login",
            None,
            serde_json::json!({ "username": username, "password": password }),
        )
        .await
    }
}

#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub location: Option<String>,
    pub json: Value,
}

impl Reply {
    pub fn token(&self) -> Option<String> {
        self.json["access_token"].as_str().map(str::to_string)
    }

    pub fn flash_message(&self) -> Option<&str> {
        self.json["flash"]["message"].as_str()
    }

    pub fn redirected_to(&self, path: &str) -> bool {
        self.status == StatusCode::SEE_OTHER && self.location.as_deref() == Some(path)
    }
}
