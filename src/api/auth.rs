use async_trait::async_trait;
use reqwest::Method;

use super::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, User};
use crate::session::AuthApi;

impl ApiClient {
    pub async fn current_user(&self) -> ApiResult<User> {
        self.get("/api/auth/me").await
    }
}

#[async_trait(?Send)]
impl AuthApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        self.send_json(Method::POST, "/api/auth/login", request).await
    }

    /// The backend answers with a confirmation message, sometimes as a bare
    /// string and sometimes JSON-quoted
    async fn register(&self, request: &RegisterRequest) -> ApiResult<String> {
        let path = "/api/auth/register";
        let (builder, authed) = self.build(Method::POST, path);
        let response = self.execute(Method::POST, path, builder.json(request), authed).await?;
        let text = response.text().await.map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(confirmation_message(&text))
    }
}

fn confirmation_message(body: &str) -> String {
    match serde_json::from_str::<String>(body) {
        Ok(message) => message,
        Err(_) => body.trim().to_string(),
    }
}
