//! REST API Bindings
//!
//! Typed wrappers over the backend's endpoints, organized by domain.
//! Every authenticated call carries the session's bearer token; a 401 on
//! such a call ends the session through the registered hook.

mod auth;
mod project;
mod task;
mod workspace;

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{QueryData, QueryKey};
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::{ColumnId, Task, TaskId};
use crate::query::QuerySource;
use crate::reconcile::TaskMover;
use crate::session::TokenStore;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Rc<dyn TokenStore>,
    on_session_expired: RefCell<Option<Rc<dyn Fn()>>>,
}

impl ApiClient {
    pub fn new(config: &AppConfig, tokens: Rc<dyn TokenStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base_url.clone(),
            tokens,
            on_session_expired: RefCell::new(None),
        }
    }

    /// Hook run when an authenticated call comes back 401
    pub fn set_on_session_expired(&self, hook: impl Fn() + 'static) {
        *self.on_session_expired.borrow_mut() = Some(Rc::new(hook));
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn build(&self, method: Method, path: &str) -> (RequestBuilder, bool) {
        let mut request = self.http.request(method, self.url(path));
        let token = self.tokens.access_token();
        let authed = token.is_some();
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        (request, authed)
    }

    async fn execute(&self, method: Method, path: &str, request: RequestBuilder, authed: bool) -> ApiResult<Response> {
        log::debug!("[API] {} {}", method, path);
        let response = request.send().await.map_err(|e| {
            log::warn!("[API] {} {} unreachable: {}", method, path, e);
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status.as_u16(), &body);
        log::warn!("[API] {} {} -> {}: {}", method, path, status.as_u16(), err);

        if err.is_session_expired() && authed {
            let hook = self.on_session_expired.borrow().clone();
            if let Some(hook) = hook {
                hook();
            }
        }
        Err(err)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let (request, authed) = self.build(Method::GET, path);
        let response = self.execute(Method::GET, path, request, authed).await?;
        decode(response).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (request, authed) = self.build(method.clone(), path);
        let response = self.execute(method, path, request.json(body), authed).await?;
        decode(response).await
    }

    /// Request without a body whose response is JSON
    async fn send_bare<T: DeserializeOwned>(&self, method: Method, path: &str) -> ApiResult<T> {
        let (request, authed) = self.build(method.clone(), path);
        let response = self.execute(method, path, request, authed).await?;
        decode(response).await
    }

    /// Request whose response body is ignored (DELETE, 204)
    async fn send_empty(&self, method: Method, path: &str) -> ApiResult<()> {
        let (request, authed) = self.build(method.clone(), path);
        self.execute(method, path, request, authed).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    response.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait(?Send)]
impl QuerySource for ApiClient {
    async fn fetch(&self, key: QueryKey) -> ApiResult<QueryData> {
        Ok(match key {
            QueryKey::CurrentUser => QueryData::CurrentUser(self.current_user().await?),
            QueryKey::Workspaces => QueryData::Workspaces(self.list_workspaces().await?),
            QueryKey::Workspace(id) => QueryData::Workspace(self.get_workspace(id).await?),
            QueryKey::Members(id) => QueryData::Members(self.list_members(id).await?),
            QueryKey::Projects(id) => QueryData::Projects(self.list_projects(id).await?),
            QueryKey::Project(id) => QueryData::Project(self.get_project(id).await?),
            QueryKey::Columns(id) => QueryData::Columns(self.list_columns(id).await?),
            QueryKey::Tasks(id) => QueryData::Tasks(self.list_tasks(id).await?),
        })
    }
}

#[async_trait(?Send)]
impl TaskMover for ApiClient {
    async fn move_task(&self, task_id: TaskId, column_id: ColumnId) -> ApiResult<Task> {
        self.move_task_to_column(task_id, column_id).await
    }
}
