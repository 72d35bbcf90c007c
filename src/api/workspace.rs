use reqwest::Method;

use super::ApiClient;
use crate::error::ApiResult;
use crate::models::{AddMemberRequest, NamedEntityRequest, UserId, Workspace, WorkspaceId, WorkspaceMember};

impl ApiClient {
    pub async fn list_workspaces(&self) -> ApiResult<Vec<Workspace>> {
        self.get("/api/workspaces").await
    }

    pub async fn get_workspace(&self, id: WorkspaceId) -> ApiResult<Workspace> {
        self.get(&format!("/api/workspaces/{}", id)).await
    }

    pub async fn create_workspace(&self, request: &NamedEntityRequest) -> ApiResult<Workspace> {
        self.send_json(Method::POST, "/api/workspaces", request).await
    }

    pub async fn update_workspace(&self, id: WorkspaceId, request: &NamedEntityRequest) -> ApiResult<Workspace> {
        self.send_json(Method::PUT, &format!("/api/workspaces/{}", id), request).await
    }

    pub async fn delete_workspace(&self, id: WorkspaceId) -> ApiResult<()> {
        self.send_empty(Method::DELETE, &format!("/api/workspaces/{}", id)).await
    }

    pub async fn list_members(&self, id: WorkspaceId) -> ApiResult<Vec<WorkspaceMember>> {
        self.get(&format!("/api/workspaces/{}/members", id)).await
    }

    pub async fn add_member(&self, id: WorkspaceId, request: &AddMemberRequest) -> ApiResult<WorkspaceMember> {
        self.send_json(Method::POST, &format!("/api/workspaces/{}/members", id), request).await
    }

    pub async fn remove_member(&self, id: WorkspaceId, user_id: UserId) -> ApiResult<()> {
        self.send_empty(Method::DELETE, &format!("/api/workspaces/{}/members/{}", id, user_id)).await
    }
}
