use reqwest::Method;

use super::ApiClient;
use crate::error::ApiResult;
use crate::models::{NamedEntityRequest, Project, ProjectId, WorkspaceId};

impl ApiClient {
    pub async fn list_projects(&self, workspace_id: WorkspaceId) -> ApiResult<Vec<Project>> {
        self.get(&format!("/api/workspaces/{}/projects", workspace_id)).await
    }

    pub async fn get_project(&self, id: ProjectId) -> ApiResult<Project> {
        self.get(&format!("/api/projects/{}", id)).await
    }

    pub async fn create_project(&self, workspace_id: WorkspaceId, request: &NamedEntityRequest) -> ApiResult<Project> {
        self.send_json(Method::POST, &format!("/api/workspaces/{}/projects", workspace_id), request)
            .await
    }

    pub async fn update_project(&self, id: ProjectId, request: &NamedEntityRequest) -> ApiResult<Project> {
        self.send_json(Method::PUT, &format!("/api/projects/{}", id), request).await
    }

    pub async fn delete_project(&self, id: ProjectId) -> ApiResult<()> {
        self.send_empty(Method::DELETE, &format!("/api/projects/{}", id)).await
    }
}
