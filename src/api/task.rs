use reqwest::Method;

use super::ApiClient;
use crate::error::ApiResult;
use crate::models::{Column, ColumnId, CreateTaskRequest, ProjectId, Task, TaskId, UpdateTaskRequest};

impl ApiClient {
    pub async fn list_columns(&self, project_id: ProjectId) -> ApiResult<Vec<Column>> {
        self.get(&format!("/api/projects/{}/columns", project_id)).await
    }

    pub async fn list_tasks(&self, project_id: ProjectId) -> ApiResult<Vec<Task>> {
        self.get(&format!("/api/projects/{}/tasks", project_id)).await
    }

    /// New tasks land in the project's first column server-side
    pub async fn create_task(&self, project_id: ProjectId, request: &CreateTaskRequest) -> ApiResult<Task> {
        self.send_json(Method::POST, &format!("/api/projects/{}/tasks", project_id), request).await
    }

    pub async fn update_task(&self, id: TaskId, request: &UpdateTaskRequest) -> ApiResult<Task> {
        self.send_json(Method::PUT, &format!("/api/tasks/{}", id), request).await
    }

    pub async fn delete_task(&self, id: TaskId) -> ApiResult<()> {
        self.send_empty(Method::DELETE, &format!("/api/tasks/{}", id)).await
    }

    pub async fn move_task_to_column(&self, id: TaskId, column_id: ColumnId) -> ApiResult<Task> {
        self.send_bare(Method::PATCH, &format!("/api/tasks/{}/column/{}", id, column_id)).await
    }
}
