//! Permission Anomaly Report
//!
//! A 403 on a project read while the current user is listed as a member
//! of the owning workspace points at a backend permission fault. The client
//! does not work around it; it logs a structured report for support.

use chrono::Utc;
use serde::Serialize;

use crate::error::ApiError;
use crate::models::{ProjectId, User, UserId, WorkspaceId, WorkspaceMember};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub user_id: UserId,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionAnomaly {
    pub timestamp: String,
    pub user_id: UserId,
    pub user_email: String,
    pub workspace_id: WorkspaceId,
    pub project_id: ProjectId,
    pub workspace_members: Vec<MemberSummary>,
    pub token_present: bool,
    pub message: String,
}

/// Build a report when `error` is an access denial the membership list
/// says should not have happened
pub fn detect(
    error: &ApiError,
    user: Option<&User>,
    members: &[WorkspaceMember],
    workspace_id: WorkspaceId,
    project_id: ProjectId,
    token_present: bool,
) -> Option<PermissionAnomaly> {
    let ApiError::AccessDenied(message) = error else { return None };
    let user = user?;
    if !members.iter().any(|m| m.user_id == user.id) {
        return None;
    }
    Some(PermissionAnomaly {
        timestamp: Utc::now().to_rfc3339(),
        user_id: user.id,
        user_email: user.email.clone(),
        workspace_id,
        project_id,
        workspace_members: members
            .iter()
            .map(|m| MemberSummary { user_id: m.user_id, email: m.user_email.clone(), role: m.role.as_str().to_string() })
            .collect(),
        token_present,
        message: message.clone(),
    })
}

/// Log the report at warn level
pub fn report(anomaly: &PermissionAnomaly) {
    match serde_json::to_string(anomaly) {
        Ok(json) => log::warn!("[ANOMALY] access denied for a verified member: {}", json),
        Err(err) => log::warn!("[ANOMALY] access denied for a verified member (report failed: {})", err),
    }
}
