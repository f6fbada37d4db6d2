use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::workspace::Workspace;

pub const WORKSPACE_HEADER: &str = "x-workspace-id";

#[derive(Deserialize)]
struct WorkspaceQuery {
    workspace: Option<String>,
}

/// The calling workspace, from the `x-workspace-id` header or, for
/// EventSource clients that cannot set headers, the `workspace` query parameter.
pub struct CurrentWorkspace(pub Arc<Workspace>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentWorkspace {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let from_header = parts
            .headers
            .get(WORKSPACE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let raw = match from_header {
            Some(raw) => raw,
            None => Query::<WorkspaceQuery>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|q| q.0.workspace)
                .ok_or(AppError::MissingWorkspace)?,
        };

        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::Validation(format!("'{raw}' is not a workspace id")))?;

        let workspace = state
            .workspaces
            .get(id)
            .await
            .ok_or_else(|| AppError::UnknownWorkspace(id.to_string()))?;
        workspace.touch();
        Ok(CurrentWorkspace(workspace))
    }
}
