//! Axum route handlers for the Memory API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::memory::{MemoryKind, MemoryRecord};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DeleteMemoryResponse {
    pub status: String,
    pub memory_id: Uuid,
}

/// GET /api/v1/memory/:user_id
pub async fn handle_list_memories(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<MemoryRecord>>, AppError> {
    Ok(Json(state.memory.list(&user_id, MemoryKind::Resumes).await))
}

/// DELETE /api/v1/memory/:user_id/:memory_id
pub async fn handle_delete_memory(
    State(state): State<AppState>,
    Path((user_id, memory_id)): Path<(String, Uuid)>,
) -> Result<Json<DeleteMemoryResponse>, AppError> {
    if !state
        .memory
        .delete(&user_id, MemoryKind::Resumes, memory_id)
        .await
    {
        return Err(AppError::NotFound(format!("Memory {memory_id} not found")));
    }

    Ok(Json(DeleteMemoryResponse {
        status: "Memory deleted".to_string(),
        memory_id,
    }))
}
