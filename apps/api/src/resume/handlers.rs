//! Axum route handlers for the Resume API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::memory::{MemoryKind, MemoryRecord};
use crate::parser::json::Document;
use crate::resume::service::{ResumeError, ResumeService};
use crate::resume::template::default_template;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BuildResumeRequest {
    pub job_description: String,
    pub user_profile: Value,
    pub resume_template: Option<Value>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResumeRequest {
    pub user_id: String,
    pub resume_id: Uuid,
    pub instruction: String,
    pub resume_template: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ResumeResponse {
    pub resume: Document,
    pub memory_id: Uuid,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    pub resume_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_resume: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_id: Option<Uuid>,
}

impl ChatResponse {
    fn reply(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            updated_resume: None,
            memory_id: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/build
///
/// Full pipeline: analyze JD → review profile → generate → repair loop.
/// The finished resume is stored as a new memory record.
pub async fn handle_build_resume(
    State(state): State<AppState>,
    Json(request): Json<BuildResumeRequest>,
) -> Result<Json<ResumeResponse>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }
    if !request.user_profile.is_object() {
        return Err(AppError::Validation(
            "user_profile must be a JSON object".to_string(),
        ));
    }
    let template = resolve_template(request.resume_template)?;

    let outcome = ResumeService::from_state(&state)
        .build(
            &request.job_description,
            request.user_profile,
            template,
            request.user_id,
        )
        .await?;

    Ok(Json(ResumeResponse {
        resume: outcome.resume,
        memory_id: outcome.memory_id,
        user_id: outcome.user_id,
    }))
}

/// POST /api/v1/resumes/update
///
/// Applies an instruction to a stored resume. The edit is stored as a new record.
pub async fn handle_update_resume(
    State(state): State<AppState>,
    Json(request): Json<UpdateResumeRequest>,
) -> Result<Json<ResumeResponse>, AppError> {
    if request.instruction.trim().is_empty() {
        return Err(AppError::Validation(
            "instruction cannot be empty".to_string(),
        ));
    }
    let template = resolve_template(request.resume_template)?;

    let service = ResumeService::from_state(&state);
    let current = service.load(&request.user_id, request.resume_id).await?;
    let (resume, record) = service
        .update(&request.user_id, current, template, &request.instruction)
        .await?;

    Ok(Json(ResumeResponse {
        resume,
        memory_id: record.memory_id,
        user_id: request.user_id,
    }))
}

/// POST /api/v1/resumes/chat
///
/// Conversational editing. Weak input gets an explanatory reply, not an error.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let service = ResumeService::from_state(&state);

    let current = match request.resume_id {
        Some(resume_id) => service.load(&request.user_id, resume_id).await?,
        None => None,
    };
    let Some(current) = current else {
        return Ok(Json(ChatResponse::reply(
            "Please create a resume first before chatting about updates.",
        )));
    };
    if request.message.trim().is_empty() {
        return Ok(Json(ChatResponse::reply(
            "Tell me what you would like to change in your resume.",
        )));
    }

    match service
        .update(&request.user_id, Some(current), default_template(), &request.message)
        .await
    {
        Ok((resume, record)) => Ok(Json(ChatResponse {
            message: "I've updated your resume based on your request.".to_string(),
            updated_resume: Some(resume),
            memory_id: Some(record.memory_id),
        })),
        Err(ResumeError::Update(reason)) => {
            warn!("Chat update failed for user {}: {reason}", request.user_id);
            Ok(Json(ChatResponse::reply(format!(
                "I couldn't update the resume: {reason}"
            ))))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /api/v1/users/:user_id/resumes
pub async fn handle_resume_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<MemoryRecord>>, AppError> {
    Ok(Json(state.memory.list(&user_id, MemoryKind::Resumes).await))
}

/// GET /api/v1/users/:user_id/resumes/:memory_id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path((user_id, memory_id)): Path<(String, Uuid)>,
) -> Result<Json<MemoryRecord>, AppError> {
    state
        .memory
        .get(&user_id, MemoryKind::Resumes, memory_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))
}

fn resolve_template(template: Option<Value>) -> Result<Document, AppError> {
    match template {
        None | Some(Value::Null) => Ok(default_template()),
        Some(Value::Object(map)) if !map.is_empty() => Ok(map),
        Some(_) => Err(AppError::Validation(
            "resume_template must be a non-empty JSON object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_template_falls_back_to_default() {
        assert_eq!(resolve_template(None).unwrap(), default_template());
        assert_eq!(resolve_template(Some(Value::Null)).unwrap(), default_template());
    }

    #[test]
    fn test_custom_template_is_used_as_given() {
        let template = resolve_template(Some(json!({"name": ""}))).unwrap();
        assert_eq!(Value::Object(template), json!({"name": ""}));
    }

    #[test]
    fn test_malformed_template_is_rejected() {
        for bad in [json!({}), json!([]), json!("template")] {
            assert!(matches!(
                resolve_template(Some(bad)),
                Err(AppError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_chat_reply_omits_empty_fields() {
        let value = serde_json::to_value(ChatResponse::reply("hi")).unwrap();
        assert_eq!(value, json!({"message": "hi"}));
    }
}
