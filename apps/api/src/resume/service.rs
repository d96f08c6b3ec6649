//! Resume build/update orchestration: runs the agent, persists the snapshot.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::ChatModel;
use crate::memory::{MemoryKind, MemoryRecord, MemoryStore};
use crate::parser::json::Document;
use crate::resume::state_machine::{ConversationState, ResumeAgent};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("Error building resume: {0}")]
    Build(String),

    #[error("Error updating resume: {0}")]
    Update(String),
}

impl From<ResumeError> for AppError {
    fn from(e: ResumeError) -> Self {
        match e {
            ResumeError::Build(_) => AppError::Llm(e.to_string()),
            ResumeError::Update(_) => AppError::UnprocessableEntity(e.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub resume: Document,
    pub memory_id: Uuid,
    pub user_id: String,
}

pub struct ResumeService {
    agent: ResumeAgent,
    memory: MemoryStore,
}

impl ResumeService {
    pub fn new(llm: Arc<dyn ChatModel>, memory: MemoryStore, max_repair_attempts: u32) -> Self {
        Self {
            agent: ResumeAgent::new(llm, max_repair_attempts),
            memory,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.llm.clone(),
            state.memory.clone(),
            state.config.resume_max_repair_attempts,
        )
    }

    /// Runs the full build pipeline and stores the result under the user.
    /// A fresh user id is minted when none is given.
    pub async fn build(
        &self,
        job_description: &str,
        user_profile: Value,
        template: Document,
        user_id: Option<String>,
    ) -> Result<BuildOutcome, ResumeError> {
        let user_id = user_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let state = ConversationState::for_build(job_description, user_profile, template);
        let resume = self
            .agent
            .run_build(state)
            .await
            .into_resume()
            .map_err(|e| {
                error!("Resume build failed for user {user_id}: {e}");
                ResumeError::Build(e)
            })?;

        let record = self
            .memory
            .put(
                &user_id,
                MemoryKind::Resumes,
                job_description,
                Value::Object(resume.clone()),
            )
            .await;

        info!("Built resume {} for user {user_id}", record.memory_id);
        Ok(BuildOutcome {
            resume,
            memory_id: record.memory_id,
            user_id,
        })
    }

    /// Applies a free-text instruction to an existing resume and stores the
    /// edited copy as a new record. The original record is left untouched.
    pub async fn update(
        &self,
        user_id: &str,
        current: Option<Document>,
        template: Document,
        instruction: &str,
    ) -> Result<(Document, MemoryRecord), ResumeError> {
        let state = ConversationState::for_update(current, template, instruction);
        let resume = self
            .agent
            .run_update(state)
            .await
            .into_resume()
            .map_err(ResumeError::Update)?;

        let record = self
            .memory
            .put(
                user_id,
                MemoryKind::Resumes,
                format!("Updated via instruction: {instruction}"),
                Value::Object(resume.clone()),
            )
            .await;

        Ok((resume, record))
    }

    /// Loads a stored resume. Records whose payload is not an object yield `None`.
    pub async fn load(&self, user_id: &str, memory_id: Uuid) -> Result<Option<Document>, AppError> {
        let record = self
            .memory
            .get(user_id, MemoryKind::Resumes, memory_id)
            .await
            .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;

        Ok(match record.data.resume {
            Value::Object(map) if !map.is_empty() => Some(map),
            _ => None,
        })
    }
}
