//! Resume generation state machine.
//!
//! Build:  AnalyzeJob → ReviewProfile → GenerateResume ─┬─▶ Terminal
//!                                                      └─▶ HandleError ⟲ ─┬─▶ Terminal
//!                                                                          └─▶ Failed (cap)
//! Update: ConversationalUpdate ─┬─▶ Terminal
//!                               ├─▶ HandleError (as above)
//!                               └─▶ Failed (no resume to edit)
//!
//! Every stage sees the whole transcript so far; no stage edits or drops a turn.
//! Gateway and parse failures are recorded in `error_message` and routed into
//! the repair loop instead of aborting the run.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::llm_client::{ChatMessage, ChatModel};
use crate::parser::json::{extract_json, Document};
use crate::resume::prompts::{
    generate_resume_prompt, repair_prompt, ANALYZE_JOB_PROMPT, BUILDER_SYSTEM,
    EDITOR_SYSTEM, EDIT_INSTRUCTION_PROMPT, GENERATION_PARSE_ERROR, NO_RESUME_ERROR,
    REPAIR_PARSE_ERROR, REVIEW_PROFILE_PROMPT,
};
use crate::resume::validator::reconcile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AnalyzeJob,
    ReviewProfile,
    GenerateResume,
    HandleError,
    ConversationalUpdate,
    Terminal,
    Failed,
}

impl Stage {
    pub fn is_final(self) -> bool {
        matches!(self, Stage::Terminal | Stage::Failed)
    }
}

/// Append-only conversation log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript(Vec<ChatMessage>);

impl Transcript {
    pub fn push(&mut self, message: ChatMessage) {
        self.0.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Per-request state threaded through every stage.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub transcript: Transcript,
    pub job_description: String,
    pub user_profile: Value,
    pub template: Document,
    pub resume: Option<Document>,
    pub error_message: Option<String>,
    pub pending_instruction: Option<String>,
    pub repair_attempts: u32,
}

impl ConversationState {
    pub fn for_build(job_description: impl Into<String>, user_profile: Value, template: Document) -> Self {
        Self {
            transcript: Transcript::default(),
            job_description: job_description.into(),
            user_profile,
            template,
            resume: None,
            error_message: None,
            pending_instruction: None,
            repair_attempts: 0,
        }
    }

    pub fn for_update(resume: Option<Document>, template: Document, instruction: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::default(),
            job_description: String::new(),
            user_profile: Value::Null,
            template,
            resume,
            error_message: None,
            pending_instruction: Some(instruction.into()),
            repair_attempts: 0,
        }
    }
}

/// Final stage reached plus the state it left behind.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub stage: Stage,
    pub state: ConversationState,
}

impl RunOutcome {
    /// The resume on success, the last error message otherwise.
    pub fn into_resume(self) -> Result<Document, String> {
        match (self.stage, self.state.resume) {
            (Stage::Terminal, Some(resume)) => Ok(resume),
            _ => Err(self
                .state
                .error_message
                .unwrap_or_else(|| "Resume generation did not complete".to_string())),
        }
    }
}

/// Drives a `ConversationState` through the stage graph.
#[derive(Clone)]
pub struct ResumeAgent {
    llm: Arc<dyn ChatModel>,
    max_repair_attempts: u32,
}

impl ResumeAgent {
    pub fn new(llm: Arc<dyn ChatModel>, max_repair_attempts: u32) -> Self {
        Self {
            llm,
            max_repair_attempts,
        }
    }

    pub async fn run_build(&self, state: ConversationState) -> RunOutcome {
        self.run(Stage::AnalyzeJob, state).await
    }

    pub async fn run_update(&self, state: ConversationState) -> RunOutcome {
        self.run(Stage::ConversationalUpdate, state).await
    }

    async fn run(&self, entry: Stage, mut state: ConversationState) -> RunOutcome {
        let mut stage = entry;
        while !stage.is_final() {
            let next = self.step(stage, &mut state).await;
            debug!("Resume agent: {stage:?} -> {next:?}");
            stage = next;
        }

        match stage {
            Stage::Failed => warn!(
                "Resume agent failed after {} repair attempts: {}",
                state.repair_attempts,
                state.error_message.as_deref().unwrap_or("unknown error")
            ),
            _ => info!(
                "Resume agent finished, transcript has {} turns",
                state.transcript.len()
            ),
        }
        RunOutcome { stage, state }
    }

    /// Executes one stage and returns the stage that follows it.
    pub async fn step(&self, stage: Stage, state: &mut ConversationState) -> Stage {
        match stage {
            Stage::AnalyzeJob => {
                self.analyze_job(state).await;
                Stage::ReviewProfile
            }
            Stage::ReviewProfile => {
                self.review_profile(state).await;
                Stage::GenerateResume
            }
            Stage::GenerateResume => {
                self.generate_resume(state).await;
                self.check_error_condition(state)
            }
            Stage::HandleError => {
                self.handle_error(state).await;
                self.check_error_condition(state)
            }
            Stage::ConversationalUpdate => {
                if state.resume.is_none() {
                    state.error_message = Some(NO_RESUME_ERROR.to_string());
                    return Stage::Failed;
                }
                self.conversational_update(state).await;
                self.check_error_condition(state)
            }
            Stage::Terminal | Stage::Failed => stage,
        }
    }

    /// No error → Terminal; error with repair budget left → HandleError; else Failed.
    pub fn check_error_condition(&self, state: &ConversationState) -> Stage {
        match state.error_message {
            None => Stage::Terminal,
            Some(_) if state.repair_attempts < self.max_repair_attempts => Stage::HandleError,
            Some(_) => Stage::Failed,
        }
    }

    // ── Stages ──────────────────────────────────────────────────────────────

    async fn analyze_job(&self, state: &mut ConversationState) {
        state.transcript.push(ChatMessage::system(BUILDER_SYSTEM));
        state.transcript.push(ChatMessage::user(
            ANALYZE_JOB_PROMPT.replace("{job_description}", &state.job_description),
        ));
        self.converse(state, "analyzing job description").await;
    }

    async fn review_profile(&self, state: &mut ConversationState) {
        let profile = pretty(&state.user_profile);
        state
            .transcript
            .push(ChatMessage::user(REVIEW_PROFILE_PROMPT.replace("{user_profile}", &profile)));
        self.converse(state, "reviewing profile").await;
    }

    async fn generate_resume(&self, state: &mut ConversationState) {
        let template = pretty_document(&state.template);
        state
            .transcript
            .push(ChatMessage::user(generate_resume_prompt(&template)));

        if let Some(reply) = self.converse(state, "generating resume").await {
            self.accept_resume(state, &reply, GENERATION_PARSE_ERROR);
        }
    }

    async fn handle_error(&self, state: &mut ConversationState) {
        state.repair_attempts += 1;
        let error = state.error_message.clone().unwrap_or_default();
        info!(
            "Repair attempt {}/{}: {error}",
            state.repair_attempts, self.max_repair_attempts
        );

        let template = pretty_document(&state.template);
        state
            .transcript
            .push(ChatMessage::user(repair_prompt(&error, &template)));

        if let Some(reply) = self.converse(state, "repairing resume").await {
            self.accept_resume(state, &reply, REPAIR_PARSE_ERROR);
        }
    }

    async fn conversational_update(&self, state: &mut ConversationState) {
        let current = state.resume.as_ref().map(pretty_document).unwrap_or_default();
        let instruction = state.pending_instruction.clone().unwrap_or_default();

        state
            .transcript
            .push(ChatMessage::system(EDITOR_SYSTEM.replace("{resume}", &current)));
        state
            .transcript
            .push(ChatMessage::user(EDIT_INSTRUCTION_PROMPT.replace("{instruction}", &instruction)));

        if let Some(reply) = self.converse(state, "updating resume").await {
            self.accept_resume(state, &reply, GENERATION_PARSE_ERROR);
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────────────

    /// Sends the whole transcript. A reply is appended as an assistant turn;
    /// a failure is recorded in `error_message` and nothing is appended.
    async fn converse(&self, state: &mut ConversationState, activity: &str) -> Option<String> {
        match self.llm.invoke(state.transcript.messages()).await {
            Ok(reply) => {
                state.transcript.push(ChatMessage::assistant(reply.clone()));
                Some(reply)
            }
            Err(e) => {
                warn!("LLM call failed while {activity}: {e}");
                state.error_message = Some(format!("Error {activity}: {e}"));
                None
            }
        }
    }

    /// Parses and reconciles a reply. An accepted resume settles any pending
    /// instruction, whether it came from the edit itself or from a repair.
    fn accept_resume(&self, state: &mut ConversationState, reply: &str, parse_error: &str) {
        let generated = extract_json(reply);
        if generated.is_empty() {
            state.error_message = Some(parse_error.to_string());
            return;
        }
        state.resume = Some(reconcile(&generated, &state.template));
        state.error_message = None;
        state.pending_instruction = None;
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn pretty_document(document: &Document) -> String {
    serde_json::to_string_pretty(document).unwrap_or_default()
}
