//! Interview question generation from resume text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::interview::prompts::{QUESTION_PROMPT_TEMPLATE, QUESTION_SYSTEM};
use crate::llm_client::prompts::ITEM_SEPARATOR;
use crate::llm_client::{ChatMessage, ChatModel};

pub const DEFAULT_DIFFICULTY: u8 = 3;
pub const DEFAULT_QUESTION_COUNT: u8 = 5;
pub const DIFFICULTY_RANGE: std::ops::RangeInclusive<i64> = 1..=5;
pub const QUESTION_COUNT_RANGE: std::ops::RangeInclusive<i64> = 1..=20;

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s*").unwrap());

/// Raw client parameters. Numbers may arrive as JSON numbers or strings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRequest {
    pub tech_stack: String,
    pub difficulty_level: Value,
    pub question_count: Value,
}

/// Normalised generation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionPlan {
    pub tech_stack: String,
    pub difficulty: u8,
    pub question_count: u8,
}

impl QuestionPlan {
    /// Empty tech stack is rejected; out-of-range numbers fall back to defaults.
    pub fn from_request(request: &QuestionRequest) -> Result<Self, AppError> {
        let tech_stack = request.tech_stack.trim();
        if tech_stack.is_empty() {
            return Err(AppError::Validation(
                "techStack cannot be empty".to_string(),
            ));
        }

        let difficulty = match parse_in_range(&request.difficulty_level, DIFFICULTY_RANGE) {
            Some(d) => d,
            None => {
                warn!(
                    "Invalid difficulty value: {}, defaulting to {DEFAULT_DIFFICULTY}",
                    request.difficulty_level
                );
                DEFAULT_DIFFICULTY
            }
        };

        let question_count = match parse_in_range(&request.question_count, QUESTION_COUNT_RANGE) {
            Some(c) => c,
            None => {
                warn!(
                    "Invalid question count: {}, defaulting to {DEFAULT_QUESTION_COUNT}",
                    request.question_count
                );
                DEFAULT_QUESTION_COUNT
            }
        };

        Ok(Self {
            tech_stack: tech_stack.to_string(),
            difficulty,
            question_count,
        })
    }
}

/// Accepts integers or integer-valued strings inside `range`.
pub fn parse_in_range(value: &Value, range: std::ops::RangeInclusive<i64>) -> Option<u8> {
    let n = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    if range.contains(&n) {
        u8::try_from(n).ok()
    } else {
        None
    }
}

pub fn build_question_prompt(resume: &str, plan: &QuestionPlan) -> String {
    QUESTION_PROMPT_TEMPLATE
        .replace("{question_count}", &plan.question_count.to_string())
        .replace("{tech_stack}", &plan.tech_stack)
        .replace("{difficulty}", &plan.difficulty.to_string())
        .replace("{separator}", ITEM_SEPARATOR)
        .replace("{resume}", resume)
}

/// Asks the model for questions and splits its reply. Gateway failures surface as `AppError::Llm`.
pub async fn generate_questions(
    llm: &dyn ChatModel,
    resume: &str,
    plan: &QuestionPlan,
) -> Result<Vec<String>, AppError> {
    if resume.trim().is_empty() {
        return Err(AppError::Validation(
            "Resume text cannot be empty".to_string(),
        ));
    }

    let prompt = build_question_prompt(resume, plan);
    info!("Generated prompt for questions, length: {}", prompt.len());

    let reply = llm
        .invoke(&[ChatMessage::system(QUESTION_SYSTEM), ChatMessage::user(prompt)])
        .await
        .map_err(|e| AppError::Llm(format!("Failed to generate questions: {e}")))?;

    let questions = split_questions(&reply);
    info!("Generated {} questions", questions.len());
    Ok(questions)
}

/// Splits on the item separator; a single multi-line fragment is split per line instead.
pub fn split_questions(reply: &str) -> Vec<String> {
    let fragments: Vec<&str> = reply
        .split(ITEM_SEPARATOR)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .collect();

    match fragments.as_slice() {
        [single] if single.contains('\n') => single
            .lines()
            .map(|line| LIST_MARKER.replace(line, "").trim().to_string())
            .filter(|q| !q.is_empty())
            .collect(),
        _ => fragments.into_iter().map(str::to_string).collect(),
    }
}
