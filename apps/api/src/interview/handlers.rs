//! Axum route handlers for the Interview API.

use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{error, info};

use crate::errors::AppError;
use crate::interview::pdf::{ensure_pdf, extract_text};
use crate::interview::questions::{
    generate_questions, QuestionPlan, QuestionRequest, DIFFICULTY_RANGE, QUESTION_COUNT_RANGE,
};
use crate::interview::scoring::{AnswerSheet, ScoreResult, ScoringEngine};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UploadMetadata {
    pub file_name: Option<String>,
    pub file_size: usize,
}

#[derive(Debug, Serialize)]
pub struct QuestionsMetadata {
    #[serde(flatten)]
    pub upload: UploadMetadata,
    pub json_data: QuestionRequest,
    pub applied: QuestionPlan,
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub metadata: QuestionsMetadata,
    pub questions: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct EvaluationMetadata {
    #[serde(flatten)]
    pub upload: UploadMetadata,
    pub tech_stack: String,
    pub difficulty: u8,
    pub question_count: u8,
}

#[derive(Debug, Serialize)]
pub struct CompleteEvaluationResponse {
    #[serde(flatten)]
    pub result: ScoreResult,
    pub metadata: EvaluationMetadata,
}

/// An uploaded file, already checked to be a PDF.
struct PdfUpload {
    file_name: Option<String>,
    data: Bytes,
}

impl PdfUpload {
    async fn from_field(field: Field<'_>) -> Result<Self, AppError> {
        ensure_pdf(field.content_type())?;
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(malformed)?;
        Ok(Self { file_name, data })
    }

    fn metadata(&self) -> UploadMetadata {
        UploadMetadata {
            file_name: self.file_name.clone(),
            file_size: self.data.len(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interview/questions
///
/// Multipart: `file` (PDF resume) and `data` (JSON: techStack, difficultyLevel, questionCount).
/// Returns 204 when the model produced no usable questions.
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut upload = None;
    let mut data = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        match field.name().unwrap_or("") {
            "file" => upload = Some(PdfUpload::from_field(field).await?),
            "data" => data = Some(field.text().await.map_err(malformed)?),
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| AppError::Validation("Missing file".to_string()))?;
    let data = data
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| {
            AppError::Validation("Missing required parameters in JSON data".to_string())
        })?;
    let request = parse_question_request(&data)?;
    let plan = QuestionPlan::from_request(&request)?;

    let resume = extract_text(upload.data.clone()).await?;
    let questions = generate_questions(state.llm.as_ref(), &resume, &plan).await?;

    if questions.is_empty() {
        info!("No questions were generated");
        return Ok((
            StatusCode::NO_CONTENT,
            Json(json!({
                "message": "No questions could be generated. Try adjusting parameters."
            })),
        )
            .into_response());
    }

    let count = questions.len();
    Ok(Json(QuestionsResponse {
        metadata: QuestionsMetadata {
            upload: upload.metadata(),
            json_data: request,
            applied: plan,
        },
        questions,
        count,
    })
    .into_response())
}

/// POST /api/v1/interview/check-answers
///
/// Body: JSON object mapping question → answer, in asking order.
pub async fn handle_check_answers(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<ScoreResult>, AppError> {
    let sheet = answer_sheet(body)?;

    let engine = ScoringEngine::new(state.llm.clone());
    let result = engine.evaluate(&sheet).await?;

    Ok(Json(result))
}

/// POST /api/v1/interview/complete-evaluation
///
/// Multipart: `file`, `tech_stack`, `difficulty`, `question_count`, `answers` (JSON string).
/// Unlike question generation, out-of-range numbers are rejected rather than defaulted.
/// A grading failure still yields a result, flagged with `status: "error"`.
pub async fn handle_complete_evaluation(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CompleteEvaluationResponse>, AppError> {
    let mut upload = None;
    let mut tech_stack = String::new();
    let mut difficulty = String::new();
    let mut question_count = String::new();
    let mut answers = String::new();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        match field.name().unwrap_or("") {
            "file" => upload = Some(PdfUpload::from_field(field).await?),
            "tech_stack" => tech_stack = field.text().await.map_err(malformed)?,
            "difficulty" => difficulty = field.text().await.map_err(malformed)?,
            "question_count" => question_count = field.text().await.map_err(malformed)?,
            "answers" => answers = field.text().await.map_err(malformed)?,
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| AppError::Validation("Missing file".to_string()))?;

    let tech_stack = tech_stack.trim().to_string();
    if tech_stack.is_empty() {
        return Err(AppError::Validation(
            "Tech stack cannot be empty".to_string(),
        ));
    }
    let difficulty = strict_in_range(&difficulty, DIFFICULTY_RANGE).ok_or_else(|| {
        AppError::Validation("Difficulty must be an integer between 1 and 5".to_string())
    })?;
    let question_count = strict_in_range(&question_count, QUESTION_COUNT_RANGE).ok_or_else(|| {
        AppError::Validation("Question count must be an integer between 1 and 20".to_string())
    })?;

    let answers: Map<String, Value> = serde_json::from_str(&answers)
        .map_err(|_| AppError::Validation("answers must be a JSON object".to_string()))?;
    let sheet = answer_sheet(answers)?;

    // The resume must be readable even though grading only looks at the answers.
    extract_text(upload.data.clone()).await?;

    let engine = ScoringEngine::new(state.llm.clone());
    let result = match engine.evaluate(&sheet).await {
        Ok(result) => result,
        Err(e) => {
            error!("Evaluation failed: {e}");
            ScoreResult::failed(sheet.len(), e.to_string())
        }
    };
    info!("Evaluation result status: {:?}", result.status);

    Ok(Json(CompleteEvaluationResponse {
        result,
        metadata: EvaluationMetadata {
            upload: upload.metadata(),
            tech_stack,
            difficulty,
            question_count,
        },
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn parse_question_request(data: &str) -> Result<QuestionRequest, AppError> {
    let raw: Map<String, Value> = serde_json::from_str(data)
        .map_err(|_| AppError::Validation("Invalid JSON data format".to_string()))?;

    for field in ["techStack", "difficultyLevel", "questionCount"] {
        if !raw.contains_key(field) {
            return Err(AppError::Validation(format!(
                "Missing required field: {field}"
            )));
        }
    }

    serde_json::from_value(Value::Object(raw))
        .map_err(|e| AppError::Validation(format!("Invalid JSON data format: {e}")))
}

fn answer_sheet(body: Map<String, Value>) -> Result<AnswerSheet, AppError> {
    if body.is_empty() {
        return Err(AppError::Validation(
            "No question-answer pairs provided".to_string(),
        ));
    }
    AnswerSheet::try_from(body).map_err(AppError::Validation)
}

fn strict_in_range(raw: &str, range: std::ops::RangeInclusive<i64>) -> Option<u8> {
    let n = raw.trim().parse::<i64>().ok()?;
    range.contains(&n).then(|| u8::try_from(n).ok()).flatten()
}

fn malformed(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Malformed multipart body: {e}"))
}
