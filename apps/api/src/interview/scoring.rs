//! Scoring Engine: converts graded answers into a single percentage score.
//!
//! Flow: screen non-answers → short-circuit degenerate sheets → grade via LLM →
//!       align verdicts by index → force non-answers to Incorrect →
//!       percentage (floored to 10) → "don't know" penalty → feedback.
//!
//! Only the LLM call can fail. Everything around it is total and degrades to 0.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::interview::prompts::{EVALUATION_PROMPT_TEMPLATE, EVALUATION_SYSTEM};
use crate::llm_client::{ChatMessage, ChatModel, LlmError};
use crate::parser::classification::{extract_classifications, Classification};

/// Share of non-answers (in tenths) at or above which the LLM is not consulted.
const SHORT_CIRCUIT_RATIO_TENTHS: usize = 7;
/// Score returned for sheets that are mostly non-answers.
const SHORT_CIRCUIT_SCORE: u32 = 10;
/// Penalty only applies above this score.
const PENALTY_THRESHOLD: u32 = 50;

/// Answers matching any of these (case-insensitive substring) count as "don't know".
const NON_ANSWER_PHRASES: &[&str] = &[
    "i don't know",
    "i do not know",
    "i dont know",
    "don't know",
    "dont know",
    "no idea",
    "not sure",
    "i'm sorry",
    "im sorry",
    "cannot answer",
    "can't answer",
    "no clue",
];

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Failed to evaluate answers: {0}")]
    Gateway(#[from] LlmError),
}

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Question→answer pairs in request order. Position `i` is answer number `i + 1`
/// in the grading prompt, which is what verdicts are aligned against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct AnswerSheet {
    pairs: Vec<QaPair>,
}

impl AnswerSheet {
    pub fn new(pairs: Vec<QaPair>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[QaPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl TryFrom<Map<String, Value>> for AnswerSheet {
    type Error = String;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let pairs = map
            .into_iter()
            .map(|(question, answer)| match answer {
                Value::String(answer) => Ok(QaPair { question, answer }),
                Value::Null => Ok(QaPair {
                    question,
                    answer: String::new(),
                }),
                other => Err(format!(
                    "answer for question {question:?} must be a string, got {other}"
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { pairs })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationStatus {
    Success,
    Error,
}

/// Final evaluation handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// 0–100, always a multiple of 10.
    pub score: u32,
    /// Same value as `score`, kept under the key existing clients read.
    pub raw_score: u32,
    pub evaluated_answers: usize,
    pub feedback: String,
    pub status: EvaluationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScoreResult {
    fn success(score: u32, evaluated_answers: usize) -> Self {
        Self {
            score,
            raw_score: score,
            evaluated_answers,
            feedback: feedback_for_score(score).to_string(),
            status: EvaluationStatus::Success,
            error: None,
        }
    }

    /// Score 0 with an explanation; used when there is nothing to grade.
    pub fn no_answers() -> Self {
        Self {
            score: 0,
            raw_score: 0,
            evaluated_answers: 0,
            feedback: "No valid answers provided.".to_string(),
            status: EvaluationStatus::Success,
            error: None,
        }
    }

    /// A present-but-failed result carrying the cause.
    pub fn failed(evaluated_answers: usize, detail: impl Into<String>) -> Self {
        Self {
            score: 0,
            raw_score: 0,
            evaluated_answers,
            feedback: "Evaluation could not be completed.".to_string(),
            status: EvaluationStatus::Error,
            error: Some(detail.into()),
        }
    }
}

/// Local pre-filter verdicts, one flag per answer in sheet order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screening {
    pub non_answers: Vec<bool>,
    pub dont_know_count: usize,
}

impl Screening {
    pub fn total(&self) -> usize {
        self.non_answers.len()
    }

    /// True when at least 70% of the answers are non-answers.
    pub fn is_degenerate(&self) -> bool {
        let total = self.total();
        total > 0 && self.dont_know_count * 10 >= total * SHORT_CIRCUIT_RATIO_TENTHS
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

/// Grades an answer sheet through the injected chat model.
#[derive(Clone)]
pub struct ScoringEngine {
    llm: Arc<dyn ChatModel>,
}

impl ScoringEngine {
    pub fn new(llm: Arc<dyn ChatModel>) -> Self {
        Self { llm }
    }

    pub async fn evaluate(&self, sheet: &AnswerSheet) -> Result<ScoreResult, EvaluationError> {
        if sheet.is_empty() {
            return Ok(ScoreResult::no_answers());
        }

        let screening = screen_answers(sheet);
        if screening.is_degenerate() {
            info!(
                "{}/{} answers are non-answers; returning fixed score without grading",
                screening.dont_know_count,
                screening.total()
            );
            return Ok(ScoreResult::success(SHORT_CIRCUIT_SCORE, sheet.len()));
        }

        let prompt = build_evaluation_prompt(sheet);
        info!("Generated evaluation prompt, length: {}", prompt.len());

        let reply = self
            .llm
            .invoke(&[
                ChatMessage::system(EVALUATION_SYSTEM),
                ChatMessage::user(prompt),
            ])
            .await?;
        debug!("Raw grader reply: {reply}");

        let result = score_reply(&screening, &reply);
        info!(
            "Evaluation score: {} over {} answers",
            result.score, result.evaluated_answers
        );
        Ok(result)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pure scoring steps
// ────────────────────────────────────────────────────────────────────────────

pub fn is_non_answer(answer: &str) -> bool {
    let normalized = answer.trim().to_lowercase().replace('\u{2019}', "'");
    normalized.is_empty() || NON_ANSWER_PHRASES.iter().any(|p| normalized.contains(p))
}

pub fn screen_answers(sheet: &AnswerSheet) -> Screening {
    let non_answers: Vec<bool> = sheet.pairs().iter().map(|p| is_non_answer(&p.answer)).collect();
    let dont_know_count = non_answers.iter().filter(|&&flag| flag).count();
    Screening {
        non_answers,
        dont_know_count,
    }
}

/// Steps after the LLM call: align, override, score, penalise, attach feedback.
pub fn score_reply(screening: &Screening, reply: &str) -> ScoreResult {
    let total = screening.total();
    let classifications = extract_classifications(reply, total);
    let score = score_classifications(&classifications, screening);
    ScoreResult::success(score, total)
}

/// Forces non-answers to `Incorrect` by index, then computes the penalised score.
/// `classifications` must already be aligned one-to-one with the screened answers.
pub fn score_classifications(classifications: &[Classification], screening: &Screening) -> u32 {
    let adjusted: Vec<Classification> = classifications
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            if screening.non_answers.get(i).copied().unwrap_or(false) {
                Classification::Incorrect
            } else {
                c
            }
        })
        .collect();

    let score = percentage(&adjusted);
    apply_dont_know_penalty(score, screening.dont_know_count, screening.total())
}

/// Earned points over the maximum, truncated to a multiple of 10.
pub fn percentage(classifications: &[Classification]) -> u32 {
    if classifications.is_empty() {
        return 0;
    }
    let earned: u32 = classifications.iter().map(|c| c.points()).sum();
    let max = classifications.len() as u32 * Classification::MAX_POINTS;
    floor_to_ten(earned * 100 / max)
}

/// Scales scores above 50 by `1 - (dont_know / total) * 0.5`, re-floored to 10.
/// Integer arithmetic keeps the floor exact: score * (2t - d) / 2t.
pub fn apply_dont_know_penalty(score: u32, dont_know_count: usize, total: usize) -> u32 {
    if dont_know_count == 0 || total == 0 || score <= PENALTY_THRESHOLD {
        return score;
    }
    let total = total as u64;
    let dont_know = (dont_know_count as u64).min(total);
    let adjusted = u64::from(score) * (2 * total - dont_know) / (2 * total);
    floor_to_ten(adjusted as u32)
}

pub fn feedback_for_score(score: u32) -> &'static str {
    if score >= 90 {
        "Excellent! Candidate demonstrated comprehensive knowledge."
    } else if score >= 70 {
        "Good performance. Candidate shows solid understanding with some room for improvement."
    } else if score >= 50 {
        "Adequate performance. Candidate has basic knowledge but needs development in some areas."
    } else if score >= 30 {
        "Below average. Candidate needs significant improvement in key areas."
    } else {
        "Poor performance. Candidate lacks fundamental understanding of the subject matter."
    }
}

fn floor_to_ten(score: u32) -> u32 {
    (score / 10) * 10
}

fn build_evaluation_prompt(sheet: &AnswerSheet) -> String {
    let qa_pairs: String = sheet
        .pairs()
        .iter()
        .enumerate()
        .map(|(i, pair)| {
            format!(
                "Question {n}: {q}\nCandidate response {n}: {a}\n\n",
                n = i + 1,
                q = pair.question.trim(),
                a = pair.answer.trim()
            )
        })
        .collect();

    EVALUATION_PROMPT_TEMPLATE
        .replace("{answer_count}", &sheet.len().to_string())
        .replace("{qa_pairs}", &qa_pairs)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;
    use serde_json::json;
    use Classification::*;

    fn sheet(answers: &[&str]) -> AnswerSheet {
        AnswerSheet::new(
            answers
                .iter()
                .enumerate()
                .map(|(i, a)| QaPair {
                    question: format!("Question number {}?", i + 1),
                    answer: a.to_string(),
                })
                .collect(),
        )
    }

    fn no_screening(total: usize) -> Screening {
        Screening {
            non_answers: vec![false; total],
            dont_know_count: 0,
        }
    }

    #[test]
    fn test_percentage_edges() {
        assert_eq!(percentage(&[]), 0);
        assert_eq!(percentage(&[Incorrect, Incorrect, Incorrect]), 0);
        assert_eq!(percentage(&[CompletelyCorrect; 4]), 100);
    }

    #[test]
    fn test_percentage_truncates_instead_of_rounding() {
        // 20/30 = 66.7% → 60, 25/30 = 83.3% → 80, 15/20 = 75% → 70
        assert_eq!(percentage(&[CompletelyCorrect, CompletelyCorrect, Incorrect]), 60);
        assert_eq!(
            percentage(&[CompletelyCorrect, CompletelyCorrect, PartiallyCorrect]),
            80
        );
        assert_eq!(percentage(&[CompletelyCorrect, PartiallyCorrect]), 70);
    }

    #[test]
    fn test_score_is_always_a_multiple_of_ten_in_range() {
        let options = [CompletelyCorrect, PartiallyCorrect, Incorrect];
        for a in options {
            for b in options {
                for c in options {
                    for dk in 0..=3usize {
                        let screening = Screening {
                            non_answers: (0..3).map(|i| i < dk).collect(),
                            dont_know_count: dk,
                        };
                        let score = score_classifications(&[a, b, c], &screening);
                        assert_eq!(score % 10, 0);
                        assert!(score <= 100);
                    }
                }
            }
        }
    }

    #[test]
    fn test_non_answer_detection() {
        assert!(is_non_answer(""));
        assert!(is_non_answer("   \n"));
        assert!(is_non_answer("Honestly, I don't know."));
        assert!(is_non_answer("I DON\u{2019}T KNOW"));
        assert!(is_non_answer("no idea tbh"));
        assert!(is_non_answer("I'm sorry, I cannot answer this"));
        assert!(!is_non_answer("A mutex guards shared state."));
    }

    #[test]
    fn test_screening_threshold_is_seventy_percent() {
        let mostly = screen_answers(&sheet(&["no idea", "not sure", "", "A real answer"]));
        assert_eq!(mostly.dont_know_count, 3);
        assert!(mostly.is_degenerate()); // 3/4 = 75%

        let some = screen_answers(&sheet(&["no idea", "x", "y"]));
        assert!(!some.is_degenerate()); // 1/3

        let exactly = Screening {
            non_answers: vec![true; 7].into_iter().chain(vec![false; 3]).collect(),
            dont_know_count: 7,
        };
        assert!(exactly.is_degenerate()); // 7/10

        assert!(!screen_answers(&AnswerSheet::default()).is_degenerate());
    }

    #[test]
    fn test_penalty_applies_only_above_fifty() {
        assert_eq!(apply_dont_know_penalty(50, 1, 3), 50);
        assert_eq!(apply_dont_know_penalty(100, 0, 3), 100);
        // 60 * (1 - 1/3 * 0.5) = 50
        assert_eq!(apply_dont_know_penalty(60, 1, 3), 50);
        // 100 * (1 - 1/4 * 0.5) = 87.5 → 80
        assert_eq!(apply_dont_know_penalty(100, 1, 4), 80);
    }

    #[test]
    fn test_non_answer_is_forced_incorrect_by_position() {
        let screening = Screening {
            non_answers: vec![false, true, false],
            dont_know_count: 1,
        };
        // Model claims all three correct; middle one is a non-answer.
        // 20/30 → 60, then penalty 60 * 5/6 = 50.
        let score = score_classifications(&[CompletelyCorrect; 3], &screening);
        assert_eq!(score, 50);
    }

    #[test]
    fn test_feedback_thresholds() {
        assert!(feedback_for_score(100).starts_with("Excellent"));
        assert!(feedback_for_score(90).starts_with("Excellent"));
        assert!(feedback_for_score(70).starts_with("Good"));
        assert!(feedback_for_score(50).starts_with("Adequate"));
        assert!(feedback_for_score(30).starts_with("Below average"));
        assert!(feedback_for_score(20).starts_with("Poor"));
    }

    #[test]
    fn test_score_reply_pads_missing_verdicts_as_incorrect() {
        let result = score_reply(&no_screening(4), "Answer 1: Completely correct\nAnswer 2: Completely correct");
        assert_eq!(result.score, 50);
        assert_eq!(result.evaluated_answers, 4);
        assert_eq!(result.status, EvaluationStatus::Success);
    }

    #[test]
    fn test_answer_sheet_keeps_request_order() {
        let sheet: AnswerSheet = serde_json::from_value(json!({
            "Zeta question?": "z",
            "Alpha question?": "a",
            "Mid question?": null
        }))
        .unwrap();
        let questions: Vec<&str> = sheet.pairs().iter().map(|p| p.question.as_str()).collect();
        assert_eq!(questions, vec!["Zeta question?", "Alpha question?", "Mid question?"]);
        assert_eq!(sheet.pairs()[2].answer, "");
    }

    #[test]
    fn test_answer_sheet_rejects_non_string_answers() {
        let result: Result<AnswerSheet, _> = serde_json::from_value(json!({"Q?": 42}));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_degenerate_sheet_skips_the_model() {
        let model = Arc::new(ScriptedModel::new(["Answer 1: Completely correct"]));
        let engine = ScoringEngine::new(model.clone());

        let result = engine
            .evaluate(&sheet(&["I don't know", "no idea", "not sure"]))
            .await
            .unwrap();

        assert_eq!(result.score, 10);
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_one_dont_know_in_three_is_graded_and_penalised() {
        let model = Arc::new(ScriptedModel::new([
            "Answer 1: Completely correct\nAnswer 2: Completely correct\nAnswer 3: Completely correct",
        ]));
        let engine = ScoringEngine::new(model.clone());

        let result = engine
            .evaluate(&sheet(&[
                "RAII frees resources on drop.",
                "I don't know",
                "Send means safe to move across threads.",
            ]))
            .await
            .unwrap();

        assert_eq!(model.call_count(), 1);
        assert_eq!(result.score, 50);
        assert!(result.feedback.starts_with("Adequate"));
    }

    #[tokio::test]
    async fn test_prompt_numbers_answers_in_sheet_order() {
        let model = Arc::new(ScriptedModel::new(["Answer 1: Correct\nAnswer 2: Correct"]));
        let engine = ScoringEngine::new(model.clone());

        engine
            .evaluate(&sheet(&["first answer", "second answer"]))
            .await
            .unwrap();

        let prompt = &model.transcript(0)[1].content;
        let first = prompt.find("Candidate response 1: first answer").unwrap();
        let second = prompt.find("Candidate response 2: second answer").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn test_gateway_failure_becomes_evaluation_error() {
        let model = Arc::new(ScriptedModel::failing(LlmError::MissingCredentials));
        let engine = ScoringEngine::new(model);

        let err = engine.evaluate(&sheet(&["an answer"])).await.unwrap_err();
        assert!(matches!(err, EvaluationError::Gateway(LlmError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_empty_sheet_scores_zero_with_explanation() {
        let model = Arc::new(ScriptedModel::default());
        let engine = ScoringEngine::new(model.clone());

        let result = engine.evaluate(&AnswerSheet::default()).await.unwrap();
        assert_eq!(result.score, 0);
        assert_eq!(result.feedback, "No valid answers provided.");
        assert_eq!(model.call_count(), 0);
    }
}
