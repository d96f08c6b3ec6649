pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::interview::handlers as interview;
use crate::memory::handlers as memory;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview API
        .route(
            "/api/v1/interview/questions",
            post(interview::handle_generate_questions),
        )
        .route(
            "/api/v1/interview/check-answers",
            post(interview::handle_check_answers),
        )
        .route(
            "/api/v1/interview/complete-evaluation",
            post(interview::handle_complete_evaluation),
        )
        // Resume API
        .route("/api/v1/resumes/build", post(resume::handle_build_resume))
        .route("/api/v1/resumes/update", post(resume::handle_update_resume))
        .route("/api/v1/resumes/chat", post(resume::handle_chat))
        .route(
            "/api/v1/users/:user_id/resumes",
            get(resume::handle_resume_history),
        )
        .route(
            "/api/v1/users/:user_id/resumes/:memory_id",
            get(resume::handle_get_resume),
        )
        // Memory API
        .route("/api/v1/memory/:user_id", get(memory::handle_list_memories))
        .route(
            "/api/v1/memory/:user_id/:memory_id",
            delete(memory::handle_delete_memory),
        )
        .with_state(state)
}
