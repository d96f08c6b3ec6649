pub mod handlers;
pub mod pdf;
pub mod prompts;
pub mod questions;
pub mod scoring;
