//! Resume text extraction from uploaded PDFs.

use bytes::Bytes;
use tracing::{error, info};

use crate::errors::AppError;

const ACCEPTED_CONTENT_TYPES: &[&str] = &["application/pdf", "application/x-pdf"];

/// Rejects uploads whose declared content type is not a PDF.
pub fn ensure_pdf(content_type: Option<&str>) -> Result<(), AppError> {
    let declared = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .unwrap_or_default();

    if ACCEPTED_CONTENT_TYPES.contains(&declared.as_str()) {
        Ok(())
    } else {
        Err(AppError::UnsupportedMediaType(
            "File is not a valid PDF".to_string(),
        ))
    }
}

/// Extracts the text layer of a PDF. Parsing runs on the blocking pool since
/// pdf-extract is CPU-bound and may panic on malformed input.
pub async fn extract_text(data: Bytes) -> Result<String, AppError> {
    let size = data.len();
    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
        .await
        .map_err(|e| {
            error!("PDF extraction task failed: {e}");
            if e.is_panic() {
                unreadable()
            } else {
                AppError::Internal(anyhow::Error::new(e).context("PDF extraction task was cancelled"))
            }
        })?
        .map_err(|e| {
            error!("Error processing PDF: {e}");
            unreadable()
        })?;

    if extracted.trim().is_empty() {
        return Err(unreadable());
    }

    info!("Extracted {} chars from {size}-byte PDF", extracted.len());
    Ok(extracted)
}

fn unreadable() -> AppError {
    AppError::UnprocessableEntity(
        "Could not extract text from PDF. The file may be empty or corrupted.".to_string(),
    )
}
