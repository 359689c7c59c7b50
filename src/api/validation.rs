use crate::api::errors::ApiError;
use crate::services::codes::CLASS_CODE_LEN;

/// Rejected before any side effect; an inline message, not a system error.
pub(crate) fn validate_question_text(question: &str) -> Result<&str, ApiError> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("Question cannot be empty. Please enter content.".to_string()));
    }
    Ok(trimmed)
}

pub(crate) fn validate_answer_text(answer: &str) -> Result<&str, ApiError> {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        return Err(ApiError::UnprocessableEntity(
            "Answer cannot be empty. Please provide a valid response.".to_string(),
        ));
    }
    Ok(trimmed)
}

pub(crate) fn validate_class_code(class_code: &str) -> Result<String, ApiError> {
    let normalized = class_code.trim().to_uppercase();
    let valid = normalized.len() == CLASS_CODE_LEN
        && normalized.chars().all(|ch| ch.is_ascii_alphanumeric());
    if valid {
        Ok(normalized)
    } else {
        Err(ApiError::BadRequest("Invalid class code format. Check the code.".to_string()))
    }
}

pub(crate) fn validate_image_url(url: &str) -> Result<&str, ApiError> {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed)
    } else {
        Err(ApiError::BadRequest("Please provide a valid image URL".to_string()))
    }
}
