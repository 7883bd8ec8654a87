// src/posts/validators.rs

use super::models::*;
use crate::common::{ValidationResult, Validator};

const TITLE_MAX_LEN: usize = 200;
const CONTENT_MAX_LEN: usize = 10000;

// ============================================================================
// Post Validators
// ============================================================================

pub struct PostValidator;

fn validate_fields(title: &str, content: &str) -> ValidationResult {
    let mut result = ValidationResult::new();

    if title.trim().is_empty() {
        result.add_error("title", "Title is required");
    } else if title.len() > TITLE_MAX_LEN {
        result.add_error("title", "Title must be less than 200 characters");
    }

    if content.trim().is_empty() {
        result.add_error("content", "Content is required");
    } else if content.len() > CONTENT_MAX_LEN {
        result.add_error("content", "Content must be less than 10000 characters");
    }

    result
}

impl Validator<CreatePostRequest> for PostValidator {
    fn validate(&self, data: &CreatePostRequest) -> ValidationResult {
        validate_fields(&data.title, &data.content)
    }
}

impl Validator<UpdatePostRequest> for PostValidator {
    fn validate(&self, data: &UpdatePostRequest) -> ValidationResult {
        validate_fields(&data.title, &data.content)
    }
}
