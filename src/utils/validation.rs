// file: src/utils/validation.rs
// description: data validation utilities and helpers
// reference: input validation patterns

use crate::error::{PipelineError, Result};

pub struct Validator;

impl Validator {
    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PipelineError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn validate_batch_size(size: usize) -> Result<()> {
        if size == 0 {
            return Err(PipelineError::Validation(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        if size > 10000 {
            return Err(PipelineError::Validation(
                "Batch size too large (max 10000)".to_string(),
            ));
        }

        Ok(())
    }

    pub fn validate_bucket_name(bucket: &str) -> Result<()> {
        if bucket.is_empty() {
            return Err(PipelineError::Validation(
                "Bucket name is empty".to_string(),
            ));
        }

        if bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            return Err(PipelineError::Validation(format!(
                "Invalid bucket name: {}",
                bucket
            )));
        }

        Ok(())
    }

    /// Object keys are relative, slash separated and never step outside their bucket.
    pub fn validate_object_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(PipelineError::Validation("Object key is empty".to_string()));
        }

        if key.starts_with('/') || key.contains('\\') || key.contains('\0') {
            return Err(PipelineError::Validation(format!(
                "Invalid object key: {}",
                key
            )));
        }

        if key.split('/').any(|segment| segment == "..") {
            return Err(PipelineError::Validation(format!(
                "Path traversal detected in object key: {}",
                key
            )));
        }

        Ok(())
    }

    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            None => text.to_string(),
            Some((idx, _)) => format!("{}...", &text[..idx]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(Validator::validate_url("https://example.com").is_ok());
        assert!(Validator::validate_url("http://example.com").is_ok());
        assert!(Validator::validate_url("example.com").is_err());
        assert!(Validator::validate_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_batch_size() {
        assert!(Validator::validate_batch_size(100).is_ok());
        assert!(Validator::validate_batch_size(0).is_err());
        assert!(Validator::validate_batch_size(10001).is_err());
    }

    #[test]
    fn test_validate_bucket_name() {
        assert!(Validator::validate_bucket_name("uploads").is_ok());
        assert!(Validator::validate_bucket_name("").is_err());
        assert!(Validator::validate_bucket_name("a/b").is_err());
        assert!(Validator::validate_bucket_name("..").is_err());
    }

    #[test]
    fn test_validate_object_key() {
        assert!(Validator::validate_object_key("incoming/users.csv").is_ok());
        assert!(Validator::validate_object_key("").is_err());
        assert!(Validator::validate_object_key("/etc/passwd").is_err());
        assert!(Validator::validate_object_key("incoming/../../secret.csv").is_err());
        assert!(Validator::validate_object_key("incoming/..data.csv").is_ok());
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(Validator::truncate_text("short", 10), "short");
        assert_eq!(
            Validator::truncate_text("this is a very long text", 10),
            "this is a ..."
        );
        assert_eq!(Validator::truncate_text("ééééé", 2), "éé...");
    }
}
