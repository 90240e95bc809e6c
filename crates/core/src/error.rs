/// Errors raised by the domain layer. Every failure here is a rejected input.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_the_field() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("max_per_day", validator::ValidationError::new("range"));
        let err = CoreError::from(errors);
        assert!(err.to_string().starts_with("Validation failed: "));
        assert!(err.to_string().contains("max_per_day"));
    }
}
