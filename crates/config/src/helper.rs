use validator::ValidationError;

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let err = ValidationError::new("blank").with_message("should not be blank".into());
        return Err(err);
    }

    Ok(())
}
