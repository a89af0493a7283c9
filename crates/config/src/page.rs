use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct Page {
    /// Minimum trimmed character count of a translatable element.
    #[validate(range(min = 1, message = "min_length should be greater than 0"))]
    pub min_length: usize,
}
