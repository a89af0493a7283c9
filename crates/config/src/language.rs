use serde::Deserialize;
use validator::Validate;

use super::helper::not_blank;

#[derive(Debug, Deserialize, Validate)]
pub struct Language {
    #[validate(custom(function = "not_blank"))]
    pub source: String,
    #[validate(custom(function = "not_blank"))]
    pub target: String,
}
