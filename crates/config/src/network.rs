use std::time::Duration;

use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct Network {
    /// Per-request timeout in milliseconds.
    #[validate(range(min = 1, message = "timeout should be greater than 0"))]
    pub timeout: u64,
    #[validate(url(message = "proxy should be a url"))]
    pub proxy: Option<String>,
}

impl Network {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}
