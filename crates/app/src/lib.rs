use std::sync::LazyLock;

use terminal_size::{Width, terminal_size};

pub const NAME: &str = "pagetrans";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub static LINE_LENGTH: LazyLock<usize> = LazyLock::new(|| {
    terminal_size()
        .map(|(Width(width), _)| width as usize)
        .unwrap_or(40)
});
pub const USER_AGENT: &str = concat!("pagetrans", "/", env!("CARGO_PKG_VERSION"));
