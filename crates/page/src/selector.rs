/// Tags whose text may be translated.
pub const TRANSLATABLE_TAGS: [&str; 14] = [
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "td",
    "th",
    "span",
    "a",
    "blockquote",
    "figcaption",
];

/// Containers whose whole subtree is left untouched.
pub const EXCLUDED_TAGS: [&str; 7] = ["script", "style", "noscript", "code", "pre", "textarea", "input"];

pub const MIN_TEXT_LENGTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub min_length: usize,
}

impl Default for Selection {
    fn default() -> Selection {
        Selection {
            min_length: MIN_TEXT_LENGTH,
        }
    }
}

impl Selection {
    pub fn new(min_length: usize) -> Selection {
        Selection { min_length }
    }

    pub fn is_candidate(&self, tag: &str) -> bool {
        TRANSLATABLE_TAGS.contains(&tag)
    }

    pub fn is_excluded(&self, tag: &str) -> bool {
        EXCLUDED_TAGS.contains(&tag)
    }

    /// Long enough once trimmed, and carrying at least one latin letter.
    pub fn accepts_text(&self, text: &str) -> bool {
        let text = text.trim();

        text.chars().count() >= self.min_length && text.chars().any(|c| c.is_ascii_alphabetic())
    }
}
