//! Page side of the translator: picks translatable elements and rewrites them in place.

mod host;
mod html;
mod runner;
mod selector;

pub use host::{
    Channel, Document, Marker, ORIGINAL_TEXT_ATTR, TRANSLATED_CLASS, TRANSLATING_CLASS,
};
pub use html::{HtmlPage, STYLE_ID};
pub use runner::PageTranslator;
pub use selector::{EXCLUDED_TAGS, MIN_TEXT_LENGTH, Selection, TRANSLATABLE_TAGS};
