pub mod scripts;
pub mod selectors;
pub mod text;

pub use text::{is_truthy_attribute, normalize_label, normalize_placeholder};
