use regex::Regex;
use std::sync::OnceLock;

fn label_decoration() -> &'static Regex {
    static DECORATION: OnceLock<Regex> = OnceLock::new();
    DECORATION.get_or_init(|| Regex::new(r"[\s*:]+$").expect("static pattern"))
}

/// Trim a caption and strip the trailing `*`/`:` decoration used for
/// required markers and label punctuation.
pub fn normalize_label(raw: &str) -> String {
    let trimmed = raw.trim();
    label_decoration().replace(trimmed, "").trim().to_string()
}

/// Blank and whitespace-only placeholders count as absent.
pub fn normalize_placeholder(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// HTML boolean attribute semantics: present means true unless spelled `false`.
pub fn is_truthy_attribute(value: Option<&str>) -> bool {
    match value {
        Some(value) => !value.trim().eq_ignore_ascii_case("false"),
        None => false,
    }
}

pub fn has_required_marker(class_list: Option<&str>) -> bool {
    has_class_marker(class_list, "required")
}

pub fn has_disabled_marker(class_list: Option<&str>) -> bool {
    has_class_marker(class_list, "disabled")
}

fn has_class_marker(class_list: Option<&str>, marker: &str) -> bool {
    let suffix = format!("-{}", marker);
    class_list
        .unwrap_or_default()
        .split_whitespace()
        .any(|token| token == marker || token.ends_with(&suffix))
}
