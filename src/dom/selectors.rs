//! Markup conventions of the targeted component family.

/// Caption rendered inside a field container
pub const LABEL: &str = "label";

/// Attribute carrying the label when no caption element is rendered
pub const LABEL_ATTRIBUTE: &str = "aria-label";

pub const TEXT_VALUE: &str = "input, textarea";
pub const RICH_TEXT_VALUE: &str = "[contenteditable='true']";
pub const LOOKUP_VALUE: &str = "input";

pub const LOCK_ICON: &str = ".crt-readonly-icon, [data-icon='lock']";

pub const CHECKBOX_INPUT: &str = "input[type='checkbox']";
pub const CHECKBOX_WRAPPER: &str = ".crt-checkbox-box";
pub const CHECKBOX_LABEL: &str = ".crt-checkbox-label";

pub const EMAIL_INPUT: &str = "input";
pub const EMAIL_ADD_TRIGGER: &str = ".crt-email-add, [data-action='add-email']";
pub const EMAIL_LINK: &str = "a[href^='mailto:']";

pub const CLEAR_ICON: &str = ".crt-clear-button, [data-action='clear']";
pub const AUTOCOMPLETE_PANEL: &str = ".crt-autocomplete-panel, [role='listbox']";
pub const AUTOCOMPLETE_OPTION: &str = "[role='option']";

/// Identifier attributes read from an autocomplete option, in order
pub const OPTION_ID_ATTRIBUTES: [&str; 2] = ["data-item-id", "id"];
pub const SERVICE_OPTION_ID: &str = "lookup-service-item";
pub const ADD_NEW_ID_PREFIX: &str = "add-new-";
pub const ADD_NEW_TEXT_PREFIX: &str = "Add new";

pub const BUTTON_HOSTS: [&str; 2] = ["crt-button", "button"];

/// Union of the `element-name` and `id` forms for one host tag.
///
/// The rendered markup is inconsistent about which of the two attributes
/// carries the technical code, so both are always queried.
pub fn by_code(host: &str, code: &str) -> String {
    let code = escape(code);
    format!(
        r#"{host}[element-name="{code}"], {host}[id="{code}"]"#,
        host = host,
        code = code
    )
}

pub fn button(code: &str) -> String {
    BUTTON_HOSTS
        .iter()
        .map(|host| by_code(host, code))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_code_unions_both_attributes() {
        assert_eq!(
            by_code("crt-checkbox", "IsActive"),
            r#"crt-checkbox[element-name="IsActive"], crt-checkbox[id="IsActive"]"#
        );
    }

    #[test]
    fn test_by_code_escapes_quotes() {
        assert_eq!(
            by_code("crt-input", r#"a"b"#),
            r#"crt-input[element-name="a\"b"], crt-input[id="a\"b"]"#
        );
    }

    #[test]
    fn test_button_covers_every_host() {
        let selector = button("SaveButton");
        assert!(selector.contains(r#"crt-button[element-name="SaveButton"]"#));
        assert!(selector.contains(r#"button[id="SaveButton"]"#));
        assert_eq!(selector.matches(", ").count(), 3);
    }
}
