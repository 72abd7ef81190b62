//! Inline scripts passed to [`crate::core::Locator::evaluate`].

/// Assign `value` directly and notify listeners, bypassing simulated typing.
/// Used for controls whose value-holding input stays hidden behind a styled proxy.
pub const ASSIGN_VALUE: &str = r#"(element, value) => {
    const descriptor = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(element), 'value');
    if (descriptor && descriptor.set) {
        descriptor.set.call(element, value);
    } else {
        element.value = value;
    }
    element.dispatchEvent(new Event('input', { bubbles: true }));
    element.dispatchEvent(new Event('change', { bubbles: true }));
    return element.value;
}"#;

/// Simulated typing for browsers driven purely by script: focus, replace the
/// content (text for editable regions, value otherwise) and notify listeners.
pub const FILL_VALUE: &str = r#"(element, value) => {
    element.focus();
    if (element.isContentEditable) {
        element.textContent = value;
    } else {
        const descriptor = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(element), 'value');
        if (descriptor && descriptor.set) {
            descriptor.set.call(element, value);
        } else {
            element.value = value;
        }
    }
    element.dispatchEvent(new Event('input', { bubbles: true }));
    element.dispatchEvent(new Event('change', { bubbles: true }));
    return value;
}"#;
