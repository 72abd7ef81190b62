use crate::core::PageBinding;
use crate::errors::{EngineError, Result};
use crate::fields::base::{FieldCore, FieldSpec};
use crate::fields::behavior::FieldBehavior;
use crate::fields::kind::{FieldKind, NumberType};
use async_trait::async_trait;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// A number supplied to or read from a numeric field, tagged with its subtype.
///
/// Decimals are exact, so a value survives the trip through the page unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberValue {
    Integer(i64),
    Decimal(Decimal),
}

impl NumberValue {
    pub fn number_type(&self) -> NumberType {
        match self {
            NumberValue::Integer(_) => NumberType::Integer,
            NumberValue::Decimal(_) => NumberType::Decimal,
        }
    }
}

/// Invariant rendering: no grouping, `.` as the decimal separator.
impl fmt::Display for NumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberValue::Integer(value) => write!(f, "{}", value),
            NumberValue::Decimal(value) => write!(f, "{}", value),
        }
    }
}

impl From<i64> for NumberValue {
    fn from(value: i64) -> Self {
        NumberValue::Integer(value)
    }
}

impl From<Decimal> for NumberValue {
    fn from(value: Decimal) -> Self {
        NumberValue::Decimal(value)
    }
}

pub struct NumberField {
    core: FieldCore,
    number_type: NumberType,
}

impl NumberField {
    pub fn new(spec: FieldSpec, number_type: NumberType, binding: PageBinding) -> Result<Self> {
        Ok(Self {
            core: FieldCore::new(spec, binding)?,
            number_type,
        })
    }

    pub fn number_type(&self) -> NumberType {
        self.number_type
    }

    /// Type the value into the field.
    ///
    /// The value's subtype must equal the declared one; a mismatch is
    /// reported before the page is touched.
    pub async fn set_value(&mut self, value: NumberValue, debug: bool) -> Result<()> {
        if value.number_type() != self.number_type {
            return Err(EngineError::NumberTypeMismatch {
                field: self.core.describe(),
                declared: format!("{:?}", self.number_type),
                supplied: format!("{:?}", value.number_type()),
            });
        }

        let container = self.require_container(debug).await?;
        let input = container.locator(self.value_selector()).first();
        self.core.enter_text(&input, &value.to_string(), debug).await
    }

    pub async fn set_integer(&mut self, value: i64, debug: bool) -> Result<()> {
        self.set_value(NumberValue::Integer(value), debug).await
    }

    pub async fn set_decimal(&mut self, value: Decimal, debug: bool) -> Result<()> {
        self.set_value(NumberValue::Decimal(value), debug).await
    }

    /// Current value typed by the declared subtype, or `None` when the
    /// input is blank or not a number of that subtype.
    pub async fn get_value(&mut self, debug: bool) -> Result<Option<NumberValue>> {
        let container = self.require_container(debug).await?;
        let raw = container
            .locator(self.value_selector())
            .first()
            .input_value()
            .await?;
        let parsed = parse_number(&raw, self.number_type);
        if parsed.is_none() && !raw.trim().is_empty() {
            self.core.trace(
                debug,
                format!("'{}' is not a {:?} number", raw, self.number_type),
            );
        }
        Ok(parsed)
    }
}

fn comma_grouped() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("static pattern")
    })
}

fn space_grouped() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?\d{1,3}( \d{3})+(\.\d+)?$").expect("static pattern")
    })
}

/// Digits of `raw` in invariant form, with thousands grouping removed.
///
/// Grouping is accepted only when it is unambiguous: commas or spaces
/// every three digits, and a lone comma only alongside a decimal point.
/// `"1,5"` and `"1,234"` could be decimal commas and are rejected.
fn invariant_digits(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let spaced: String = trimmed
        .chars()
        .map(|c| if c == '\u{a0}' || c == '\u{202f}' { ' ' } else { c })
        .collect();
    if !spaced.contains([',', ' ']) {
        return Some(spaced);
    }

    let commas = spaced.matches(',').count();
    let grouped = (comma_grouped().is_match(&spaced) && (commas > 1 || spaced.contains('.')))
        || space_grouped().is_match(&spaced);
    grouped.then(|| spaced.replace([',', ' '], ""))
}

/// Parse a field reading as a number of the given subtype.
///
/// Integer fields accept a decimal reading only when its fraction is zero.
pub fn parse_number(raw: &str, number_type: NumberType) -> Option<NumberValue> {
    let digits = invariant_digits(raw)?;
    match number_type {
        NumberType::Integer => match digits.parse::<i64>() {
            Ok(value) => Some(NumberValue::Integer(value)),
            Err(_) => Decimal::from_str(&digits)
                .ok()
                .filter(|value| value.fract().is_zero())
                .and_then(|value| value.to_i64())
                .map(NumberValue::Integer),
        },
        NumberType::Decimal => Decimal::from_str(&digits).ok().map(NumberValue::Decimal),
    }
}

#[async_trait]
impl FieldBehavior for NumberField {
    fn core(&self) -> &FieldCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut FieldCore {
        &mut self.core
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Number(self.number_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::selectors;
    use crate::testing::{field_container, FakeElement, FakePage};

    fn mounted(page: &FakePage, number_type: NumberType) -> (NumberField, FakeElement) {
        let input = FakeElement::new();
        page.add(
            &selectors::by_code("crt-number-input", "Amount"),
            field_container("Amount:").with_child(selectors::TEXT_VALUE, input.clone()),
        );
        let field = NumberField::new(
            FieldSpec::new("Amount", "Amount"),
            number_type,
            PageBinding::new(page.handle()),
        )
        .unwrap();
        (field, input)
    }

    fn decimal(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    #[test]
    fn test_parse_number() {
        use NumberType::{Decimal as Dec, Integer as Int};

        assert_eq!(parse_number("42", Int), Some(NumberValue::Integer(42)));
        assert_eq!(
            parse_number(" 12.5 ", Dec),
            Some(NumberValue::Decimal(decimal("12.5")))
        );
        assert_eq!(
            parse_number("1,234.5", Dec),
            Some(NumberValue::Decimal(decimal("1234.5")))
        );
        assert_eq!(parse_number("1,234,567", Int), Some(NumberValue::Integer(1234567)));
        assert_eq!(parse_number("1 000", Int), Some(NumberValue::Integer(1000)));
        assert_eq!(parse_number("1\u{a0}000", Int), Some(NumberValue::Integer(1000)));
        assert_eq!(parse_number("1500.00", Int), Some(NumberValue::Integer(1500)));
        assert_eq!(parse_number("1500.5", Int), None);
        assert_eq!(parse_number("", Dec), None);
        assert_eq!(parse_number("n/a", Dec), None);
    }

    #[test]
    fn test_ambiguous_grouping_is_rejected() {
        assert_eq!(parse_number("1,5", NumberType::Decimal), None);
        assert_eq!(parse_number("1,234", NumberType::Decimal), None);
        assert_eq!(parse_number("12,34.5", NumberType::Decimal), None);
        assert_eq!(parse_number("1 5", NumberType::Integer), None);
    }

    #[test]
    fn test_values_render_without_grouping() {
        assert_eq!(NumberValue::Integer(1234567).to_string(), "1234567");
        assert_eq!(NumberValue::Decimal(decimal("12.5")).to_string(), "12.5");
        assert_eq!(NumberValue::Decimal(decimal("-0.25")).to_string(), "-0.25");
    }

    #[tokio::test(start_paused = true)]
    async fn test_integer_round_trip() {
        let page = FakePage::new();
        let (mut field, input) = mounted(&page, NumberType::Integer);

        field.set_integer(1500, false).await.unwrap();
        assert_eq!(input.fills(), vec!["1500"]);
        assert_eq!(
            field.get_value(false).await.unwrap(),
            Some(NumberValue::Integer(1500))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_large_values_round_trip_exactly() {
        let page = FakePage::new();
        let (mut integer, _) = mounted(&page, NumberType::Integer);
        integer.set_integer(9_007_199_254_740_993, false).await.unwrap();
        assert_eq!(
            integer.get_value(false).await.unwrap(),
            Some(NumberValue::Integer(9_007_199_254_740_993))
        );

        let page = FakePage::new();
        let (mut amount, input) = mounted(&page, NumberType::Decimal);
        let precise = decimal("12345678901234.567890123");
        amount.set_decimal(precise, false).await.unwrap();
        assert_eq!(input.fills(), vec!["12345678901234.567890123"]);
        assert_eq!(
            amount.get_value(false).await.unwrap(),
            Some(NumberValue::Decimal(precise))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_decimal_round_trip() {
        let page = FakePage::new();
        let (mut field, _) = mounted(&page, NumberType::Decimal);

        field.set_decimal(decimal("12.75"), false).await.unwrap();
        assert_eq!(
            field.get_value(false).await.unwrap(),
            Some(NumberValue::Decimal(decimal("12.75")))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_subtype_mismatch_is_rejected_before_touching_the_page() {
        let page = FakePage::new();
        let (mut field, input) = mounted(&page, NumberType::Integer);

        let err = field.set_decimal(decimal("1.5"), false).await.unwrap_err();
        match err {
            EngineError::NumberTypeMismatch {
                declared, supplied, ..
            } => {
                assert_eq!(declared, "Integer");
                assert_eq!(supplied, "Decimal");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(input.fills().is_empty());
        assert_eq!(page.wait_count(&selectors::by_code("crt-number-input", "Amount")), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_or_garbage_reads_as_none() {
        let page = FakePage::new();
        let (mut field, input) = mounted(&page, NumberType::Decimal);

        assert_eq!(field.get_value(false).await.unwrap(), None);
        input.set_value("abc");
        assert_eq!(field.get_value(false).await.unwrap(), None);
        input.set_value("1,5");
        assert_eq!(field.get_value(false).await.unwrap(), None);
        input.set_value("2,500.75");
        assert_eq!(
            field.get_value(false).await.unwrap(),
            Some(NumberValue::Decimal(decimal("2500.75")))
        );
    }
}
