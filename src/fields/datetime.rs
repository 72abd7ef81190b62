use crate::core::PageBinding;
use crate::errors::Result;
use crate::fields::base::{FieldCore, FieldSpec};
use crate::fields::behavior::FieldBehavior;
use crate::fields::kind::{DateTimeType, FieldKind};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const TIME_FORMAT: &str = "%-I:%M %p";
const DATE_FORMAT: &str = "%m/%d/%Y";
const DATE_TIME_FORMAT: &str = "%m/%d/%Y %-I:%M %p";

const TIME_PATTERNS: &[&str] = &["%I:%M %p", "%I:%M:%S %p", "%H:%M", "%H:%M:%S"];
const DATE_PATTERNS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%d.%m.%Y"];
const DATE_TIME_PATTERNS: &[&str] = &[
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

impl DateTimeType {
    /// Rendering used when a value is written to the picker
    pub fn format(&self) -> &'static str {
        match self {
            DateTimeType::Time => TIME_FORMAT,
            DateTimeType::Date => DATE_FORMAT,
            DateTimeType::DateTime => DATE_TIME_FORMAT,
        }
    }

    pub fn render(&self, value: &NaiveDateTime) -> String {
        value.format(self.format()).to_string()
    }

    /// Parse picker text, trying this subtype's patterns before the others.
    ///
    /// The result is normalized: times sit on 0001-01-01, dates at midnight.
    pub fn parse_value(&self, raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let parsed = match self {
            DateTimeType::Time => parse_time(raw)
                .or_else(|| parse_date_time(raw))
                .or_else(|| parse_date(raw)),
            DateTimeType::Date => parse_date(raw)
                .or_else(|| parse_date_time(raw))
                .or_else(|| parse_time(raw)),
            DateTimeType::DateTime => parse_date_time(raw)
                .or_else(|| parse_date(raw))
                .or_else(|| parse_time(raw)),
        }?;
        self.normalize(parsed)
    }

    pub fn normalize(&self, value: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            DateTimeType::Time => Some(epoch_date()?.and_time(value.time())),
            DateTimeType::Date => Some(value.date().and_time(NaiveTime::MIN)),
            DateTimeType::DateTime => Some(value),
        }
    }
}

fn epoch_date() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1, 1, 1)
}

fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    let upper = raw.to_ascii_uppercase();
    TIME_PATTERNS
        .iter()
        .find_map(|pattern| NaiveTime::parse_from_str(&upper, pattern).ok())
        .and_then(|time| Some(epoch_date()?.and_time(time)))
}

fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    DATE_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDate::parse_from_str(raw, pattern).ok())
        .map(|date| date.and_time(NaiveTime::MIN))
}

fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    let upper = raw.to_ascii_uppercase();
    DATE_TIME_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(&upper, pattern).ok())
}

pub struct DateTimeField {
    core: FieldCore,
    date_time_type: DateTimeType,
}

impl DateTimeField {
    pub fn new(spec: FieldSpec, date_time_type: DateTimeType, binding: PageBinding) -> Result<Self> {
        Ok(Self {
            core: FieldCore::new(spec, binding)?,
            date_time_type,
        })
    }

    pub fn date_time_type(&self) -> DateTimeType {
        self.date_time_type
    }

    pub async fn set_value(&mut self, value: NaiveDateTime, debug: bool) -> Result<()> {
        let rendered = self.date_time_type.render(&value);
        self.set_raw(&rendered, debug).await
    }

    /// Write text to the picker exactly as given.
    pub async fn set_raw(&mut self, raw: &str, debug: bool) -> Result<()> {
        let container = self.require_container(debug).await?;
        let input = container.locator(self.value_selector()).first();
        self.core.enter_text(&input, raw, debug).await
    }

    /// Current value, or `None` when the picker text does not parse.
    pub async fn get_value(&mut self, debug: bool) -> Result<Option<NaiveDateTime>> {
        let container = self.require_container(debug).await?;
        let raw = container
            .locator(self.value_selector())
            .first()
            .input_value()
            .await?;
        let parsed = self.date_time_type.parse_value(&raw);
        if parsed.is_none() && !raw.trim().is_empty() {
            self.core
                .trace(debug, format!("'{}' is not a {:?}", raw, self.date_time_type));
        }
        Ok(parsed)
    }
}

#[async_trait]
impl FieldBehavior for DateTimeField {
    fn core(&self) -> &FieldCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut FieldCore {
        &mut self.core
    }

    fn kind(&self) -> FieldKind {
        FieldKind::DateTime(self.date_time_type)
    }
}
