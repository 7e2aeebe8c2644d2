//! Record rendering
//!
//! A text template names the parts of a record with `%placeholder%`
//! markers:
//!
//! | placeholder | output |
//! |-------------|--------|
//! | `%nano%`    | nanoseconds since the Unix epoch |
//! | `%unix%`    | whole seconds since the Unix epoch |
//! | `%time%`    | `2025-01-08 10:30:45.123`, UTC, millisecond precision |
//! | `%level%`   | severity label, e.g. `WARNING` |
//! | `%body%`    | the message body |
//!
//! Anything else between percent signs is copied through untouched, as is
//! a lone `%`. Substitution is a single left-to-right pass, so a body that
//! itself contains `%level%` is written verbatim.

use super::record::LogRecord;
use chrono::{TimeZone, Utc};
use std::fmt::Write;
use std::sync::Arc;

/// Template used when neither the record nor the configuration supplies one
pub const DEFAULT_TEMPLATE: &str = "%time% [%level%] %body%";

/// strftime pattern behind `%time%`
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// How a record is turned into text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// Placeholder template
    ///
    /// Example: `%time% [%level%] %body%` renders as
    /// `2025-01-08 10:30:45.123 [INFO] Request processed`
    Text(Arc<str>),

    /// JSON object with `time`, `level` and `body`
    ///
    /// Example: `{"time":1736332245123000000,"level":"INFO","body":"Request processed"}`
    Json,
}

impl OutputFormat {
    pub fn text(template: impl AsRef<str>) -> Self {
        OutputFormat::Text(Arc::from(template.as_ref()))
    }

    pub fn is_json(&self) -> bool {
        matches!(self, OutputFormat::Json)
    }

    /// Format a record according to this output format
    pub fn format(&self, record: &LogRecord) -> String {
        match self {
            OutputFormat::Text(template) => render_template(template, record),
            OutputFormat::Json => serde_json::to_string(record).unwrap_or_default(),
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::text(DEFAULT_TEMPLATE)
    }
}

/// Render a record with its own format snapshot
///
/// Records that never went through `submit` carry no snapshot and fall back
/// to [`DEFAULT_TEMPLATE`].
pub fn render(record: &LogRecord) -> String {
    match record.format {
        Some(ref format) => format.format(record),
        None => render_template(DEFAULT_TEMPLATE, record),
    }
}

#[derive(Debug, Clone, Copy)]
enum Placeholder {
    Nano,
    Unix,
    Time,
    Level,
    Body,
}

impl Placeholder {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "nano" => Some(Placeholder::Nano),
            "unix" => Some(Placeholder::Unix),
            "time" => Some(Placeholder::Time),
            "level" => Some(Placeholder::Level),
            "body" => Some(Placeholder::Body),
            _ => None,
        }
    }

    fn write_to(self, record: &LogRecord, out: &mut String) {
        // Writing into a String cannot fail
        let _ = match self {
            Placeholder::Nano => write!(out, "{}", record.timestamp),
            Placeholder::Unix => write!(out, "{}", record.timestamp.div_euclid(1_000_000_000)),
            Placeholder::Time => write!(
                out,
                "{}",
                Utc.timestamp_nanos(record.timestamp).format(TIME_FORMAT)
            ),
            Placeholder::Level => {
                out.push_str(record.level.to_str());
                Ok(())
            }
            Placeholder::Body => {
                out.push_str(&record.body);
                Ok(())
            }
        };
    }
}

fn render_template(template: &str, record: &LogRecord) -> String {
    let mut out = String::with_capacity(template.len() + record.body.len() + 32);
    let mut rest = template;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let placeholder = after
            .find('%')
            .and_then(|end| Placeholder::parse(&after[..end]).map(|p| (p, end)));

        match placeholder {
            Some((placeholder, end)) => {
                placeholder.write_to(record, &mut out);
                rest = &after[end + 1..];
            }
            None => {
                // Not a placeholder; the closing '%' may open the next one
                out.push('%');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
