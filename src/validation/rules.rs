//! Field rules and the record validator.

use super::{FieldViolation, ValidationError, ValidationResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("email pattern compiles")
});

const MAX_TEXT_LEN: usize = 10_000;

/// Constraint applied to a single present field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// String, trimmed, must not be empty.
    Text,
    /// String, trimmed, may be empty.
    FreeText,
    /// Exact membership in a fixed set of names.
    OneOf(&'static [&'static str]),
    /// Integer (JSON number or numeric string) within bounds.
    Integer { min: i64, max: Option<i64> },
    /// Number within inclusive bounds.
    Number { min: f64, max: f64 },
    /// Syntactically valid email address, trimmed.
    Email,
    /// Non-empty reference to another record. Numeric ids become strings.
    Identifier,
    /// Array of absolute http(s) URLs.
    UrlList,
}

/// Declares one allowed field of a payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub rule: Rule,
}

impl FieldSpec {
    pub const fn required(name: &'static str, rule: Rule) -> Self {
        Self {
            name,
            required: true,
            rule,
        }
    }

    pub const fn optional(name: &'static str, rule: Rule) -> Self {
        Self {
            name,
            required: false,
            rule,
        }
    }

    /// Same field and rule, but allowed to be absent.
    pub const fn as_optional(self) -> Self {
        Self {
            required: false,
            ..self
        }
    }
}

/// Validates `record` against `specs`.
///
/// Absent and `null` values count as missing. Fields not named in `specs` are
/// dropped from the normalized output.
pub fn validate_record(record: &Value, specs: &[FieldSpec]) -> ValidationResult<Map<String, Value>> {
    let Some(object) = record.as_object() else {
        return Err(ValidationError::single("body", "expected a JSON object"));
    };

    let mut normalized = Map::new();
    let mut violations = Vec::new();

    for spec in specs {
        match object.get(spec.name) {
            None | Some(Value::Null) => {
                if spec.required {
                    violations.push(FieldViolation::new(spec.name, "is required"));
                }
            }
            Some(value) => match apply_rule(spec.rule, value) {
                Ok(clean) => {
                    normalized.insert(spec.name.to_string(), clean);
                }
                Err(message) => violations.push(FieldViolation::new(spec.name, message)),
            },
        }
    }

    if violations.is_empty() {
        Ok(normalized)
    } else {
        Err(ValidationError::new(violations))
    }
}

fn apply_rule(rule: Rule, value: &Value) -> Result<Value, String> {
    match rule {
        Rule::Text => {
            let text = expect_str(value)?.trim();
            if text.is_empty() {
                return Err("must not be empty".to_string());
            }
            check_len(text)?;
            Ok(Value::String(text.to_string()))
        }
        Rule::FreeText => {
            let text = expect_str(value)?.trim();
            check_len(text)?;
            Ok(Value::String(text.to_string()))
        }
        Rule::OneOf(allowed) => {
            let text = expect_str(value)?;
            if allowed.contains(&text) {
                Ok(Value::String(text.to_string()))
            } else {
                Err(format!("must be one of: {}", allowed.join(", ")))
            }
        }
        Rule::Integer { min, max } => {
            let parsed = parse_integer(value).ok_or_else(|| integer_message(min, max))?;
            if parsed < min || max.is_some_and(|max| parsed > max) {
                return Err(integer_message(min, max));
            }
            Ok(Value::Number(Number::from(parsed)))
        }
        Rule::Number { min, max } => {
            let parsed = parse_number(value)
                .filter(|n| n.is_finite())
                .ok_or_else(|| format!("must be a number between {min} and {max}"))?;
            if parsed < min || parsed > max {
                return Err(format!("must be a number between {min} and {max}"));
            }
            Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| format!("must be a number between {min} and {max}"))
        }
        Rule::Email => {
            let text = expect_str(value)?.trim();
            if EMAIL_RE.is_match(text) {
                Ok(Value::String(text.to_string()))
            } else {
                Err("must be a valid email address".to_string())
            }
        }
        Rule::Identifier => match value {
            Value::String(s) if !s.trim().is_empty() => Ok(Value::String(s.trim().to_string())),
            Value::Number(n) if n.is_u64() || n.is_i64() => Ok(Value::String(n.to_string())),
            _ => Err("must be a non-empty identifier".to_string()),
        },
        Rule::UrlList => {
            let Some(items) = value.as_array() else {
                return Err("must be an array of URLs".to_string());
            };
            let mut urls = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                let url = item
                    .as_str()
                    .map(str::trim)
                    .filter(|s| is_http_url(s))
                    .ok_or_else(|| format!("item {idx} is not an http(s) URL"))?;
                urls.push(Value::String(url.to_string()));
            }
            Ok(Value::Array(urls))
        }
    }
}

fn expect_str(value: &Value) -> Result<&str, String> {
    value.as_str().ok_or_else(|| "must be a string".to_string())
}

fn check_len(text: &str) -> Result<(), String> {
    if text.chars().count() > MAX_TEXT_LEN {
        Err(format!("must be at most {MAX_TEXT_LEN} characters"))
    } else {
        Ok(())
    }
}

fn integer_message(min: i64, max: Option<i64>) -> String {
    match max {
        Some(max) => format!("must be an integer between {min} and {max}"),
        None => format!("must be an integer >= {min}"),
    }
}

fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
        }
        _ => None,
    }
}

/// `2.0` counts as an integer, `2.5` does not.
fn whole_number(n: f64) -> Option<i64> {
    let in_range = n >= i64::MIN as f64 && n < i64::MAX as f64;
    (n.is_finite() && n.fract() == 0.0 && in_range).then_some(n as i64)
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn is_http_url(candidate: &str) -> bool {
    reqwest::Url::parse(candidate)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}
