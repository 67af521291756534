//! Field-level validation shared by every entity.
//!
//! # Responsibility
//! - Express column constraints (length, precision, range, format) as checks
//!   that run before any SQL mutation.
//! - Collect every failing field instead of stopping at the first one.
//!
//! # Invariants
//! - Lengths are counted in characters, matching SQLite `length()` on TEXT.
//! - Decimal precision follows "max digits / decimal places" semantics: a
//!   value fits when its fractional digits and whole digits both fit.
//! - Counts, prices and orderings are non-negative and capped at
//!   [`POSITIVE_INT_MAX`], matching the `CHECK` constraints in the schema.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::fmt::{Display, Formatter};
use thiserror::Error;

static E164_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9][0-9]{1,14}$").expect("valid e164 regex"));

/// Largest value accepted by positive integer columns.
pub const POSITIVE_INT_MAX: i64 = 2_147_483_647;

/// Precision declaration for a fixed-point column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalSpec {
    pub max_digits: u32,
    pub decimal_places: u32,
}

impl DecimalSpec {
    pub const fn new(max_digits: u32, decimal_places: u32) -> Self {
        Self {
            max_digits,
            decimal_places,
        }
    }

    /// Renders `value` with exactly `decimal_places` fractional digits.
    ///
    /// Callers must validate first; a value with more fractional digits is
    /// rounded.
    pub fn format(&self, value: Decimal) -> String {
        let mut scaled = value.round_dp(self.decimal_places);
        scaled.rescale(self.decimal_places);
        scaled.to_string()
    }
}

/// Why one field was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldErrorKind {
    #[error("this field cannot be blank")]
    Required,
    #[error("ensure this value has at most {max} characters (it has {actual})")]
    MaxLength { max: usize, actual: usize },
    #[error("ensure there are no more than {max} digits in total")]
    MaxDigits { max: u32 },
    #[error("ensure there are no more than {max} decimal places")]
    MaxDecimalPlaces { max: u32 },
    #[error("ensure there are no more than {max} digits before the decimal point")]
    MaxWholeDigits { max: u32 },
    #[error("ensure this value is greater than or equal to {min}")]
    MinValue { min: i64 },
    #[error("ensure this value is less than or equal to {max}")]
    MaxValue { max: i64 },
    #[error("enter a phone number in E.164 format, e.g. +821012345678")]
    InvalidPhone,
    #[error("upload a valid image: {0}")]
    InvalidImage(String),
}

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub kind: FieldErrorKind,
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.kind)
    }
}

/// Schema violation carrying every failing field of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    /// Builds an error for a single field.
    pub fn single(field: &'static str, kind: FieldErrorKind) -> Self {
        Self {
            errors: vec![FieldError { field, kind }],
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Returns the first error recorded for `field`.
    pub fn field(&self, field: &str) -> Option<&FieldErrorKind> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| &error.kind)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.field(field).is_some()
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for error in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
            first = false;
        }
        Ok(())
    }
}

/// Accumulates field errors for one entity.
#[derive(Debug, Default)]
pub(crate) struct FieldChecks {
    errors: Vec<FieldError>,
}

impl FieldChecks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, field: &'static str, kind: FieldErrorKind) {
        self.errors.push(FieldError { field, kind });
    }

    /// Required string with a character limit.
    pub(crate) fn text(&mut self, field: &'static str, value: &str, max: usize) -> &mut Self {
        if value.trim().is_empty() {
            self.push(field, FieldErrorKind::Required);
        } else {
            self.max_chars(field, value, max);
        }
        self
    }

    /// Required long text without a limit.
    pub(crate) fn long_text(&mut self, field: &'static str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(field, FieldErrorKind::Required);
        }
        self
    }

    /// Optional string; blank values are allowed, long ones are not.
    pub(crate) fn optional_text(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        max: usize,
    ) -> &mut Self {
        if let Some(value) = value {
            self.max_chars(field, value, max);
        }
        self
    }

    fn max_chars(&mut self, field: &'static str, value: &str, max: usize) {
        let actual = value.chars().count();
        if actual > max {
            self.push(field, FieldErrorKind::MaxLength { max, actual });
        }
    }

    pub(crate) fn decimal(
        &mut self,
        field: &'static str,
        value: Decimal,
        spec: DecimalSpec,
    ) -> &mut Self {
        if let Some(kind) = check_decimal(value, spec) {
            self.push(field, kind);
        }
        self
    }

    pub(crate) fn range(&mut self, field: &'static str, value: i64, min: i64, max: i64) -> &mut Self {
        if value < min {
            self.push(field, FieldErrorKind::MinValue { min });
        } else if value > max {
            self.push(field, FieldErrorKind::MaxValue { max });
        }
        self
    }

    pub(crate) fn optional_range(
        &mut self,
        field: &'static str,
        value: Option<i64>,
        min: i64,
        max: i64,
    ) -> &mut Self {
        match value {
            Some(value) => self.range(field, value, min, max),
            None => self,
        }
    }

    pub(crate) fn phone(&mut self, field: &'static str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(field, FieldErrorKind::Required);
        } else if !E164_RE.is_match(value) {
            self.push(field, FieldErrorKind::InvalidPhone);
        }
        self
    }

    pub(crate) fn finish(&mut self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(ValidationError {
            errors: std::mem::take(&mut self.errors),
        })
    }
}

/// Checks `value` against a fixed-point column declaration.
///
/// Trailing zeros are ignored, so `1.50` counts two digits.
pub fn check_decimal(value: Decimal, spec: DecimalSpec) -> Option<FieldErrorKind> {
    let normalized = value.normalize();
    let mantissa_digits = if normalized.is_zero() {
        0
    } else {
        normalized.mantissa().unsigned_abs().to_string().len() as u32
    };
    let scale = normalized.scale();

    let (digits, decimals) = if scale > mantissa_digits {
        (scale, scale)
    } else {
        (mantissa_digits, scale)
    };
    let whole_digits = digits - decimals;

    if digits > spec.max_digits {
        return Some(FieldErrorKind::MaxDigits {
            max: spec.max_digits,
        });
    }
    if decimals > spec.decimal_places {
        return Some(FieldErrorKind::MaxDecimalPlaces {
            max: spec.decimal_places,
        });
    }
    if whole_digits > spec.max_digits - spec.decimal_places {
        return Some(FieldErrorKind::MaxWholeDigits {
            max: spec.max_digits - spec.decimal_places,
        });
    }
    None
}
