//! Scalar type inference and homogeneous array building.
//!
//! Type inference rules:
//! - Quoted tokens (single or double) → String, verbatim
//! - `true`/`yes`/`on` and `false`/`no`/`off` (lower, Title or UPPER case) → Bool
//! - `[+-]?[0-9]+` fitting in 64 bits → Integer
//! - Decimal or exponent literals, and `.inf`/`.nan` → Double
//! - Anything else, including the empty token → String
//!
//! A literal that does not fit the width being tried falls through to the
//! next rule, so an oversized integer becomes a Double.

use crate::{
    alloc::{try_push, try_string},
    error::{Limit, ParamError, Result},
    limits::ParserLimits,
    types::{ParameterType, ParameterValue},
};

/// A single inferred scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
}

impl Scalar {
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            Self::Bool(_) => ParameterType::Bool,
            Self::Integer(_) => ParameterType::Integer,
            Self::Double(_) => ParameterType::Double,
            Self::String(_) => ParameterType::String,
        }
    }
}

impl From<Scalar> for ParameterValue {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Bool(v) => ParameterValue::Bool(v),
            Scalar::Integer(v) => ParameterValue::Integer(v),
            Scalar::Double(v) => ParameterValue::Double(v),
            Scalar::String(v) => ParameterValue::String(v),
        }
    }
}

/// Infer the type of one raw token.
pub fn infer_scalar(text: &str, quoted: bool, limits: &ParserLimits) -> Result<Scalar> {
    limits.check_string(text)?;

    if quoted {
        return Ok(Scalar::String(try_string(text)?));
    }
    if let Some(v) = parse_bool(text) {
        return Ok(Scalar::Bool(v));
    }
    if let Some(v) = parse_integer(text) {
        return Ok(Scalar::Integer(v));
    }
    if let Some(v) = parse_double(text) {
        return Ok(Scalar::Double(v));
    }
    Ok(Scalar::String(try_string(text)?))
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" => Some(true),
        "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => Some(false),
        _ => None,
    }
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

fn strip_sign(text: &str) -> &str {
    text.strip_prefix(['+', '-']).unwrap_or(text)
}

fn parse_integer(text: &str) -> Option<i64> {
    let digits = strip_sign(text);
    if digits.is_empty() || !is_digits(digits) {
        return None;
    }
    text.parse().ok()
}

fn parse_double(text: &str) -> Option<f64> {
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => return Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => {}
    }

    let body = strip_sign(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !is_digits(whole) || !is_digits(fraction) {
        return None;
    }
    if let Some(exponent) = exponent {
        let exponent = strip_sign(exponent);
        if exponent.is_empty() || !is_digits(exponent) {
            return None;
        }
    }

    let value: f64 = text.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Accumulates the elements of one sequence into a homogeneous array.
///
/// Each element is inferred on its own. When the elements disagree on their
/// type the whole array falls back to a string array of the literal tokens.
/// The builder owns everything pushed so far; dropping it on an error releases
/// the partial array.
#[derive(Debug)]
pub struct ArrayBuilder {
    limits: ParserLimits,
    kind: Option<ParameterType>,
    mixed: bool,
    literals: Vec<String>,
    values: Vec<Scalar>,
}

impl ArrayBuilder {
    pub fn new(limits: &ParserLimits) -> Self {
        Self {
            limits: limits.clone(),
            kind: None,
            mixed: false,
            literals: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn push(&mut self, text: String, quoted: bool) -> Result<()> {
        if self.literals.len() >= self.limits.max_array_elements {
            return Err(ParamError::limit(
                Limit::ArrayElements,
                self.limits.max_array_elements,
            ));
        }

        let value = infer_scalar(&text, quoted, &self.limits)?;
        match self.kind {
            None => self.kind = Some(value.parameter_type()),
            Some(kind) if kind != value.parameter_type() => self.mixed = true,
            Some(_) => {}
        }

        try_push(&mut self.values, value)?;
        try_push(&mut self.literals, text)
    }

    pub fn finish(self) -> Result<ParameterValue> {
        let kind = match self.kind {
            Some(kind) if !self.mixed => kind,
            _ => return Ok(ParameterValue::StringArray(self.literals)),
        };

        let value = match kind {
            ParameterType::Bool => ParameterValue::BoolArray(collect(self.values, |s| match s {
                Scalar::Bool(v) => Some(v),
                _ => None,
            })?),
            ParameterType::Integer => {
                ParameterValue::IntegerArray(collect(self.values, |s| match s {
                    Scalar::Integer(v) => Some(v),
                    _ => None,
                })?)
            }
            ParameterType::Double => {
                ParameterValue::DoubleArray(collect(self.values, |s| match s {
                    Scalar::Double(v) => Some(v),
                    _ => None,
                })?)
            }
            _ => ParameterValue::StringArray(self.literals),
        };
        Ok(value)
    }
}

fn collect<T>(values: Vec<Scalar>, pick: impl Fn(Scalar) -> Option<T>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    out.try_reserve_exact(values.len())?;
    out.extend(values.into_iter().filter_map(pick));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParamErrorKind;

    fn infer(text: &str) -> Scalar {
        infer_scalar(text, false, &ParserLimits::default()).unwrap()
    }

    fn array(tokens: &[(&str, bool)]) -> ParameterValue {
        let mut builder = ArrayBuilder::new(&ParserLimits::default());
        for (text, quoted) in tokens {
            builder.push(text.to_string(), *quoted).unwrap();
        }
        builder.finish().unwrap()
    }

    #[test]
    fn test_quoted_is_always_string() {
        let limits = ParserLimits::default();
        assert_eq!(
            infer_scalar("0", true, &limits).unwrap(),
            Scalar::String("0".into())
        );
        assert_eq!(
            infer_scalar("true", true, &limits).unwrap(),
            Scalar::String("true".into())
        );
        assert_eq!(
            infer_scalar("", true, &limits).unwrap(),
            Scalar::String(String::new())
        );
    }

    #[test]
    fn test_bools() {
        for t in ["true", "True", "TRUE", "yes", "On"] {
            assert_eq!(infer(t), Scalar::Bool(true), "{}", t);
        }
        for f in ["false", "False", "FALSE", "no", "OFF"] {
            assert_eq!(infer(f), Scalar::Bool(false), "{}", f);
        }
        assert_eq!(infer("tRuE"), Scalar::String("tRuE".into()));
    }

    #[test]
    fn test_integers() {
        assert_eq!(infer("2438"), Scalar::Integer(2438));
        assert_eq!(infer("-7"), Scalar::Integer(-7));
        assert_eq!(infer("+7"), Scalar::Integer(7));
        assert_eq!(infer("9223372036854775807"), Scalar::Integer(i64::MAX));
        assert_eq!(infer("0x10"), Scalar::String("0x10".into()));
    }

    #[test]
    fn test_oversized_integer_falls_to_double() {
        assert_eq!(
            infer("9223372036854775808"),
            Scalar::Double(9223372036854775808.0)
        );
    }

    #[test]
    fn test_doubles() {
        assert_eq!(infer("2.34"), Scalar::Double(2.34));
        assert_eq!(infer("-0.5"), Scalar::Double(-0.5));
        assert_eq!(infer("1e3"), Scalar::Double(1000.0));
        assert_eq!(infer(".5"), Scalar::Double(0.5));
        assert_eq!(infer("3."), Scalar::Double(3.0));
        assert_eq!(infer("-.inf"), Scalar::Double(f64::NEG_INFINITY));
        assert!(matches!(infer(".nan"), Scalar::Double(v) if v.is_nan()));
    }

    #[test]
    fn test_double_overflow_falls_to_string() {
        assert_eq!(infer("1e999"), Scalar::String("1e999".into()));
    }

    #[test]
    fn test_strings() {
        assert_eq!(infer("x86_64"), Scalar::String("x86_64".into()));
        assert_eq!(infer("."), Scalar::String(".".into()));
        assert_eq!(infer("1.2.3"), Scalar::String("1.2.3".into()));
        assert_eq!(infer("inf"), Scalar::String("inf".into()));
        assert_eq!(infer("1e"), Scalar::String("1e".into()));
        assert_eq!(infer(""), Scalar::String(String::new()));
    }

    #[test]
    fn test_string_size_limit() {
        let limits = ParserLimits::default().with_max_string_size(3);
        let err = infer_scalar("abcd", true, &limits).unwrap_err();
        assert_eq!(err.kind(), ParamErrorKind::ResourceLimitExceeded);
    }

    #[test]
    fn test_homogeneous_arrays() {
        assert_eq!(
            array(&[("2438", false), ("2439", false), ("2440", false)]),
            ParameterValue::IntegerArray(vec![2438, 2439, 2440])
        );
        assert_eq!(
            array(&[("true", false), ("off", false)]),
            ParameterValue::BoolArray(vec![true, false])
        );
        assert_eq!(
            array(&[("1.5", false), ("2.0", false)]),
            ParameterValue::DoubleArray(vec![1.5, 2.0])
        );
        assert_eq!(
            array(&[("a", false), ("7", true)]),
            ParameterValue::StringArray(vec!["a".into(), "7".into()])
        );
    }

    #[test]
    fn test_mixed_array_keeps_literals() {
        assert_eq!(
            array(&[("and", false), ("7", false)]),
            ParameterValue::StringArray(vec!["and".into(), "7".into()])
        );
        assert_eq!(
            array(&[("1", false), ("2.50", false)]),
            ParameterValue::StringArray(vec!["1".into(), "2.50".into()])
        );
    }

    #[test]
    fn test_empty_array_is_string_array() {
        assert_eq!(array(&[]), ParameterValue::StringArray(vec![]));
    }

    #[test]
    fn test_array_element_limit() {
        let limits = ParserLimits::default().with_max_array_elements(2);
        let mut builder = ArrayBuilder::new(&limits);
        builder.push("1".into(), false).unwrap();
        builder.push("2".into(), false).unwrap();
        let err = builder.push("3".into(), false).unwrap_err();
        assert_eq!(err.kind(), ParamErrorKind::ResourceLimitExceeded);
        assert_eq!(builder.len(), 2);
    }
}
