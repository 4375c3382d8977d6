//! Parameter default values.
//!
//! Parameters are stored by their stringified default, so the `Display`
//! output of [`ParamValue`] is part of the storage contract: the same value
//! must always render the same way.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A parameter default value.
///
/// Untagged so declarative files can write plain TOML values
/// (`voltage = 12`, `label = "left"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<ParamValue>),
    Null,
}

impl ParamValue {
    /// Parse a command-line style value.
    ///
    /// Tries bool, integer and finite float in that order and falls back to
    /// text, so `inf` and `NaN` stay text.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => return ParamValue::Bool(true),
            "false" => return ParamValue::Bool(false),
            "null" => return ParamValue::Null,
            _ => {}
        }
        if let Ok(i) = raw.parse::<i64>() {
            return ParamValue::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                return ParamValue::Float(f);
            }
        }
        ParamValue::Text(raw.to_string())
    }

    /// False for a non-finite float, here or inside a list.
    pub fn is_finite(&self) -> bool {
        match self {
            ParamValue::Float(x) => x.is_finite(),
            ParamValue::List(items) => items.iter().all(ParamValue::is_finite),
            _ => true,
        }
    }

    /// Get the value as text, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a float, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write_float(f, *x),
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            ParamValue::Null => f.write_str("null"),
        }
    }
}

/// Floats always show a fractional part: `12.0`, `1.0e20`, `1.0e-7`.
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    let repr = format!("{:?}", x);
    match repr.find('e') {
        Some(exp) if !repr[..exp].contains('.') => {
            write!(f, "{}.0{}", &repr[..exp], &repr[exp..])
        }
        _ => f.write_str(&repr),
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_stable() {
        assert_eq!(ParamValue::Int(12).to_string(), "12");
        assert_eq!(ParamValue::Float(12.0).to_string(), "12.0");
        assert_eq!(ParamValue::Float(0.5).to_string(), "0.5");
        assert_eq!(ParamValue::Bool(true).to_string(), "true");
        assert_eq!(ParamValue::Text("left".into()).to_string(), "left");
        assert_eq!(
            ParamValue::List(vec![1.into(), "a".into()]).to_string(),
            "[1, a]"
        );
        assert_eq!(ParamValue::Null.to_string(), "null");
    }

    #[test]
    fn test_parse() {
        assert_eq!(ParamValue::parse("12"), ParamValue::Int(12));
        assert_eq!(ParamValue::parse("-3"), ParamValue::Int(-3));
        assert_eq!(ParamValue::parse("2.5"), ParamValue::Float(2.5));
        assert_eq!(ParamValue::parse("false"), ParamValue::Bool(false));
        assert_eq!(ParamValue::parse("servo"), ParamValue::Text("servo".into()));
    }

    #[test]
    fn test_parse_keeps_non_finite_as_text() {
        for raw in ["inf", "-inf", "NaN", "infinity"] {
            assert_eq!(ParamValue::parse(raw), ParamValue::Text(raw.into()));
        }
        assert!(!ParamValue::Float(f64::NAN).is_finite());
        assert!(!ParamValue::List(vec![1.into(), f64::INFINITY.into()]).is_finite());
        assert!(ParamValue::List(vec![1.into(), 2.5.into()]).is_finite());
    }

    #[test]
    fn test_display_extreme_floats() {
        assert_eq!(ParamValue::Float(1e20).to_string(), "1.0e20");
        assert_eq!(ParamValue::Float(1e-7).to_string(), "1.0e-7");
        assert_eq!(ParamValue::Float(-2.5e30).to_string(), "-2.5e30");
        assert_eq!(ParamValue::Float(1e15).to_string(), "1000000000000000.0");
    }

    #[test]
    fn test_toml_values() {
        #[derive(Deserialize)]
        struct Holder {
            a: ParamValue,
            b: ParamValue,
            c: ParamValue,
        }

        let h: Holder = toml::from_str("a = 12\nb = 1.5\nc = [\"x\", 2]\n").unwrap();
        assert_eq!(h.a, ParamValue::Int(12));
        assert_eq!(h.b, ParamValue::Float(1.5));
        assert_eq!(h.c, ParamValue::List(vec!["x".into(), 2.into()]));
    }
}
