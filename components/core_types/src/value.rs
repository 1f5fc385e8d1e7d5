//! Haruko runtime value representation.
//!
//! Values are what the operand stack, local slots and globals hold while a
//! compiled unit executes. Literals compile to exactly one of these kinds.

use std::fmt;

/// Represents any Haruko runtime value.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// assert!(!Value::Nil.is_truthy());
/// assert!(!Value::Bool(false).is_truthy());
/// assert!(Value::Long(0).is_truthy());
/// assert_eq!(Value::Double(2.5).type_name(), "double");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absent value
    Nil,
    /// Boolean (true or false)
    Bool(bool),
    /// 64-bit signed integer
    Long(i64),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// Immutable string
    Str(String),
    /// Reference to a named top-level function
    Function(String),
}

impl Value {
    /// Returns whether this value is truthy.
    ///
    /// Only `false` and `nil` are falsy; every other value, including the
    /// numeric zeroes and the empty string, is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Returns whether this value is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Name of the value's runtime kind, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Function(_) => "function",
        }
    }

    /// Numeric view of the value, if it is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Long(n) => Some(*n as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Readable form: like [`Display`](fmt::Display) but strings are quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("{:?}", s),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Long(n) => write!(f, "{}", n),
            Value::Double(d) => {
                if d.is_finite() && d.fract() == 0.0 {
                    write!(f, "{:.1}", d)
                } else {
                    write!(f, "{}", d)
                }
            }
            Value::Str(s) => f.write_str(s),
            Value::Function(name) => write!(f, "#<fn {}>", name),
        }
    }
}
