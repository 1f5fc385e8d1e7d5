//! Builtin operator semantics
//!
//! Integer arithmetic wraps on overflow. Mixing a long with a double promotes
//! to double. `+` with a string operand concatenates display forms.

use bytecode_system::Builtin;
use core_types::Value;
use std::cmp::Ordering;

use crate::error::RuntimeError;

/// Apply a pure builtin to its arguments.
///
/// `println` needs program output and is handled by the dispatcher.
pub fn apply(builtin: Builtin, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != builtin.arity() as usize {
        return Err(RuntimeError::corrupt(format!(
            "'{}' called with {} arguments",
            builtin.name(),
            args.len()
        )));
    }

    match builtin {
        Builtin::Not => Ok(Value::Bool(!args[0].is_truthy())),
        Builtin::Println => Err(RuntimeError::corrupt("'println' has no pure form")),
        _ => binary(builtin, &args[0], &args[1]),
    }
}

fn binary(builtin: Builtin, a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    match builtin {
        Builtin::Add => match (a, b) {
            (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::Str(format!("{}{}", a, b))),
            _ => arithmetic(builtin, a, b, i64::wrapping_add, |x, y| x + y),
        },
        Builtin::Sub => arithmetic(builtin, a, b, i64::wrapping_sub, |x, y| x - y),
        Builtin::Mul => arithmetic(builtin, a, b, i64::wrapping_mul, |x, y| x * y),
        Builtin::Div => {
            if let (Value::Long(_), Value::Long(0)) = (a, b) {
                return Err(RuntimeError::DivisionByZero { position: None });
            }
            arithmetic(builtin, a, b, i64::wrapping_div, |x, y| x / y)
        }
        Builtin::Less => compare(builtin, a, b).map(|o| Value::Bool(o == Ordering::Less)),
        Builtin::LessEqual => compare(builtin, a, b).map(|o| Value::Bool(o != Ordering::Greater)),
        Builtin::Greater => compare(builtin, a, b).map(|o| Value::Bool(o == Ordering::Greater)),
        Builtin::GreaterEqual => compare(builtin, a, b).map(|o| Value::Bool(o != Ordering::Less)),
        Builtin::Equal => Ok(Value::Bool(equals(a, b))),
        Builtin::NotEqual => Ok(Value::Bool(!equals(a, b))),
        Builtin::And => Ok(Value::Bool(a.is_truthy() && b.is_truthy())),
        Builtin::Or => Ok(Value::Bool(a.is_truthy() || b.is_truthy())),
        Builtin::Not | Builtin::Println => Err(RuntimeError::corrupt(format!(
            "'{}' is not a binary operator",
            builtin.name()
        ))),
    }
}

fn arithmetic(
    builtin: Builtin,
    a: &Value,
    b: &Value,
    long_op: fn(i64, i64) -> i64,
    double_op: fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Value::Long(x), Value::Long(y)) => Ok(Value::Long(long_op(*x, *y))),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(Value::Double(double_op(x, y))),
            _ => Err(type_mismatch(builtin, a, b)),
        },
    }
}

fn compare(builtin: Builtin, a: &Value, b: &Value) -> Result<Ordering, RuntimeError> {
    match (a, b) {
        (Value::Long(x), Value::Long(y)) => Ok(x.cmp(y)),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).ok_or_else(|| RuntimeError::Type {
                message: format!("cannot order NaN with '{}'", builtin.name()),
                position: None,
            }),
            _ => Err(type_mismatch(builtin, a, b)),
        },
    }
}

/// Structural equality; longs and doubles compare numerically
fn equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Long(x), Value::Double(y)) | (Value::Double(y), Value::Long(x)) => {
            (*x as f64) == *y
        }
        _ => a == b,
    }
}

fn type_mismatch(builtin: Builtin, a: &Value, b: &Value) -> RuntimeError {
    RuntimeError::Type {
        message: format!(
            "cannot apply '{}' to {} and {}",
            builtin.name(),
            a.type_name(),
            b.type_name()
        ),
        position: None,
    }
}
