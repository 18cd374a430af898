use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// A derived metric that may have no finite value.
///
/// Division-by-zero cases are tagged instead of leaking `NaN`/`inf` into
/// later arithmetic: rates with no attempts are `Undefined`, PPDA with no
/// defensive actions is `Unbounded`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Defined(f64),
    Undefined,
    Unbounded,
}

impl Value {
    /// `num / den * scale`, `Undefined` when `den` is zero.
    pub fn rate(num: f64, den: f64, scale: f64) -> Self {
        if den == 0.0 {
            Value::Undefined
        } else {
            Value::Defined(num / den * scale)
        }
    }

    /// `num / den`, `Unbounded` when `den` is zero.
    pub fn unbounded_ratio(num: f64, den: f64) -> Self {
        if den == 0.0 {
            Value::Unbounded
        } else {
            Value::Defined(num / den)
        }
    }

    pub fn round(self, decimals: u32) -> Self {
        match self {
            Value::Defined(v) => Value::Defined(round_to(v, decimals)),
            other => other,
        }
    }

    pub fn as_f64(self) -> Option<f64> {
        match self {
            Value::Defined(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Value::Defined(_))
    }

    /// Descending order for rankings: larger first, `Unbounded` above every
    /// finite value, `Undefined` always last.
    pub fn cmp_desc(self, other: Self) -> Ordering {
        fn rank(v: Value) -> (u8, f64) {
            match v {
                Value::Unbounded => (0, 0.0),
                Value::Defined(x) => (1, -x),
                Value::Undefined => (2, 0.0),
            }
        }
        let (ka, va) = rank(self);
        let (kb, vb) = rank(other);
        ka.cmp(&kb).then(va.total_cmp(&vb))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Defined(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Defined(v) => match f.precision() {
                Some(p) => write!(f, "{v:.p$}"),
                None => write!(f, "{v}"),
            },
            Value::Undefined => f.write_str("-"),
            Value::Unbounded => f.write_str("∞"),
        }
    }
}

pub fn round_to(v: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (v * factor).round() / factor
}
