//! Feature values and their total order.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::type_system::FeatureRange;

/// Value stored in one feature slot.
#[derive(Clone, PartialEq)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// `None` is the null string; it sorts before every other string.
    Str(Option<Arc<str>>),
}

impl FeatureValue {
    /// Initial value of a freshly created feature structure.
    pub fn default_for(range: FeatureRange) -> Self {
        match range {
            FeatureRange::Int => FeatureValue::Int(0),
            FeatureRange::Float => FeatureValue::Float(0.0),
            FeatureRange::Bool => FeatureValue::Bool(false),
            FeatureRange::Str => FeatureValue::Str(None),
        }
    }

    /// Range this value belongs to.
    pub fn range(&self) -> FeatureRange {
        match self {
            FeatureValue::Int(_) => FeatureRange::Int,
            FeatureValue::Float(_) => FeatureRange::Float,
            FeatureValue::Bool(_) => FeatureRange::Bool,
            FeatureValue::Str(_) => FeatureRange::Str,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FeatureValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FeatureValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FeatureValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::Str(v) => v.as_deref(),
            _ => None,
        }
    }

    /// Total order over values of the same range. Floats use
    /// [`f64::total_cmp`]; mismatched ranges order by range.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FeatureValue::Int(a), FeatureValue::Int(b)) => a.cmp(b),
            (FeatureValue::Float(a), FeatureValue::Float(b)) => a.total_cmp(b),
            (FeatureValue::Bool(a), FeatureValue::Bool(b)) => a.cmp(b),
            (FeatureValue::Str(a), FeatureValue::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FeatureValue::Int(_) => 0,
            FeatureValue::Float(_) => 1,
            FeatureValue::Bool(_) => 2,
            FeatureValue::Str(_) => 3,
        }
    }
}

impl fmt::Debug for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Int(v) => write!(f, "{v}"),
            FeatureValue::Float(v) => write!(f, "{v:?}"),
            FeatureValue::Bool(v) => write!(f, "{v}"),
            FeatureValue::Str(Some(s)) => write!(f, "{s:?}"),
            FeatureValue::Str(None) => f.write_str("null"),
        }
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Int(v)
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Float(v)
    }
}

impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        FeatureValue::Bool(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Str(Some(Arc::from(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_have_a_total_order() {
        let nan = FeatureValue::Float(f64::NAN);
        let one = FeatureValue::Float(1.0);
        assert_eq!(nan.total_cmp(&nan), Ordering::Equal);
        assert_eq!(one.total_cmp(&nan), Ordering::Less);
    }

    #[test]
    fn null_string_sorts_first() {
        let null = FeatureValue::Str(None);
        let empty = FeatureValue::from("");
        assert_eq!(null.total_cmp(&empty), Ordering::Less);
        assert_eq!(
            FeatureValue::from("a").total_cmp(&FeatureValue::from("b")),
            Ordering::Less
        );
    }
}
