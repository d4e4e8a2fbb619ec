//! Typed index keys.

use std::cmp::Ordering;
use std::fmt;

/// A scalar key of one of the supported column types.
///
/// Keys of different types order by type first (`Integer < Float <
/// Varchar`); an index normally holds keys of one type only. Floats use
/// IEEE total ordering, so `NaN` has a fixed place and equality is
/// reflexive.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i32),
    Float(f32),
    Varchar(String),
}

impl Value {
    /// Raw key bytes: little-endian for numbers, UTF-8 for strings.
    ///
    /// This is the encoding the disk-backed index hashes.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Value::Integer(v) => v.to_le_bytes().to_vec(),
            Value::Float(v) => v.to_le_bytes().to_vec(),
            Value::Varchar(s) => s.as_bytes().to_vec(),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Integer(_) => 0,
            Value::Float(_) => 1,
            Value::Varchar(_) => 2,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Varchar(a), Value::Varchar(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Varchar(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Varchar(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Varchar(s) => write!(f, "'{}'", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_type_ordering() {
        assert!(Value::from(-3) < Value::from(2));
        assert!(Value::from(1.5f32) < Value::from(2.0f32));
        assert!(Value::from("abc") < Value::from("abd"));
        assert_eq!(Value::from("x"), Value::from(String::from("x")));
    }

    #[test]
    fn test_float_nan_is_reflexive() {
        let nan = Value::Float(f32::NAN);
        assert_eq!(nan, nan.clone());
        assert!(Value::Float(f32::INFINITY) < nan);
    }

    #[test]
    fn test_mixed_types_order_by_type() {
        assert!(Value::from(i32::MAX) < Value::from(f32::MIN));
        assert!(Value::from(f32::MAX) < Value::from(""));
    }

    #[test]
    fn test_encode() {
        assert_eq!(Value::from(0x0102_0304).encode(), vec![4, 3, 2, 1]);
        assert_eq!(Value::from(1.0f32).encode(), 1.0f32.to_le_bytes().to_vec());
        assert_eq!(Value::from("hi").encode(), b"hi".to_vec());
    }
}
