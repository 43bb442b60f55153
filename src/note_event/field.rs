use core::fmt;

/// The value of a named event field.
///
/// Numbers compare by value whatever their representation, so `Int(500)` equals
/// `Float(500.0)`. Values of different kinds are never equal.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    /// A whole number
    Int(i64),
    /// A floating point number
    Float(f64),
    /// Text
    Text(String),
    /// A flag
    Bool(bool),
}

impl FieldValue {
    /// The value as a float, if it is a number
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(v) => Some(v as f64),
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    /// The value as an integer, if it is a whole number
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v),
            Self::Float(v) if v.fract() == 0. && v.abs() < i64::MAX as f64 => Some(v as i64),
            _ => None,
        }
    }

    /// The value as text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a flag
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(_) | Self::Float(_), Self::Int(_) | Self::Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from_int {
    ($($int:ty),*) => {
        $(
            impl From<$int> for FieldValue {
                fn from(value: $int) -> Self {
                    Self::Int(value as i64)
                }
            }
        )*
    };
}
impl_from_int!(u8, u16, u32, i8, i16, i32, i64, usize);

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        Self::Float(value as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[test]
fn numbers_compare_across_representations() {
    assert_eq!(FieldValue::Int(500), FieldValue::Float(500.));
    assert_ne!(FieldValue::Int(500), FieldValue::Float(500.5));
    assert_ne!(FieldValue::Int(1), FieldValue::Bool(true));
    assert_ne!(FieldValue::from("1"), FieldValue::Int(1));
    assert_eq!(FieldValue::Float(3.).as_i64(), Some(3));
    assert_eq!(FieldValue::Float(3.5).as_i64(), None);
}
