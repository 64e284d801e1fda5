//! Declared primitive slot types and conversion of raw wire values into them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::error::ConvertError;
use crate::node::Node;

/// The declared type of a primitive field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        };
        f.write_str(name)
    }
}

impl PrimitiveType {
    pub fn is_unsigned(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// The value a freshly constructed slot of this type holds.
    pub fn zero(self) -> Node {
        match self {
            Self::Bool => Node::Bool(false),
            Self::F32 | Self::F64 => Node::from(0.0),
            t if t.is_unsigned() => Node::from(0u64),
            _ => Node::from(0i64),
        }
    }

    fn int_bounds(self) -> Option<(i128, i128)> {
        let bounds = match self {
            Self::I8 => (i8::MIN.into(), i8::MAX.into()),
            Self::I16 => (i16::MIN.into(), i16::MAX.into()),
            Self::I32 => (i32::MIN.into(), i32::MAX.into()),
            Self::I64 => (i64::MIN.into(), i64::MAX.into()),
            Self::U8 => (0, u8::MAX.into()),
            Self::U16 => (0, u16::MAX.into()),
            Self::U32 => (0, u32::MAX.into()),
            Self::U64 => (0, u64::MAX.into()),
            Self::Bool | Self::F32 | Self::F64 => return None,
        };
        Some(bounds)
    }

    /// Convert a raw value into this type.
    ///
    /// `Null` yields [`zero`](Self::zero). Integers are range-checked against
    /// the declared width and signedness.
    pub fn convert(self, raw: &Node) -> Result<Node, ConvertError> {
        if raw.is_null() {
            return Ok(self.zero());
        }
        match self {
            Self::Bool => self.to_bool(raw).map(Node::Bool),
            Self::F32 | Self::F64 => self.to_float(raw),
            _ => self.to_int(raw),
        }
    }

    fn to_bool(self, raw: &Node) -> Result<bool, ConvertError> {
        match raw {
            Node::Bool(b) => Ok(*b),
            Node::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
            Node::String(s) => s.trim().parse().map_err(|_| ConvertError::Unparsable {
                target: self,
                value: s.clone(),
            }),
            other => Err(ConvertError::Incompatible {
                target: self,
                found: other.kind(),
            }),
        }
    }

    fn to_int(self, raw: &Node) -> Result<Node, ConvertError> {
        let value = match raw {
            Node::Bool(b) => i128::from(*b),
            Node::Number(n) => number_to_i128(n).ok_or_else(|| ConvertError::Unparsable {
                target: self,
                value: n.to_string(),
            })?,
            Node::String(s) => parse_i128(s.trim()).ok_or_else(|| ConvertError::Unparsable {
                target: self,
                value: s.clone(),
            })?,
            other => {
                return Err(ConvertError::Incompatible {
                    target: self,
                    found: other.kind(),
                })
            }
        };

        let Some((min, max)) = self.int_bounds() else {
            return Err(ConvertError::Incompatible {
                target: self,
                found: raw.kind(),
            });
        };
        if value < min || value > max {
            return Err(ConvertError::OutOfRange {
                target: self,
                value: value.to_string(),
            });
        }

        // In range for the declared width, so these casts are lossless.
        if self.is_unsigned() {
            Ok(Node::from(value as u64))
        } else {
            Ok(Node::from(value as i64))
        }
    }

    fn to_float(self, raw: &Node) -> Result<Node, ConvertError> {
        let value = match raw {
            Node::Bool(b) => f64::from(u8::from(*b)),
            Node::Number(n) => n.as_f64().ok_or_else(|| ConvertError::Unparsable {
                target: self,
                value: n.to_string(),
            })?,
            Node::String(s) => s.trim().parse().map_err(|_| ConvertError::Unparsable {
                target: self,
                value: s.clone(),
            })?,
            other => {
                return Err(ConvertError::Incompatible {
                    target: self,
                    found: other.kind(),
                })
            }
        };

        let out_of_range = || ConvertError::OutOfRange {
            target: self,
            value: value.to_string(),
        };
        let value = match self {
            Self::F32 if value.abs() > f64::from(f32::MAX) => return Err(out_of_range()),
            Self::F32 => f64::from(value as f32),
            _ => value,
        };
        Number::from_f64(value).map(Node::Number).ok_or_else(out_of_range)
    }
}

fn number_to_i128(n: &Number) -> Option<i128> {
    if let Some(v) = n.as_i64() {
        return Some(v.into());
    }
    if let Some(v) = n.as_u64() {
        return Some(v.into());
    }
    n.as_f64()
        .filter(|v| v.is_finite() && v.fract() == 0.0 && v.abs() < 1e38)
        .map(|v| v as i128)
}

fn parse_i128(s: &str) -> Option<i128> {
    s.parse::<i128>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .and_then(|n| number_to_i128(&n))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_converts_to_zero() {
        assert_eq!(PrimitiveType::I32.convert(&Node::Null), Ok(Node::from(0i64)));
        assert_eq!(PrimitiveType::U8.convert(&Node::Null), Ok(Node::from(0u64)));
        assert_eq!(PrimitiveType::Bool.convert(&Node::Null), Ok(Node::Bool(false)));
    }

    #[test]
    fn signed_width_is_enforced() {
        assert_eq!(PrimitiveType::I8.convert(&Node::from(-128i64)), Ok(Node::from(-128i64)));
        assert!(matches!(
            PrimitiveType::I8.convert(&Node::from(128i64)),
            Err(ConvertError::OutOfRange { .. })
        ));
    }

    #[test]
    fn unsigned_rejects_negative() {
        assert!(matches!(
            PrimitiveType::U32.convert(&Node::from(-1i64)),
            Err(ConvertError::OutOfRange { .. })
        ));
        assert_eq!(
            PrimitiveType::U64.convert(&Node::from(u64::MAX)),
            Ok(Node::from(u64::MAX))
        );
    }

    #[test]
    fn integral_floats_and_strings_convert_to_ints() {
        assert_eq!(PrimitiveType::I32.convert(&Node::from(7.0)), Ok(Node::from(7i64)));
        assert_eq!(PrimitiveType::I16.convert(&Node::from(" 42 ")), Ok(Node::from(42i64)));
        assert!(matches!(
            PrimitiveType::I32.convert(&Node::from(7.5)),
            Err(ConvertError::Unparsable { .. })
        ));
    }

    #[test]
    fn bools() {
        assert_eq!(PrimitiveType::Bool.convert(&Node::from(1i64)), Ok(Node::Bool(true)));
        assert_eq!(PrimitiveType::Bool.convert(&Node::from("false")), Ok(Node::Bool(false)));
        assert_eq!(PrimitiveType::I8.convert(&Node::Bool(true)), Ok(Node::from(1i64)));
    }

    #[test]
    fn floats() {
        assert_eq!(PrimitiveType::F64.convert(&Node::from(3i64)), Ok(Node::from(3.0)));
        assert_eq!(PrimitiveType::F32.convert(&Node::from(0.5)), Ok(Node::from(0.5)));
        assert!(matches!(
            PrimitiveType::F32.convert(&Node::from(1e300)),
            Err(ConvertError::OutOfRange { .. })
        ));
    }

    #[test]
    fn containers_are_incompatible() {
        let err = PrimitiveType::I32
            .convert(&Node::from(Vec::<Node>::new()))
            .unwrap_err();
        assert_eq!(
            err,
            ConvertError::Incompatible {
                target: PrimitiveType::I32,
                found: crate::node::NodeKind::Array,
            }
        );
    }
}
