//! Tag values as reported to the operator.

use std::collections::BTreeMap;
use std::fmt;

/// Byte sequences at or below this length are shown as hex.
const HEX_DISPLAY_LIMIT: usize = 16;

/// A decoded tag value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Seq(Vec<Value>),
    /// Nested table, only used for the GPS sub-directory.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Collapse a list of integers into a scalar when it has one element.
    pub fn from_ints<I: IntoIterator<Item = i64>>(values: I) -> Self {
        collapse(values.into_iter().map(Value::Int).collect())
    }

    /// Collapse a list of floats into a scalar when it has one element.
    pub fn from_floats<I: IntoIterator<Item = f64>>(values: I) -> Self {
        collapse(values.into_iter().map(Value::Float).collect())
    }

    /// Build a text value from NUL-padded ASCII components.
    pub fn from_ascii<'a, I: IntoIterator<Item = &'a [u8]>>(parts: I) -> Self {
        let parts: Vec<String> = parts
            .into_iter()
            .map(|p| String::from_utf8_lossy(p).trim_end_matches('\0').to_string())
            .collect();
        Value::Text(parts.join(", "))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

fn collapse(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Seq(values)
    }
}

impl From<&exif::Value> for Value {
    fn from(value: &exif::Value) -> Self {
        use exif::Value as V;

        match value {
            V::Byte(v) if v.len() == 1 => Value::Int(i64::from(v[0])),
            V::Byte(v) => Value::Bytes(v.clone()),
            V::Ascii(parts) => Value::from_ascii(parts.iter().map(Vec::as_slice)),
            V::Short(v) => Value::from_ints(v.iter().map(|&n| i64::from(n))),
            V::Long(v) => Value::from_ints(v.iter().map(|&n| i64::from(n))),
            V::SByte(v) => Value::from_ints(v.iter().map(|&n| i64::from(n))),
            V::SShort(v) => Value::from_ints(v.iter().map(|&n| i64::from(n))),
            V::SLong(v) => Value::from_ints(v.iter().map(|&n| i64::from(n))),
            V::Rational(v) => Value::from_floats(v.iter().map(|r| r.to_f64())),
            V::SRational(v) => Value::from_floats(v.iter().map(|r| r.to_f64())),
            V::Float(v) => Value::from_floats(v.iter().map(|&f| f64::from(f))),
            V::Double(v) => Value::from_floats(v.iter().copied()),
            V::Undefined(v, _) => Value::Bytes(v.clone()),
            V::Unknown(typ, count, _) => {
                Value::Text(format!("<unknown type {}: {} values>", typ, count))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
            Value::Bytes(b) if b.len() <= HEX_DISPLAY_LIMIT => {
                let hex: Vec<String> = b.iter().map(|byte| format!("{:02x}", byte)).collect();
                f.write_str(&hex.join(" "))
            }
            Value::Bytes(b) => write!(f, "<bytes: {} bytes>", b.len()),
            Value::Seq(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_element_lists_collapse() {
        assert_eq!(Value::from_ints([7]), Value::Int(7));
        assert_eq!(
            Value::from_ints([1, 2]),
            Value::Seq(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_ascii_trims_padding() {
        let v = Value::from_ascii([b"Canon\0\0".as_slice()]);
        assert_eq!(v, Value::Text(String::from("Canon")));
    }

    #[test]
    fn test_display_sequence_is_comma_joined() {
        let v = Value::from_floats([40.0, 26.5, 0.25]);
        assert_eq!(v.to_string(), "40, 26.5, 0.25");
    }

    #[test]
    fn test_display_bytes() {
        assert_eq!(Value::Bytes(vec![2, 2, 0, 0]).to_string(), "02 02 00 00");
        assert_eq!(Value::Bytes(vec![0; 40]).to_string(), "<bytes: 40 bytes>");
    }

    #[test]
    fn test_display_map() {
        let mut map = BTreeMap::new();
        map.insert(String::from("GPSLatitudeRef"), Value::Text(String::from("N")));
        map.insert(String::from("GPSAltitude"), Value::Float(12.5));
        assert_eq!(
            Value::Map(map).to_string(),
            "{GPSAltitude: 12.5, GPSLatitudeRef: N}"
        );
    }

    #[test]
    fn test_from_exif_value() {
        let rational = exif::Value::Rational(vec![exif::Rational { num: 1, denom: 4 }]);
        assert_eq!(Value::from(&rational), Value::Float(0.25));

        let undefined = exif::Value::Undefined(b"0230".to_vec(), 0);
        assert_eq!(Value::from(&undefined), Value::Bytes(b"0230".to_vec()));

        let ascii = exif::Value::Ascii(vec![b"X100".to_vec()]);
        assert_eq!(Value::from(&ascii), Value::Text(String::from("X100")));
    }
}
