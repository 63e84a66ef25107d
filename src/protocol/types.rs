//! Argument and reply value types
//!
//! Commands receive positional `Arg`s and answer with a `Reply`. There is no
//! wire encoding; these values cross the API boundary as-is.

use crate::error::CacheError;
use bytes::Bytes;
use std::fmt;

/// A positional command argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Binary-safe string
    Bulk(Bytes),

    /// Integer literal
    Integer(i64),

    /// Floating point literal
    Float(f64),

    /// Boolean flag (RESTORE's replace argument)
    Bool(bool),

    /// Field/value mapping (HMSET's object form)
    Map(Vec<(Bytes, Bytes)>),

    /// Explicit absence (a null TTL)
    Nil,
}

impl Arg {
    /// Create a bulk string argument
    pub fn bulk(b: impl Into<Bytes>) -> Self {
        Arg::Bulk(b.into())
    }

    /// Create a mapping argument from field/value pairs
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Bytes>,
        V: Into<Bytes>,
    {
        Arg::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// The argument as bytes; numbers are rendered in canonical form
    pub fn as_bytes(&self) -> Option<Bytes> {
        match self {
            Arg::Bulk(b) => Some(b.clone()),
            Arg::Integer(i) => Some(Bytes::from(i.to_string())),
            Arg::Float(f) => Some(Bytes::from(format_float(*f))),
            _ => None,
        }
    }

    /// The argument as an integer, parsing strings
    ///
    /// Floats must be whole and inside the i64 range; strings must parse
    /// exactly, surrounding whitespace included.
    pub fn as_integer(&self) -> Option<i64> {
        // 2^63, the first float past i64::MAX
        const BOUND: f64 = 9_223_372_036_854_775_808.0;
        match self {
            Arg::Integer(i) => Some(*i),
            Arg::Float(f) if f.fract() == 0.0 && (-BOUND..BOUND).contains(f) => Some(*f as i64),
            Arg::Bulk(b) => std::str::from_utf8(b).ok()?.parse().ok(),
            _ => None,
        }
    }

    /// The argument as a float, parsing strings (accepts `inf`, `-inf`)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Arg::Float(f) if !f.is_nan() => Some(*f),
            Arg::Integer(i) => Some(*i as f64),
            Arg::Bulk(b) => parse_float(b),
            _ => None,
        }
    }

    /// Loose truthiness: nil, false, zero and the empty string are falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            Arg::Nil => false,
            Arg::Bool(b) => *b,
            Arg::Integer(i) => *i != 0,
            Arg::Float(f) => *f != 0.0 && !f.is_nan(),
            Arg::Bulk(b) => !b.is_empty(),
            Arg::Map(_) => true,
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Bulk(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Bulk(Bytes::from(s))
    }
}

impl From<Bytes> for Arg {
    fn from(b: Bytes) -> Self {
        Arg::Bulk(b)
    }
}

impl From<i64> for Arg {
    fn from(i: i64) -> Self {
        Arg::Integer(i)
    }
}

impl From<i32> for Arg {
    fn from(i: i32) -> Self {
        Arg::Integer(i64::from(i))
    }
}

impl From<f64> for Arg {
    fn from(f: f64) -> Self {
        Arg::Float(f)
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Bool(b)
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(o: Option<T>) -> Self {
        o.map(Into::into).unwrap_or(Arg::Nil)
    }
}

/// Build a `Vec<Arg>` from heterogeneous literals
///
/// ```
/// use memcache_rs::args;
/// let args = args!["myhash", "field", 1];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::protocol::Arg>::new() };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::protocol::Arg::from($arg)),+]
    };
}

/// A command reply
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Status reply: OK, PONG
    Status(String),

    /// Integer reply
    Integer(i64),

    /// Floating point reply (INCRBYFLOAT, ZSCORE)
    Float(f64),

    /// Binary-safe string reply
    Bulk(Bytes),

    /// Absent value
    Nil,

    /// Ordered collection of replies
    Array(Vec<Reply>),

    /// Field/value mapping (HGETALL)
    Map(Vec<(Bytes, Bytes)>),

    /// A failed command inside an EXEC result
    Error(CacheError),
}

impl Reply {
    /// The `OK` status
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    /// Create a status reply
    pub fn status(s: impl Into<String>) -> Self {
        Reply::Status(s.into())
    }

    /// Create an integer reply
    pub fn integer(i: i64) -> Self {
        Reply::Integer(i)
    }

    /// Create a float reply
    pub fn float(f: f64) -> Self {
        Reply::Float(f)
    }

    /// Create a bulk string reply
    pub fn bulk(b: impl Into<Bytes>) -> Self {
        Reply::Bulk(b.into())
    }

    /// Create a nil reply
    pub fn null() -> Self {
        Reply::Nil
    }

    /// Create an array reply
    pub fn array(v: Vec<Reply>) -> Self {
        Reply::Array(v)
    }

    /// Array of bulk strings
    pub fn bulk_array(items: impl IntoIterator<Item = Bytes>) -> Self {
        Reply::Array(items.into_iter().map(Reply::Bulk).collect())
    }

    /// Bulk string, or nil when absent
    pub fn optional(b: Option<Bytes>) -> Self {
        b.map(Reply::Bulk).unwrap_or(Reply::Nil)
    }

    /// Check if this is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    /// Try to extract the integer value
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to extract the float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Reply::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to extract bulk string bytes
    pub fn as_bulk(&self) -> Option<&Bytes> {
        match self {
            Reply::Bulk(b) => Some(b),
            _ => None,
        }
    }

    /// Status text or UTF-8 bulk string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Status(s) => Some(s),
            Reply::Bulk(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Try to extract array elements
    pub fn as_array(&self) -> Option<&Vec<Reply>> {
        match self {
            Reply::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to extract a mapping
    pub fn as_map(&self) -> Option<&Vec<(Bytes, Bytes)>> {
        match self {
            Reply::Map(pairs) => Some(pairs),
            _ => None,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Status(s) => write!(f, "{}", s),
            Reply::Integer(i) => write!(f, "(integer) {}", i),
            Reply::Float(v) => write!(f, "\"{}\"", format_float(*v)),
            Reply::Bulk(b) => write!(f, "\"{}\"", String::from_utf8_lossy(b)),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Array(arr) if arr.is_empty() => write!(f, "(empty array)"),
            Reply::Array(arr) => {
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, item)?;
                }
                Ok(())
            }
            Reply::Map(pairs) if pairs.is_empty() => write!(f, "(empty hash)"),
            Reply::Map(pairs) => {
                for (i, (field, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(
                        f,
                        "{}) \"{}\" => \"{}\"",
                        i + 1,
                        String::from_utf8_lossy(field),
                        String::from_utf8_lossy(value)
                    )?;
                }
                Ok(())
            }
            Reply::Error(e) => write!(f, "(error) {}", e),
        }
    }
}

/// Canonical float rendering: shortest round-trip form, no trailing zeros
pub fn format_float(f: f64) -> String {
    if f.is_infinite() {
        return if f > 0.0 { "inf".into() } else { "-inf".into() };
    }
    format!("{}", f)
}

/// Parse a float, accepting the `inf` spellings
pub fn parse_float(bytes: &[u8]) -> Option<f64> {
    let s = std::str::from_utf8(bytes).ok()?.trim();
    let value = match s.to_ascii_lowercase().as_str() {
        "inf" | "+inf" | "infinity" | "+infinity" => f64::INFINITY,
        "-inf" | "-infinity" => f64::NEG_INFINITY,
        _ => s.parse::<f64>().ok()?,
    };
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_coercions() {
        assert_eq!(Arg::from(12).as_bytes(), Some(Bytes::from("12")));
        assert_eq!(Arg::from("12").as_integer(), Some(12));
        assert_eq!(Arg::from("mm").as_integer(), None);
        assert_eq!(Arg::from("3.14").as_float(), Some(3.14));
        assert_eq!(Arg::from("-inf").as_float(), Some(f64::NEG_INFINITY));
        assert_eq!(Arg::from(2.5).as_bytes(), Some(Bytes::from("2.5")));
        assert_eq!(Arg::Nil.as_bytes(), None);
    }

    #[test]
    fn test_integer_coercion_is_strict() {
        assert_eq!(Arg::from(" 5 ").as_integer(), None);
        assert_eq!(Arg::from("5 ").as_integer(), None);
        assert_eq!(Arg::from(1e30).as_integer(), None);
        assert_eq!(Arg::from(-1e30).as_integer(), None);
        assert_eq!(Arg::from(f64::INFINITY).as_integer(), None);
        assert_eq!(Arg::from(2.5).as_integer(), None);
        assert_eq!(Arg::from(-42.0).as_integer(), Some(-42));
        assert_eq!(Arg::from(-9_223_372_036_854_775_808.0).as_integer(), Some(i64::MIN));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Arg::Nil.is_truthy());
        assert!(!Arg::from(0).is_truthy());
        assert!(!Arg::from(false).is_truthy());
        assert!(Arg::from(true).is_truthy());
        assert!(Arg::from(1500).is_truthy());
        assert!(!Arg::from(None::<i64>).is_truthy());
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(26.5), "26.5");
        assert_eq!(format_float(3.0), "3");
        assert_eq!(format_float(-12.25), "-12.25");
        assert_eq!(format_float(f64::INFINITY), "inf");
    }

    #[test]
    fn test_args_macro() {
        let args = args!["k", 1, 2.5, true];
        assert_eq!(args[0], Arg::bulk("k"));
        assert_eq!(args[1], Arg::Integer(1));
        assert_eq!(args[2], Arg::Float(2.5));
        assert_eq!(args[3], Arg::Bool(true));
    }
}
