//! Command-line template arguments
//!
//! Each argument may carry a type prefix (`i:`, `u:`, `f:`, `s:`, `p:`).
//! Bare values are tried as an integer, then a float, then taken as a string.

use thiserror::Error;
use vmprint::Arg;

#[derive(Error, Debug, PartialEq)]
pub enum ArgError {
    #[error("Invalid {kind} argument {value:?}")]
    Invalid { kind: &'static str, value: String },
}

/// An owned argument; borrowed as an [`Arg`] when the template is rendered
#[derive(Debug, Clone, PartialEq)]
pub enum CliArg {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Ptr(usize),
}

impl CliArg {
    pub fn as_arg(&self) -> Arg<'_> {
        match self {
            CliArg::Int(v) => Arg::Int(*v),
            CliArg::UInt(v) => Arg::UInt(*v),
            CliArg::Float(v) => Arg::Float(*v),
            CliArg::Str(s) => Arg::Str(s.as_bytes()),
            CliArg::Ptr(p) => Arg::Ptr(*p),
        }
    }
}

pub fn parse_arg(raw: &str) -> Result<CliArg, ArgError> {
    let invalid = |kind| ArgError::Invalid {
        kind,
        value: raw.to_string(),
    };

    if let Some(rest) = raw.strip_prefix("i:") {
        return parse_signed(rest).map(CliArg::Int).ok_or_else(|| invalid("integer"));
    }
    if let Some(rest) = raw.strip_prefix("u:") {
        return parse_unsigned(rest).map(CliArg::UInt).ok_or_else(|| invalid("unsigned"));
    }
    if let Some(rest) = raw.strip_prefix("f:") {
        return rest.parse().map(CliArg::Float).map_err(|_| invalid("float"));
    }
    if let Some(rest) = raw.strip_prefix("s:") {
        return Ok(CliArg::Str(rest.to_string()));
    }
    if let Some(rest) = raw.strip_prefix("p:") {
        return parse_unsigned(rest)
            .and_then(|p| usize::try_from(p).ok())
            .map(CliArg::Ptr)
            .ok_or_else(|| invalid("pointer"));
    }

    Ok(infer(raw))
}

pub fn parse_args<'a>(raw: impl IntoIterator<Item = &'a String>) -> Result<Vec<CliArg>, ArgError> {
    raw.into_iter().map(|s| parse_arg(s)).collect()
}

fn infer(raw: &str) -> CliArg {
    if let Some(v) = parse_signed(raw) {
        return CliArg::Int(v);
    }
    if let Some(v) = parse_unsigned(raw) {
        return CliArg::UInt(v);
    }
    // "inf" and "nan" stay strings unless asked for with f:
    if raw.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(v) = raw.parse::<f64>() {
            return CliArg::Float(v);
        }
    }
    CliArg::Str(raw.to_string())
}

fn parse_signed(raw: &str) -> Option<i64> {
    match raw.strip_prefix('-') {
        Some(rest) if rest.starts_with("0x") || rest.starts_with("0X") => {
            i64::from_str_radix(&rest[2..], 16).ok().and_then(i64::checked_neg)
        }
        _ if raw.starts_with("0x") || raw.starts_with("0X") => {
            i64::from_str_radix(&raw[2..], 16).ok()
        }
        _ => raw.parse().ok(),
    }
}

fn parse_unsigned(raw: &str) -> Option<u64> {
    if raw.starts_with("0x") || raw.starts_with("0X") {
        u64::from_str_radix(&raw[2..], 16).ok()
    } else {
        raw.parse().ok()
    }
}

/// Parse a VM handle given as decimal or `0x` hex
pub fn parse_handle(raw: &str) -> Result<usize, String> {
    parse_unsigned(raw)
        .and_then(|h| usize::try_from(h).ok())
        .ok_or_else(|| format!("invalid handle {:?}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_arguments() {
        assert_eq!(parse_arg("i:-5").unwrap(), CliArg::Int(-5));
        assert_eq!(parse_arg("i:0x10").unwrap(), CliArg::Int(16));
        assert_eq!(parse_arg("u:18446744073709551615").unwrap(), CliArg::UInt(u64::MAX));
        assert_eq!(parse_arg("f:2.5").unwrap(), CliArg::Float(2.5));
        assert_eq!(parse_arg("s:42").unwrap(), CliArg::Str("42".to_string()));
        assert_eq!(parse_arg("p:0xdead").unwrap(), CliArg::Ptr(0xdead));
        assert_eq!(parse_arg("s:").unwrap(), CliArg::Str(String::new()));
    }

    #[test]
    fn test_invalid_prefixed_arguments() {
        assert_eq!(
            parse_arg("i:abc"),
            Err(ArgError::Invalid {
                kind: "integer",
                value: "i:abc".to_string()
            })
        );
        assert!(parse_arg("u:-1").is_err());
        assert!(parse_arg("f:x").is_err());
        assert!(parse_arg("p:nowhere").is_err());
    }

    #[test]
    fn test_inferred_arguments() {
        assert_eq!(parse_arg("7").unwrap(), CliArg::Int(7));
        assert_eq!(parse_arg("-12").unwrap(), CliArg::Int(-12));
        assert_eq!(parse_arg("0xff").unwrap(), CliArg::Int(255));
        assert_eq!(parse_arg("18446744073709551615").unwrap(), CliArg::UInt(u64::MAX));
        assert_eq!(parse_arg("3.25").unwrap(), CliArg::Float(3.25));
        assert_eq!(parse_arg("1e3").unwrap(), CliArg::Float(1000.0));
        assert_eq!(parse_arg("fail").unwrap(), CliArg::Str("fail".to_string()));
        assert_eq!(parse_arg("nan").unwrap(), CliArg::Str("nan".to_string()));
        assert_eq!(parse_arg("f:inf").unwrap(), CliArg::Float(f64::INFINITY));
    }

    #[test]
    fn test_as_arg() {
        let s = CliArg::Str("abc".to_string());
        assert_eq!(s.as_arg(), Arg::Str(b"abc"));
        assert_eq!(CliArg::Ptr(1).as_arg(), Arg::Ptr(1));
    }

    #[test]
    fn test_parse_handle() {
        assert_eq!(parse_handle("42"), Ok(42));
        assert_eq!(parse_handle("0x2a"), Ok(42));
        assert!(parse_handle("vm").is_err());
    }
}
