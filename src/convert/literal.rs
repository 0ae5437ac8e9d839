//! String-to-scalar literal parsing.
//!
//! Integer literals take an optional sign, a base prefix (`0x`, `0o`, `0b`, or
//! a bare leading `0` for octal) and `_` separators between digits.
use std::borrow::Cow;
use std::num::IntErrorKind;

use crate::error::ParseError;

pub fn parse_signed(literal: &str) -> Result<i64, ParseError> {
    let (negative, body) = match literal.as_bytes().first() {
        Some(b'-') => (true, &literal[1..]),
        Some(b'+') => (false, &literal[1..]),
        _ => (false, literal),
    };
    let magnitude = parse_magnitude(literal, body)?;
    if negative {
        // |i64::MIN| is one past i64::MAX
        if magnitude > i64::MAX as u64 + 1 {
            return Err(ParseError::OutOfRange { literal: literal.to_owned() });
        }
        Ok((magnitude as i64).wrapping_neg())
    } else {
        i64::try_from(magnitude).map_err(|_| ParseError::OutOfRange { literal: literal.to_owned() })
    }
}

/// Like [`parse_signed`] but without a sign.
pub fn parse_unsigned(literal: &str) -> Result<u64, ParseError> {
    parse_magnitude(literal, literal)
}

pub fn parse_float(literal: &str) -> Result<f64, ParseError> {
    literal.parse::<f64>().map_err(|source| ParseError::Float {
        literal: literal.to_owned(),
        source,
    })
}

pub fn parse_bool(literal: &str) -> Result<bool, ParseError> {
    match literal {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ParseError::Bool { literal: literal.to_owned() }),
    }
}

// ------------------------------- Internals -------------------------------- //

fn parse_magnitude(literal: &str, body: &str) -> Result<u64, ParseError> {
    let syntax = || ParseError::Syntax { literal: literal.to_owned() };

    let (radix, digits, prefixed) = if let Some(rest) = strip_prefix(body, 'x') {
        (16, rest, true)
    } else if let Some(rest) = strip_prefix(body, 'o') {
        (8, rest, true)
    } else if let Some(rest) = strip_prefix(body, 'b') {
        (2, rest, true)
    } else if body.len() > 1 && body.starts_with('0') {
        (8, &body[1..], true)
    } else {
        (10, body, false)
    };

    if digits.starts_with(['+', '-']) {
        return Err(syntax());
    }

    let digits: Cow<str> = if digits.contains('_') {
        if !underscores_ok(digits, prefixed) {
            return Err(syntax());
        }
        Cow::Owned(digits.replace('_', ""))
    } else {
        Cow::Borrowed(digits)
    };

    u64::from_str_radix(&digits, radix).map_err(|source| match source.kind() {
        IntErrorKind::PosOverflow => ParseError::OutOfRange { literal: literal.to_owned() },
        _ => ParseError::Int { literal: literal.to_owned(), source },
    })
}

fn strip_prefix(body: &str, marker: char) -> Option<&str> {
    let mut chars = body.chars();
    match (chars.next(), chars.next()) {
        (Some('0'), Some(c)) if c.eq_ignore_ascii_case(&marker) => Some(chars.as_str()),
        _ => None,
    }
}

/// Separators sit between digits, or right after a base prefix.
fn underscores_ok(digits: &str, prefixed: bool) -> bool {
    let bytes = digits.as_bytes();
    if bytes.last() == Some(&b'_') || digits.contains("__") {
        return false;
    }
    prefixed || bytes.first() != Some(&b'_')
}
