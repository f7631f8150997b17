//! Range grammar and pattern sentinel handling.
//!
//! Ranges:
//!
//! ```text
//! token  ::= "min" | "max" | <number>
//! range  ::= token [ ".." token ]
//! ranges ::= range ("|" range)*
//! ```
//!
//! `min`/`max` stand for the owning type's natural bounds and are resolved
//! by the type translator, not here. A single token `a` is the single-point
//! range `a..a` and is re-encoded as the bare literal.
//!
//! Patterns carry a one-byte sentinel prefix on the wire: 0x06 = match,
//! 0x15 = invert-match. Multiple patterns on one type are ANDed; they are
//! collapsed into a single regex by lookahead chaining so the target model's
//! single `pattern` facet preserves the AND semantics.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    error::{FromExternalError, ParseError},
    multi::separated_list1,
    sequence::{delimited, pair, tuple},
    IResult,
};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::yang::Pattern;

// =============================================================================
// RANGE GRAMMAR
// =============================================================================

/// One bound of a sub-range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// The owning type's natural minimum
    Min,
    /// The owning type's natural maximum
    Max,
    Value(Decimal),
}

impl Bound {
    /// Resolve against the owning type's natural bounds, when known.
    pub fn resolve(&self, natural: Option<(i128, i128)>) -> Option<Decimal> {
        match self {
            Bound::Value(v) => Some(*v),
            Bound::Min => natural.map(|(lo, _)| Decimal::from_i128_with_scale(lo, 0)),
            Bound::Max => natural.map(|(_, hi)| Decimal::from_i128_with_scale(hi, 0)),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Min => write!(f, "min"),
            Bound::Max => write!(f, "max"),
            Bound::Value(v) => write!(f, "{}", v),
        }
    }
}

/// A closed sub-range `lo..hi`.
pub type SubRange = (Bound, Bound);

/// Parse a ranges expression. Returns one entry per `|`-separated sub-range.
pub fn parse_ranges(input: &str) -> Result<Vec<SubRange>, String> {
    match all_consuming(ranges::<nom::error::Error<&str>>)(input.trim()) {
        Ok((_, r)) => Ok(r),
        Err(e) => Err(format!("malformed range '{}': {}", input, e)),
    }
}

/// Render sub-ranges back to the textual grammar. Single-point ranges
/// encode as the bare literal, never `a..a`.
pub fn format_ranges(ranges: &[SubRange]) -> String {
    ranges
        .iter()
        .map(|(lo, hi)| {
            if lo == hi && matches!(lo, Bound::Value(_)) {
                lo.to_string()
            } else {
                format!("{}..{}", lo, hi)
            }
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Convenience for a single numeric sub-range.
pub fn format_range(lo: Decimal, hi: Decimal) -> String {
    format_ranges(&[(Bound::Value(lo), Bound::Value(hi))])
}

fn ranges<'a, E: ParseError<&'a str> + FromExternalError<&'a str, rust_decimal::Error>>(
    input: &'a str,
) -> IResult<&'a str, Vec<SubRange>, E> {
    separated_list1(delimited(multispace0, char('|'), multispace0), range)(input)
}

fn range<'a, E: ParseError<&'a str> + FromExternalError<&'a str, rust_decimal::Error>>(
    input: &'a str,
) -> IResult<&'a str, SubRange, E> {
    let (input, lo) = token(input)?;
    let (input, hi) = opt(tuple((
        delimited(multispace0, tag(".."), multispace0),
        token,
    )))(input)?;
    let hi = hi.map(|(_, t)| t).unwrap_or(lo);
    Ok((input, (lo, hi)))
}

fn token<'a, E: ParseError<&'a str> + FromExternalError<&'a str, rust_decimal::Error>>(
    input: &'a str,
) -> IResult<&'a str, Bound, E> {
    alt((
        value(Bound::Min, tag("min")),
        value(Bound::Max, tag("max")),
        map(number, Bound::Value),
    ))(input)
}

fn number<'a, E: ParseError<&'a str> + FromExternalError<&'a str, rust_decimal::Error>>(
    input: &'a str,
) -> IResult<&'a str, Decimal, E> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
        ))),
        Decimal::from_str,
    )(input)
}

// =============================================================================
// PATTERN SENTINEL
// =============================================================================

/// Sentinel byte marking a regular match pattern (ACK)
pub const SENTINEL_MATCH: char = '\u{0006}';
/// Sentinel byte marking an invert-match pattern (NAK)
pub const SENTINEL_INVERT: char = '\u{0015}';

/// Prefix a pattern with its sentinel byte for the wire form.
pub fn encode_pattern(pattern: &Pattern) -> String {
    let sentinel = if pattern.invert {
        SENTINEL_INVERT
    } else {
        SENTINEL_MATCH
    };
    format!("{}{}", sentinel, pattern.regex)
}

/// Strip the sentinel byte. A missing sentinel means a plain match pattern.
pub fn decode_pattern(raw: &str) -> Pattern {
    if let Some(rest) = raw.strip_prefix(SENTINEL_INVERT) {
        Pattern::inverted(rest)
    } else if let Some(rest) = raw.strip_prefix(SENTINEL_MATCH) {
        Pattern::matching(rest)
    } else {
        Pattern::matching(raw)
    }
}

// =============================================================================
// PATTERN COMBINATION
// =============================================================================

/// Rewrite an invert-match pattern as a self-contained positive regex: a
/// string matches iff no prefix of it matches `P`.
fn invert_rewrite(regex: &str) -> String {
    format!("((?!({})).)*", regex)
}

/// Collapse a pattern set (implicitly ANDed) into one regex.
///
/// - no patterns: `None`
/// - one match pattern: used directly
/// - one invert pattern: negative-lookahead rewrite
/// - several: each becomes an anchored lookahead `(?=(?:P)$)`, chained, with
///   a trailing `.*` so the whole expression still consumes the subject
pub fn combine_patterns(patterns: &[Pattern]) -> Option<String> {
    match patterns {
        [] => None,
        [single] => Some(if single.invert {
            invert_rewrite(&single.regex)
        } else {
            single.regex.clone()
        }),
        many => {
            let mut out = String::new();
            for p in many {
                let term = if p.invert {
                    invert_rewrite(&p.regex)
                } else {
                    p.regex.clone()
                };
                out.push_str(&format!("(?=(?:{})$)", term));
            }
            out.push_str(".*");
            Some(out)
        }
    }
}
