//! Fractional order keys for sibling positioning.
//!
//! # Responsibility
//! - Generate string keys that sort strictly between two neighbors.
//!
//! # Invariants
//! - Keys use the base-36 alphabet `0-9a-z` and compare bytewise.
//! - Generated keys never end with the zero digit, so a smaller key can
//!   always be produced by appending digits.
//! - Inserting between adjacent keys extends precision; no sibling is ever
//!   renumbered.

use std::error::Error;
use std::fmt::{Display, Formatter};

const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const BASE: usize = DIGITS.len();

/// Result type for order-key operations.
pub type OrderKeyResult<T> = Result<T, OrderKeyError>;

/// Errors from order-key generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderKeyError {
    /// Key is empty, uses bytes outside the alphabet, or ends with the zero
    /// digit.
    MalformedKey(String),
    /// Lower bound does not sort strictly before the upper bound.
    BoundsOutOfOrder { lower: String, upper: String },
}

impl Display for OrderKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedKey(key) => write!(f, "malformed order key `{key}`"),
            Self::BoundsOutOfOrder { lower, upper } => {
                write!(f, "order key bounds out of order: `{lower}` >= `{upper}`")
            }
        }
    }
}

impl Error for OrderKeyError {}

/// Returns a key sorting strictly between the given bounds.
///
/// `None` means unbounded in that direction; `(None, None)` yields the
/// canonical middle key for an empty sibling list.
pub fn key_between(lower: Option<&str>, upper: Option<&str>) -> OrderKeyResult<String> {
    if let Some(key) = lower {
        validate_key(key)?;
    }
    if let Some(key) = upper {
        validate_key(key)?;
    }
    if let (Some(low), Some(high)) = (lower, upper) {
        if low >= high {
            return Err(OrderKeyError::BoundsOutOfOrder {
                lower: low.to_string(),
                upper: high.to_string(),
            });
        }
    }
    Ok(midpoint(lower.unwrap_or(""), upper))
}

fn validate_key(key: &str) -> OrderKeyResult<()> {
    let well_formed = !key.is_empty()
        && key.bytes().all(|byte| digit_value(byte).is_some())
        && !key.ends_with('0');
    if !well_formed {
        return Err(OrderKeyError::MalformedKey(key.to_string()));
    }
    Ok(())
}

fn digit_value(byte: u8) -> Option<usize> {
    DIGITS.iter().position(|digit| *digit == byte)
}

/// Core midpoint over digit strings. Requires `a < b` when `b` is present
/// (`a` may be empty, `None` for `b` means positive infinity); the result
/// sorts strictly between the two.
fn midpoint(a: &str, b: Option<&str>) -> String {
    if let Some(b) = b {
        // Shared prefix carries over unchanged; recurse on the remainders.
        // `a` is implicitly padded with zero digits while comparing.
        let shared = common_prefix_len(a, b);
        if shared > 0 {
            let a_rest = a.get(shared..).unwrap_or("");
            return format!("{}{}", &b[..shared], midpoint(a_rest, Some(&b[shared..])));
        }
    }

    let digit_a = a.bytes().next().and_then(digit_value).unwrap_or(0);
    let digit_b = b
        .and_then(|b| b.bytes().next())
        .and_then(digit_value)
        .unwrap_or(BASE);

    if digit_b - digit_a > 1 {
        let mid = (digit_a + digit_b) / 2;
        return (DIGITS[mid] as char).to_string();
    }

    // Leading digits are adjacent; extend precision below the upper bound
    // (or below infinity when unbounded above).
    match b {
        Some(b) if b.len() > 1 => b[..1].to_string(),
        _ => {
            let a_rest = a.get(1..).unwrap_or("");
            format!("{}{}", DIGITS[digit_a] as char, midpoint(a_rest, None))
        }
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let mut len = 0;
    while len < b.len() {
        let padded_a = a.get(len).copied().unwrap_or(DIGITS[0]);
        if padded_a != b[len] {
            break;
        }
        len += 1;
    }
    len
}
