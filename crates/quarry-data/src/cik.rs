//! Utilities for working with CIK (Central Index Key) numbers.
//!
//! CIKs are stored unpadded throughout the crate; zero-padding to 10 digits
//! happens only when a URL path segment is built.

use crate::error::{DataError, Result};

/// Parses a CIK from user input, stripping non-digit characters.
///
/// Returns the canonical unpadded decimal string.
///
/// # Errors
///
/// Returns [`DataError::InvalidIdentifier`] if the input contains no digits
/// or is longer than 10 digits.
///
/// # Example
///
/// ```
/// use quarry_data::cik::parse_cik;
///
/// assert_eq!(parse_cik("0000320193").unwrap(), "320193");
/// assert_eq!(parse_cik("320193").unwrap(), "320193");
/// ```
pub fn parse_cik(cik: &str) -> Result<String> {
    let digits: String = cik.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return Err(DataError::InvalidIdentifier(format!(
            "CIK must contain at least one digit: {cik:?}"
        )));
    }
    if digits.len() > 10 {
        return Err(DataError::InvalidIdentifier(format!(
            "CIK cannot be longer than 10 digits: {cik:?}"
        )));
    }

    let value: u64 = digits
        .parse()
        .map_err(|_| DataError::InvalidIdentifier(format!("Invalid CIK: {cik:?}")))?;
    Ok(value.to_string())
}

/// Zero-pads a CIK to the 10-digit form EDGAR URL paths require.
///
/// # Example
///
/// ```
/// use quarry_data::cik::pad10;
///
/// assert_eq!(pad10("320193"), "0000320193");
/// ```
pub fn pad10(cik: &str) -> String {
    format!("{cik:0>10}")
}

/// Returns true if the input parses as a CIK.
pub fn is_valid_cik(cik: &str) -> bool {
    parse_cik(cik).is_ok()
}
