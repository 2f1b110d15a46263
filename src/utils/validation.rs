use rust_decimal::Decimal;
use std::str::FromStr;

/// Shortest NAICS code accepted (sector level)
pub const NAICS_MIN_DIGITS: usize = 2;

/// Longest NAICS code accepted (national industry level)
pub const NAICS_MAX_DIGITS: usize = 6;

/// Checks that `code` is 2 to 6 ASCII digits and nothing else.
pub fn is_valid_naics_code(code: &str) -> bool {
    (NAICS_MIN_DIGITS..=NAICS_MAX_DIGITS).contains(&code.len())
        && code.bytes().all(|b| b.is_ascii_digit())
}

/// Validates a raw NAICS field as typed by the user.
///
/// The value is trimmed first. An empty field is accepted (the code is
/// optional at this stage); anything else must be a well-formed code.
pub fn validate_naics_field(raw: &str) -> bool {
    let code = raw.trim();
    code.is_empty() || is_valid_naics_code(code)
}

/// Parses a percentage typed into the breakdown row.
///
/// Returns `None` for blank or non-numeric text. Sign and range are left
/// to the caller.
pub fn parse_percentage(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text).ok()
}

/// Parses a dollar amount, rejecting negatives and non-finite values.
pub fn parse_amount(text: &str) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// `validator` hook for the subcontract value field.
#[allow(clippy::ptr_arg)]
pub fn validate_subcontract_value(value: &String) -> Result<(), validator::ValidationError> {
    if parse_amount(value).is_some() {
        return Ok(());
    }
    let mut err = validator::ValidationError::new("invalid_amount");
    err.message = Some("Subcontract value must be a non-negative number".into());
    Err(err)
}
