//! Common validation utilities for device and employee identifiers.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    static ref SERIAL_RE: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9./_-]{2,99}$").unwrap();
    static ref IMEI_RE: Regex = Regex::new(r"^[0-9]{14,16}$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9][0-9 \-]{6,19}$").unwrap();
    static ref NATIONAL_ID_RE: Regex = Regex::new(r"^[0-9]{7,9}-[0-9kK]$").unwrap();
}

/// Validates a device serial number: alphanumeric plus `./_-`, 3 to 100 chars.
pub fn validate_serial_number(serial: &str) -> Result<(), ValidationError> {
    if SERIAL_RE.is_match(serial) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_serial_number");
        err.message = Some(
            "Serial number must be 3-100 characters: letters, digits, '.', '/', '_' or '-'".into(),
        );
        Err(err)
    }
}

/// Validates an IMEI: 14 to 16 digits.
pub fn validate_imei(imei: &str) -> Result<(), ValidationError> {
    if IMEI_RE.is_match(imei) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_imei");
        err.message = Some("IMEI must be 14-16 digits".into());
        Err(err)
    }
}

/// Validates a phone number: optional leading `+`, then 7 to 20 digits,
/// spaces or hyphens.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_phone_number");
        err.message = Some("Phone number must be 7-20 digits, optionally prefixed with +".into());
        Err(err)
    }
}

/// Validates a national identity number in `NNNNNNNN-V` form.
pub fn validate_national_id(id: &str) -> Result<(), ValidationError> {
    if NATIONAL_ID_RE.is_match(id) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_national_id");
        err.message = Some("National ID must match NNNNNNNN-V".into());
        Err(err)
    }
}
