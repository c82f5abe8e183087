//! Loan request models and compliance-field validation

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{InterestType, LoanStatus};

/// Request to create a new loan offer
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLoanRequest {
    #[validate(range(min = 1.0, message = "Principal amount must be positive"))]
    pub principal_amount: f64,

    #[validate(range(min = 0.0, max = 100.0, message = "Interest rate must be between 0 and 100"))]
    pub interest_rate: f64,

    pub interest_type: InterestType,

    pub due_date: DateTime<Utc>,
}

/// Borrower's application for an unassigned loan, parsed from the multipart
/// form before the document is persisted
#[derive(Debug)]
pub struct LoanApplication {
    pub loan_id: Uuid,
    pub aadhar_number: String,
    pub pan_card_number: String,
    pub document_image: Option<String>,
}

/// Request to record a payment against a loan
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: f64,
}

/// Request to change a loan's status
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: LoanStatus,
}

/// Aadhaar numbers are exactly 12 ASCII digits
pub fn is_valid_aadhar(aadhar: &str) -> bool {
    aadhar.len() == 12 && aadhar.bytes().all(|b| b.is_ascii_digit())
}

/// PAN card numbers are 5 letters, 4 digits, 1 letter; input is accepted in
/// any case and stored upper-cased
pub fn normalize_pan(pan: &str) -> Option<String> {
    let pan = pan.to_ascii_uppercase();
    let bytes = pan.as_bytes();
    if bytes.len() != 10 {
        return None;
    }
    let shape_ok = bytes[..5].iter().all(|b| b.is_ascii_uppercase())
        && bytes[5..9].iter().all(|b| b.is_ascii_digit())
        && bytes[9].is_ascii_uppercase();
    shape_ok.then_some(pan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aadhar_accepts_twelve_digits() {
        assert!(is_valid_aadhar("123456789012"));
        assert!(is_valid_aadhar("000000000000"));
    }

    #[test]
    fn test_aadhar_rejects_bad_lengths() {
        assert!(!is_valid_aadhar(""));
        assert!(!is_valid_aadhar("12345678901"));
        assert!(!is_valid_aadhar("1234567890123"));
    }

    #[test]
    fn test_aadhar_rejects_non_digits() {
        assert!(!is_valid_aadhar("12345678901a"));
        assert!(!is_valid_aadhar("123456 89012"));
        // Non-ASCII digits must not pass
        assert!(!is_valid_aadhar("١٢٣٤٥٦٧٨٩٠١٢"));
    }

    #[test]
    fn test_pan_accepts_valid_format() {
        assert_eq!(normalize_pan("ABCDE1234F"), Some("ABCDE1234F".to_string()));
    }

    #[test]
    fn test_pan_normalizes_case() {
        assert_eq!(normalize_pan("abcde1234f"), Some("ABCDE1234F".to_string()));
        assert_eq!(normalize_pan("AbCdE1234f"), Some("ABCDE1234F".to_string()));
    }

    #[test]
    fn test_pan_rejects_deviations() {
        assert!(normalize_pan("ABCD1234F").is_none()); // too short
        assert!(normalize_pan("ABCDE12345F").is_none()); // too long
        assert!(normalize_pan("ABCD51234F").is_none()); // digit in letter block
        assert!(normalize_pan("ABCDE123AF").is_none()); // letter in digit block
        assert!(normalize_pan("ABCDE12345").is_none()); // digit in trailing letter
        assert!(normalize_pan("").is_none());
    }
}
