//! Assertions for scenario bodies
//!
//! These return [`E2eError::AssertionFailed`] instead of panicking so a
//! failed check flows through the normal failure path.

use std::fmt::Display;

use crate::error::{E2eError, E2eResult};

/// Fail with "expected <expected>, got <actual>" unless they are equal
pub fn expect_eq<T>(actual: T, expected: T) -> E2eResult<()>
where
    T: PartialEq + Display,
{
    if actual == expected {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(format!(
            "expected {}, got {}",
            expected, actual
        )))
    }
}

pub fn expect_contains(text: &str, needle: &str) -> E2eResult<()> {
    if text.contains(needle) {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(format!(
            "expected text containing '{}', got '{}'",
            needle, text
        )))
    }
}

/// Fail with "expected <what>, got false" unless `condition` holds
pub fn expect_true(condition: bool, what: &str) -> E2eResult<()> {
    if condition {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(format!("expected {}, got false", what)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_eq_message() {
        let err = expect_eq(0, 100).unwrap_err();
        assert_eq!(err.detail(), "expected 100, got 0");
        assert!(expect_eq("Harry Potter", "Harry Potter").is_ok());
    }

    #[test]
    fn test_expect_contains() {
        assert!(expect_contains("Deposit Successful", "Successful").is_ok());
        let err = expect_contains("Transaction Failed", "successful").unwrap_err();
        assert_eq!(
            err.detail(),
            "expected text containing 'successful', got 'Transaction Failed'"
        );
    }

    #[test]
    fn test_expect_true() {
        assert!(expect_true(true, "a row").is_ok());
        assert_eq!(
            expect_true(false, "a row").unwrap_err().detail(),
            "expected a row, got false"
        );
    }
}
