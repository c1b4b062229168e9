//! Phone number type with Colombian E.164 normalization.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A phone number normalized to E.164 for WhatsApp dispatch.
///
/// Normalization is total: any input produces a `+57`-prefixed number, which
/// matches what the messaging provider expects for Colombian recipients.
/// Inputs that already carry a country code are preserved.
///
/// ## Examples
///
/// ```
/// use licorera_core::Phone;
///
/// assert_eq!(Phone::normalize_co("300 123 4567").as_str(), "+573001234567");
/// assert_eq!(Phone::normalize_co("573001234567").as_str(), "+573001234567");
/// assert_eq!(Phone::normalize_co("03001234567").as_str(), "+573001234567");
/// assert_eq!(Phone::normalize_co("+13055550123").as_str(), "+13055550123");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Colombian country calling code.
    pub const COUNTRY_CODE: &'static str = "57";

    /// Normalize an arbitrary phone string to Colombian E.164.
    ///
    /// Rules, applied in order against the digit-only form of the input:
    /// - empty input yields the bare `+57` prefix (the provider rejects it,
    ///   and the failed send lands in the notification log)
    /// - a `57` prefix is kept and only `+` is added
    /// - a 10-digit mobile number gets `+57` prepended
    /// - an 11-digit number with a leading zero drops the zero first
    /// - inputs that already start with `+` pass through untouched
    #[must_use]
    pub fn normalize_co(input: &str) -> Self {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();

        if digits.is_empty() {
            return Self(format!("+{}", Self::COUNTRY_CODE));
        }
        if digits.starts_with(Self::COUNTRY_CODE) {
            return Self(format!("+{digits}"));
        }
        if digits.len() == 10 {
            return Self(format!("+{}{digits}", Self::COUNTRY_CODE));
        }
        if digits.len() == 11
            && let Some(rest) = digits.strip_prefix('0')
        {
            return Self(format!("+{}{rest}", Self::COUNTRY_CODE));
        }
        if input.starts_with('+') {
            return Self(input.to_owned());
        }
        Self(format!("+{}{digits}", Self::COUNTRY_CODE))
    }

    /// The normalized number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_spaces() {
        assert_eq!(Phone::normalize_co("(300) 123-4567").as_str(), "+573001234567");
    }

    #[test]
    fn keeps_existing_country_code() {
        assert_eq!(Phone::normalize_co("573001234567").as_str(), "+573001234567");
        assert_eq!(Phone::normalize_co("+573001234567").as_str(), "+573001234567");
    }

    #[test]
    fn drops_leading_zero_from_eleven_digits() {
        assert_eq!(Phone::normalize_co("03001234567").as_str(), "+573001234567");
    }

    #[test]
    fn foreign_numbers_pass_through() {
        assert_eq!(Phone::normalize_co("+13055550123").as_str(), "+13055550123");
    }

    #[test]
    fn empty_input_yields_bare_prefix() {
        assert_eq!(Phone::normalize_co("").as_str(), "+57");
        assert_eq!(Phone::normalize_co("---").as_str(), "+57");
    }

    #[test]
    fn short_local_numbers_get_prefixed() {
        assert_eq!(Phone::normalize_co("1234567").as_str(), "+571234567");
    }
}
