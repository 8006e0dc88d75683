//! Password policy validation.
//!
//! A pure checker: the caller supplies the candidate password, the
//! username it will be paired with, and the recent password history;
//! the checker returns a structured verdict and never mutates its
//! inputs. Prompt/retry loops live in the host layer (see `cli`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters accepted as "special" by the variety rule
pub const SPECIAL_CHARS: &str = "!@#$%^&*";

/// Tunable password policy limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordRules {
    /// Minimum password length (default: 10)
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    /// Minimum count of uppercase letters (default: 2)
    #[serde(default = "default_min_upper")]
    pub min_upper: usize,

    /// Minimum count of lowercase letters (default: 2)
    #[serde(default = "default_min_lower")]
    pub min_lower: usize,

    /// Minimum count of ASCII digits (default: 2)
    #[serde(default = "default_min_digits")]
    pub min_digits: usize,

    /// Minimum count of characters from [`SPECIAL_CHARS`] (default: 1)
    #[serde(default = "default_min_special")]
    pub min_special: usize,

    /// How many prior passwords the history may hold (default: 3)
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
}

fn default_min_length() -> usize {
    10
}
fn default_min_upper() -> usize {
    2
}
fn default_min_lower() -> usize {
    2
}
fn default_min_digits() -> usize {
    2
}
fn default_min_special() -> usize {
    1
}
fn default_history_depth() -> usize {
    3
}

impl Default for PasswordRules {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            min_upper: default_min_upper(),
            min_lower: default_min_lower(),
            min_digits: default_min_digits(),
            min_special: default_min_special(),
            history_depth: default_history_depth(),
        }
    }
}

impl PasswordRules {
    /// Validate a candidate password against a username and the recent
    /// password history.
    ///
    /// Rules are applied in order and the first failure wins:
    /// length, character variety, username substrings, repeated runs,
    /// history reuse.
    pub fn validate(
        &self,
        password: &str,
        username: &str,
        history: &[String],
    ) -> Result<(), PolicyViolation> {
        if password.chars().count() < self.min_length {
            return Err(PolicyViolation::TooShort {
                min_length: self.min_length,
            });
        }

        let upper = password.chars().filter(|c| c.is_ascii_uppercase()).count();
        let lower = password.chars().filter(|c| c.is_ascii_lowercase()).count();
        let digits = password.chars().filter(|c| c.is_ascii_digit()).count();
        let special = password.chars().filter(|c| SPECIAL_CHARS.contains(*c)).count();
        if upper < self.min_upper
            || lower < self.min_lower
            || digits < self.min_digits
            || special < self.min_special
        {
            return Err(PolicyViolation::MissingVariety);
        }

        if contains_username_trigram(password, username) {
            return Err(PolicyViolation::ContainsUsername);
        }

        if has_repeated_run(password, 4) {
            return Err(PolicyViolation::RepeatedRun);
        }

        if history.iter().any(|prior| prior == password) {
            return Err(PolicyViolation::RecentlyUsed);
        }

        Ok(())
    }
}

/// True if any contiguous 3-character substring of `username` occurs in
/// `password` (case-sensitive). Usernames shorter than 3 characters
/// contribute no substrings.
fn contains_username_trigram(password: &str, username: &str) -> bool {
    let chars: Vec<char> = username.chars().collect();
    chars.windows(3).any(|window| {
        let trigram: String = window.iter().collect();
        password.contains(&trigram)
    })
}

/// True if any single character repeats at least `run_len` times
/// consecutively.
fn has_repeated_run(password: &str, run_len: usize) -> bool {
    let mut run = 0usize;
    let mut prev: Option<char> = None;
    for c in password.chars() {
        if prev == Some(c) {
            run += 1;
        } else {
            run = 1;
            prev = Some(c);
        }
        if run >= run_len {
            return true;
        }
    }
    false
}

/// Why a candidate password was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("Password must be at least {min_length} characters long.")]
    TooShort { min_length: usize },

    // The message overstates the special-character count; one satisfies
    // the matcher.
    #[error("Password must contain at least two uppercase letters, two lowercase letters, two digits, and two special characters.")]
    MissingVariety,

    #[error("Password cannot contain sequences of three or more consecutive characters from the username.")]
    ContainsUsername,

    #[error("No character should repeat more than three times in a row.")]
    RepeatedRun,

    #[error("Password cannot be the same as any of the last three passwords.")]
    RecentlyUsed,
}
