//! Loan policy: checkout window, fine rate, and per-borrower limit.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Circulation limits applied by a [`Catalog`](super::Catalog)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPolicy {
    /// Checkout window in days (default: 14)
    #[serde(default = "default_loan_days")]
    pub loan_days: i64,

    /// Flat fine per overdue day, in whole dollars (default: 1)
    #[serde(default = "default_daily_fine")]
    pub daily_fine_dollars: u32,

    /// Maximum books a borrower may hold at once (default: 3)
    #[serde(default = "default_checkout_limit")]
    pub checkout_limit: usize,
}

fn default_loan_days() -> i64 {
    14
}
fn default_daily_fine() -> u32 {
    1
}
fn default_checkout_limit() -> usize {
    3
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            loan_days: default_loan_days(),
            daily_fine_dollars: default_daily_fine(),
            checkout_limit: default_checkout_limit(),
        }
    }
}

impl LoanPolicy {
    /// The checkout window as a chrono duration
    pub fn loan_period(&self) -> Duration {
        Duration::days(self.loan_days)
    }

    /// Fine for a loan checked out at `checked_out_at`, settled at `now`.
    /// Whole days past the due date, at the flat daily rate; zero when
    /// returned within the window.
    pub fn fine_dollars(
        &self,
        checked_out_at: chrono::DateTime<chrono::Utc>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> u32 {
        let due = checked_out_at + self.loan_period();
        if now <= due {
            return 0;
        }
        let days_overdue = (now - due).num_days();
        days_overdue as u32 * self.daily_fine_dollars
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = LoanPolicy::default();
        assert_eq!(policy.loan_days, 14);
        assert_eq!(policy.daily_fine_dollars, 1);
        assert_eq!(policy.checkout_limit, 3);
    }

    #[test]
    fn test_fine_within_window_is_zero() {
        let policy = LoanPolicy::default();
        let now = Utc::now();

        assert_eq!(policy.fine_dollars(now, now), 0);
        assert_eq!(policy.fine_dollars(now - Duration::days(14), now), 0);
    }

    #[test]
    fn test_fine_counts_whole_days() {
        let policy = LoanPolicy::default();
        let now = Utc::now();

        // 16 days out: 2 days overdue
        assert_eq!(policy.fine_dollars(now - Duration::days(16), now), 2);

        // 15 days and change: still 1 whole day
        let checked_out = now - Duration::days(15) - Duration::hours(6);
        assert_eq!(policy.fine_dollars(checked_out, now), 1);
    }
}
