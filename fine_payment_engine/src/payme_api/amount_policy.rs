//! The discount window.
//!
//! A fine that carries a discounted amount may be settled for that amount up to and including
//! [`DISCOUNT_WINDOW_DAYS`] days after it was issued. After that the full amount is due.
//!
//! `CheckPerformTransaction` and `CreateTransaction` evaluate the policy independently, each with its own request time.
//! A payer who checks just before the window closes and creates just after it will be told the discounted price by
//! the first call and rejected with `InvalidAmount` by the second. This is a known tolerance: the window is measured
//! in days, and the gateway simply restarts the payment at the full price.
//!
//! The amount is checked before a retried `CreateTransaction` is matched against its stored transaction. A retry that
//! arrives after the window has closed therefore fails with `InvalidAmount` even though the transaction exists, and
//! the stored transaction is left as it was.
use chrono::{DateTime, Duration, Utc};
use fpg_common::Tiyin;

use crate::db_types::Fine;

pub const DISCOUNT_WINDOW_DAYS: i64 = 15;

pub fn discount_window() -> Duration {
    Duration::days(DISCOUNT_WINDOW_DAYS)
}

/// The amount due for `fine` at time `now`. The window boundary is inclusive.
pub fn payable_amount(fine: &Fine, now: DateTime<Utc>) -> Tiyin {
    match fine.discounted_amount {
        Some(discounted) if now <= fine.issued_at + discount_window() => discounted,
        _ => fine.amount,
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;
    use crate::db_types::FineStatus;

    fn fine(discounted: Option<i64>) -> Fine {
        let issued_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        Fine {
            id: "F-100".into(),
            amount: Tiyin::from(100_000),
            discounted_amount: discounted.map(Tiyin::from),
            issued_at,
            status: FineStatus::Pending,
            created_at: issued_at,
            updated_at: issued_at,
        }
    }

    #[test]
    fn discount_applies_inside_window() {
        let fine = fine(Some(50_000));
        assert_eq!(payable_amount(&fine, fine.issued_at), Tiyin::from(50_000));
        assert_eq!(payable_amount(&fine, fine.issued_at + Duration::days(14)), Tiyin::from(50_000));
    }

    #[test]
    fn boundary_is_inclusive() {
        let fine = fine(Some(50_000));
        let boundary = fine.issued_at + Duration::days(15);
        assert_eq!(payable_amount(&fine, boundary), Tiyin::from(50_000));
        assert_eq!(payable_amount(&fine, boundary + Duration::milliseconds(1)), Tiyin::from(100_000));
    }

    #[test]
    fn full_amount_without_discount() {
        let fine = fine(None);
        assert_eq!(payable_amount(&fine, fine.issued_at), Tiyin::from(100_000));
        assert_eq!(payable_amount(&fine, fine.issued_at + Duration::days(30)), Tiyin::from(100_000));
    }
}
