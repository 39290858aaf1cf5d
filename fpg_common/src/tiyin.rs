use std::fmt::Display;

use serde::{Deserialize, Serialize};
use sqlx::Type;

pub const SUM_CURRENCY_CODE: &str = "UZS";

//--------------------------------------       Tiyin         ---------------------------------------------------------
/// An amount of money in tiyin, the minor unit of the Uzbek sum (1 sum = 100 tiyin).
///
/// The payment gateway quotes every amount in tiyin, so this is the only unit that crosses the wire or hits the
/// database.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Tiyin(i64);

impl From<i64> for Tiyin {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Tiyin {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Tiyin {}

impl Display for Tiyin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02} {SUM_CURRENCY_CODE}", abs / 100, abs % 100)
    }
}
