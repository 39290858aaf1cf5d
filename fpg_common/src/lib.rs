mod tiyin;

pub mod helpers;
mod secret;

pub use secret::Secret;
pub use tiyin::{Tiyin, SUM_CURRENCY_CODE};
