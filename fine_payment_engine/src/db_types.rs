use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use fpg_common::Tiyin;
use serde::{Deserialize, Serialize, Serializer};
use sqlx::{FromRow, Type};
use thiserror::Error;

/// Cancel reason recorded when a transaction is not performed before its deadline.
pub const REASON_TIMEOUT: i32 = 4;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------        FineId         ---------------------------------------------------------
/// The merchant's reference for a fine. The gateway calls it `account.order_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct FineId(pub String);

impl FromStr for FineId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for FineId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FineId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for FineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FineId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     TransactionId     ---------------------------------------------------------
/// The gateway-assigned transaction identifier. Globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TransactionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

impl TransactionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      FineStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FineStatus {
    /// The fine has been issued and is awaiting payment.
    Pending,
    /// A gateway transaction for the fine has been performed.
    Paid,
    /// The fine was withdrawn by the fine subsystem.
    Deleted,
}

impl Display for FineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FineStatus::Pending => write!(f, "pending"),
            FineStatus::Paid => write!(f, "paid"),
            FineStatus::Deleted => write!(f, "deleted"),
        }
    }
}

impl FromStr for FineStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "deleted" => Ok(Self::Deleted),
            s => Err(ConversionError(format!("Invalid fine status: {s}"))),
        }
    }
}

//--------------------------------------         Fine          ---------------------------------------------------------
/// A payable fine, as seen by the payment engine. The fine subsystem owns these records; the engine reads them and
/// flips their status as transactions are performed or cancelled.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Fine {
    pub id: FineId,
    pub amount: Tiyin,
    pub discounted_amount: Option<Tiyin>,
    pub issued_at: DateTime<Utc>,
    pub status: FineStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFine {
    pub id: FineId,
    pub amount: Tiyin,
    pub discounted_amount: Option<Tiyin>,
    pub issued_at: DateTime<Utc>,
}

impl NewFine {
    pub fn new<F: Into<FineId>>(id: F, amount: Tiyin, issued_at: DateTime<Utc>) -> Self {
        Self { id: id.into(), amount, discounted_amount: None, issued_at }
    }

    pub fn with_discounted_amount(mut self, discounted_amount: Tiyin) -> Self {
        self.discounted_amount = Some(discounted_amount);
        self
    }
}

//--------------------------------------   TransactionState    ---------------------------------------------------------
/// The protocol state of a gateway transaction. The discriminants are the wire codes.
///
/// | From \ To          | Performed | CancelledPending | CancelledPerformed |
/// |--------------------|-----------|------------------|--------------------|
/// | Pending            | ok        | ok               | Err                |
/// | Performed          | -         | Err              | ok                 |
/// | CancelledPending   | Err       | -                | Err                |
/// | CancelledPerformed | Err       | Err              | -                  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
#[repr(i32)]
pub enum TransactionState {
    Pending = 1,
    Performed = 2,
    CancelledPending = -1,
    CancelledPerformed = -2,
}

impl TransactionState {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn status(self) -> TransactionStatus {
        match self {
            Self::Pending => TransactionStatus::Pending,
            Self::Performed => TransactionStatus::Success,
            Self::CancelledPending | Self::CancelledPerformed => TransactionStatus::Cancelled,
        }
    }

    pub fn is_cancelled(self) -> bool {
        matches!(self, Self::CancelledPending | Self::CancelledPerformed)
    }

    /// The state a cancellation moves this state into, or `None` if the transaction is already cancelled.
    pub fn cancelled(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::CancelledPending),
            Self::Performed => Some(Self::CancelledPerformed),
            Self::CancelledPending | Self::CancelledPerformed => None,
        }
    }
}

impl TryFrom<i32> for TransactionState {
    type Error = ConversionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Pending),
            2 => Ok(Self::Performed),
            -1 => Ok(Self::CancelledPending),
            -2 => Ok(Self::CancelledPerformed),
            v => Err(ConversionError(format!("Invalid transaction state: {v}"))),
        }
    }
}

impl Serialize for TransactionState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for TransactionState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: serde::Deserializer<'de> {
        let code = i32::deserialize(deserializer)?;
        Self::try_from(code).map_err(serde::de::Error::custom)
    }
}

impl Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending(1)"),
            Self::Performed => write!(f, "Performed(2)"),
            Self::CancelledPending => write!(f, "CancelledPending(-1)"),
            Self::CancelledPerformed => write!(f, "CancelledPerformed(-2)"),
        }
    }
}

//--------------------------------------   TransactionStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Success,
    Cancelled,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Success => write!(f, "success"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

//--------------------------------------      Transaction      ---------------------------------------------------------
/// The merchant's mirror of a gateway transaction. All times are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub fine_id: FineId,
    pub amount: Tiyin,
    /// The creation time reported by the gateway in `CreateTransaction`.
    #[sqlx(rename = "gateway_time")]
    pub time: i64,
    pub state: TransactionState,
    pub create_time: i64,
    pub perform_time: Option<i64>,
    pub cancel_time: Option<i64>,
    pub reason: Option<i32>,
    /// Persisted deadline after which a still-pending transaction is cancelled.
    pub expires_at: i64,
}

impl Transaction {
    pub fn status(&self) -> TransactionStatus {
        self.state.status()
    }

    pub fn is_pending(&self) -> bool {
        self.state == TransactionState::Pending
    }

    /// A transaction is overdue once `now` reaches its deadline while it is still pending.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && now.timestamp_millis() >= self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub transaction_id: TransactionId,
    pub fine_id: FineId,
    pub amount: Tiyin,
    pub time: i64,
    pub create_time: i64,
    pub expires_at: i64,
}

impl NewTransaction {
    pub fn new(
        transaction_id: TransactionId,
        fine_id: FineId,
        amount: Tiyin,
        time: i64,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Self {
        let create_time = now.timestamp_millis();
        let expires_at = (now + timeout).timestamp_millis();
        Self { transaction_id, fine_id, amount, time, create_time, expires_at }
    }
}
