use std::fmt::Debug;

use chrono::{DateTime, Duration, TimeZone, Utc};
use log::*;

use crate::{
    db_types::{Fine, FineId, FineStatus, NewTransaction, Transaction, TransactionId, TransactionState, REASON_TIMEOUT},
    payme_api::{
        amount_policy::payable_amount,
        errors::PaymeError,
        locks::TransactionLocks,
        payme_objects::{
            Account,
            CancelTransactionParams,
            CancelTransactionResult,
            CheckPerformTransactionParams,
            CheckPerformTransactionResult,
            CheckTransactionParams,
            CheckTransactionResult,
            CreateTransactionParams,
            CreateTransactionResult,
            GetStatementParams,
            GetStatementResult,
            PerformTransactionParams,
            PerformTransactionResult,
            StatementEntry,
        },
    },
    traits::{InsertTransactionResult, TransactionStore},
};

pub const DEFAULT_TRANSACTION_TIMEOUT_HOURS: i64 = 12;

/// `TransactionFlowApi` drives gateway transactions through their life cycle in response to gateway calls, and expires
/// the ones that are never completed.
///
/// Every method takes the time of the request as `now`. Callers capture it once per request so that all the checks made
/// on behalf of that request agree with each other.
///
/// Anything that changes a transaction runs under the per-transaction lock, and re-reads the stored record after
/// taking it. Clones share the same locks, so the HTTP handlers and the expiry worker must use clones of one instance.
#[derive(Clone)]
pub struct TransactionFlowApi<B> {
    db: B,
    locks: TransactionLocks,
    timeout: Duration,
}

impl<B> Debug for TransactionFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TransactionFlowApi (timeout: {}h)", self.timeout.num_hours())
    }
}

impl<B> TransactionFlowApi<B> {
    pub fn new(db: B, timeout: Duration) -> Self {
        Self { db, locks: TransactionLocks::new(), timeout }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// How long a transaction may stay pending before it is cancelled.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn locks(&self) -> &TransactionLocks {
        &self.locks
    }
}

impl<B> TransactionFlowApi<B>
where B: TransactionStore
{
    /// Answers whether the fine can be paid with `amount` right now. Changes nothing.
    pub async fn check_perform_transaction(
        &self,
        params: CheckPerformTransactionParams,
        now: DateTime<Utc>,
    ) -> Result<CheckPerformTransactionResult, PaymeError> {
        let fine = self.resolve_fine(&params.account).await?;
        if fine.status != FineStatus::Pending {
            debug!("🔄️🔍️ Fine {} cannot be paid. It is {}", fine.id, fine.status);
            return Err(PaymeError::CantDoOperation(format!("Fine {} is {}", fine.id, fine.status)));
        }
        let expected = payable_amount(&fine, now);
        if expected != params.amount {
            debug!("🔄️🔍️ Fine {} costs {expected}, but the gateway offered {}", fine.id, params.amount);
            return Err(PaymeError::InvalidAmount { expected, actual: params.amount });
        }
        trace!("🔄️🔍️ Fine {} can be paid with {expected}", fine.id);
        Ok(CheckPerformTransactionResult { allow: true })
    }

    /// Opens a new pending transaction for a fine, or replays the answer for a transaction id that already exists.
    pub async fn create_transaction(
        &self,
        params: CreateTransactionParams,
        now: DateTime<Utc>,
    ) -> Result<CreateTransactionResult, PaymeError> {
        let fine = self.resolve_fine(&params.account).await?;
        let expected = payable_amount(&fine, now);
        if expected != params.amount {
            debug!("🔄️🆕️ Fine {} costs {expected}, but the gateway offered {}", fine.id, params.amount);
            return Err(PaymeError::InvalidAmount { expected, actual: params.amount });
        }
        if params.time <= 0 || Utc.timestamp_millis_opt(params.time).single().is_none() {
            return Err(PaymeError::InvalidTransactionTime(params.time));
        }

        let tx_id = params.id;
        let _guard = self.locks.lock(&tx_id).await;
        if let Some(existing) = self.db.fetch_transaction(&tx_id).await? {
            return replay_create(&existing, &fine.id);
        }
        match fine.status {
            FineStatus::Pending => {},
            FineStatus::Paid => return Err(PaymeError::FineAlreadyPaid(fine.id)),
            FineStatus::Deleted => return Err(PaymeError::CantDoOperation(format!("Fine {} has been deleted", fine.id))),
        }
        if let Some(pending) = self.db.fetch_pending_transaction_for_fine(&fine.id).await? {
            if !self.expire_if_overdue(&pending.transaction_id, now).await? {
                info!("🔄️🆕️ Fine {} is already being paid by {}. Rejecting {tx_id}", fine.id, pending.transaction_id);
                return Err(PaymeError::FineHasPendingTransaction(fine.id));
            }
        }

        let new_tx = NewTransaction::new(tx_id.clone(), fine.id.clone(), expected, params.time, now, self.timeout);
        match self.db.insert_transaction(new_tx).await? {
            InsertTransactionResult::Inserted(tx) => {
                info!("🔄️🆕️ Transaction {tx_id} created for fine {} ({})", fine.id, tx.amount);
                Ok(CreateTransactionResult::from(&tx))
            },
            InsertTransactionResult::AlreadyExists(_) => {
                // Another writer sharing the database got there first.
                let existing = self.fetch_or_not_found(&tx_id).await?;
                replay_create(&existing, &fine.id)
            },
            InsertTransactionResult::FineBusy(fine_id) => {
                info!("🔄️🆕️ Fine {fine_id} acquired a pending transaction concurrently. Rejecting {tx_id}");
                Err(PaymeError::FineHasPendingTransaction(fine_id))
            },
        }
    }

    /// Completes a pending transaction and marks its fine as paid. Repeating the call returns the original answer.
    pub async fn perform_transaction(
        &self,
        params: PerformTransactionParams,
        now: DateTime<Utc>,
    ) -> Result<PerformTransactionResult, PaymeError> {
        let tx_id = params.id;
        let _guard = self.locks.lock(&tx_id).await;
        let tx = self.fetch_or_not_found(&tx_id).await?;
        match tx.state {
            TransactionState::Performed => {
                trace!("🔄️💰️ Transaction {tx_id} was already performed. Replaying the result");
                Ok(PerformTransactionResult::from(&tx))
            },
            TransactionState::Pending if tx.is_overdue(now) => {
                self.expire_locked(&tx_id, now).await?;
                Err(PaymeError::CantDoOperation(format!("Transaction {tx_id} has expired")))
            },
            TransactionState::Pending => {
                let performed = self
                    .db
                    .mark_transaction_performed(&tx_id, now.timestamp_millis())
                    .await?
                    .ok_or_else(|| PaymeError::CantDoOperation(format!("Transaction {tx_id} is no longer pending")))?;
                info!("🔄️💰️ Transaction {tx_id} performed. Fine {} is paid", performed.fine_id);
                Ok(PerformTransactionResult::from(&performed))
            },
            TransactionState::CancelledPending | TransactionState::CancelledPerformed => {
                debug!("🔄️💰️ Transaction {tx_id} cannot be performed. It is {}", tx.state);
                Err(PaymeError::CantDoOperation(format!("Transaction {tx_id} has been cancelled")))
            },
        }
    }

    /// Cancels a pending or performed transaction and reopens its fine. Repeating the call returns the original answer.
    pub async fn cancel_transaction(
        &self,
        params: CancelTransactionParams,
        now: DateTime<Utc>,
    ) -> Result<CancelTransactionResult, PaymeError> {
        let tx_id = params.id;
        let _guard = self.locks.lock(&tx_id).await;
        let tx = self.fetch_or_not_found(&tx_id).await?;
        if tx.state.is_cancelled() {
            trace!("🔄️❌️ Transaction {tx_id} was already cancelled. Replaying the result");
            return Ok(CancelTransactionResult::from(&tx));
        }
        let cancelled = self
            .db
            .mark_transaction_cancelled(&tx_id, tx.state, params.reason, now.timestamp_millis())
            .await?
            .ok_or_else(|| PaymeError::CantDoOperation(format!("Transaction {tx_id} changed state during cancellation")))?;
        info!("🔄️❌️ Transaction {tx_id} cancelled with reason {}. State is now {}", params.reason, cancelled.state);
        Ok(CancelTransactionResult::from(&cancelled))
    }

    pub async fn check_transaction(&self, params: CheckTransactionParams) -> Result<CheckTransactionResult, PaymeError> {
        let tx = self.fetch_or_not_found(&params.id).await?;
        Ok(CheckTransactionResult::from(&tx))
    }

    /// All transactions created in `[from, to]`, oldest first.
    pub async fn get_statement(&self, params: GetStatementParams) -> Result<GetStatementResult, PaymeError> {
        let transactions = self.db.fetch_transactions_created_between(params.from, params.to).await?;
        trace!("🔄️📜️ Statement for [{}, {}] has {} entries", params.from, params.to, transactions.len());
        Ok(GetStatementResult { transactions: transactions.iter().map(StatementEntry::from).collect() })
    }

    /// Cancels, with [`REASON_TIMEOUT`], every pending transaction whose deadline is at or before `now`, and reopens
    /// their fines. Returns the transactions that were cancelled.
    ///
    /// A failure on one transaction is logged and does not stop the sweep. The next sweep will pick it up again.
    pub async fn expire_stale_transactions(&self, now: DateTime<Utc>) -> Result<Vec<Transaction>, PaymeError> {
        let candidates = self.db.fetch_expired_transactions(now.timestamp_millis()).await?;
        let mut expired = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let tx_id = candidate.transaction_id;
            let _guard = self.locks.lock(&tx_id).await;
            match self.db.fetch_transaction(&tx_id).await {
                Ok(Some(tx)) if tx.is_overdue(now) => match self.expire_locked(&tx_id, now).await {
                    Ok(Some(tx)) => expired.push(tx),
                    Ok(None) => {},
                    Err(e) => warn!("🕰️ Could not expire transaction {tx_id}. {e}"),
                },
                Ok(_) => trace!("🕰️ Transaction {tx_id} was settled before it could be expired"),
                Err(e) => warn!("🕰️ Could not re-read transaction {tx_id}. {e}"),
            }
        }
        Ok(expired)
    }

    /// Cancels every live transaction attached to the fine, for example because the fine is about to be withdrawn.
    /// Returns the transactions that were cancelled.
    pub async fn cancel_transactions_for_fine(
        &self,
        fine_id: &FineId,
        reason: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, PaymeError> {
        let transactions = self.db.fetch_transactions_for_fine(fine_id).await?;
        let mut cancelled = Vec::new();
        for tx in transactions.into_iter().filter(|tx| !tx.state.is_cancelled()) {
            let tx_id = tx.transaction_id;
            let _guard = self.locks.lock(&tx_id).await;
            let Some(current) = self.db.fetch_transaction(&tx_id).await? else {
                continue;
            };
            if current.state.is_cancelled() {
                continue;
            }
            if let Some(tx) =
                self.db.mark_transaction_cancelled(&tx_id, current.state, reason, now.timestamp_millis()).await?
            {
                info!("🔄️❌️ Transaction {tx_id} cancelled with reason {reason} along with fine {fine_id}");
                cancelled.push(tx);
            }
        }
        Ok(cancelled)
    }

    async fn resolve_fine(&self, account: &Account) -> Result<Fine, PaymeError> {
        let fine_id = account.order_id.as_ref().ok_or(PaymeError::OrderIdMissing)?;
        self.db.fetch_fine(fine_id).await?.ok_or_else(|| PaymeError::FineNotFound(fine_id.clone()))
    }

    async fn fetch_or_not_found(&self, tx_id: &TransactionId) -> Result<Transaction, PaymeError> {
        self.db.fetch_transaction(tx_id).await?.ok_or_else(|| PaymeError::TransactionNotFound(tx_id.clone()))
    }

    /// Takes the lock for `tx_id` and expires it if it is overdue. Returns whether the transaction is no longer
    /// pending.
    async fn expire_if_overdue(&self, tx_id: &TransactionId, now: DateTime<Utc>) -> Result<bool, PaymeError> {
        let _guard = self.locks.lock(tx_id).await;
        match self.db.fetch_transaction(tx_id).await? {
            Some(tx) if tx.is_overdue(now) => {
                self.expire_locked(tx_id, now).await?;
                Ok(true)
            },
            Some(tx) => Ok(!tx.is_pending()),
            None => Ok(true),
        }
    }

    /// The caller must hold the lock for `tx_id`.
    async fn expire_locked(&self, tx_id: &TransactionId, now: DateTime<Utc>) -> Result<Option<Transaction>, PaymeError> {
        let expired = self
            .db
            .mark_transaction_cancelled(tx_id, TransactionState::Pending, REASON_TIMEOUT, now.timestamp_millis())
            .await?;
        if let Some(tx) = &expired {
            info!("🕰️ Transaction {tx_id} expired. Fine {} is open for payment again", tx.fine_id);
        }
        Ok(expired)
    }
}

fn replay_create(existing: &Transaction, fine_id: &FineId) -> Result<CreateTransactionResult, PaymeError> {
    if &existing.fine_id != fine_id {
        return Err(PaymeError::CantDoOperation(format!(
            "Transaction {} belongs to fine {}, not {fine_id}",
            existing.transaction_id, existing.fine_id
        )));
    }
    trace!("🔄️🆕️ Transaction {} already exists. Replaying the result", existing.transaction_id);
    Ok(CreateTransactionResult::from(existing))
}
