use crate::{
    db_types::{Fine, FineId, FineStatus},
    traits::PaymentGatewayError,
};

/// Read access to fines, plus the single status update the payment flow is allowed to make.
///
/// Fines are created, edited and deleted by the fine subsystem, which is not part of this crate.
#[allow(async_fn_in_trait)]
pub trait FineLookup {
    /// Fetches the fine with the given id, or `None` if no such fine exists.
    async fn fetch_fine(&self, id: &FineId) -> Result<Option<Fine>, PaymentGatewayError>;

    /// Sets the status of the fine. Fails with [`PaymentGatewayError::FineNotFound`] if the fine does not exist.
    async fn update_fine_status(&self, id: &FineId, status: FineStatus) -> Result<Fine, PaymentGatewayError>;
}
