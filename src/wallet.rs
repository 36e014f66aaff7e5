use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiClient, ApiResult};
use crate::models::WalletTransaction;

#[derive(Debug, Error)]
pub enum WalletError {
    /// Malformed local input; rejected before any request is issued.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] crate::api::ApiError),
}

/// Wallet reads plus the manual top-up flow: the user pays over UPI out of
/// band, then submits the bank's UTR reference for admin approval.
pub struct WalletService {
    api: Arc<ApiClient>,
}

impl WalletService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn balance(&self) -> ApiResult<f64> {
        self.api.wallet_balance().await
    }

    pub async fn transactions(&self) -> ApiResult<Vec<WalletTransaction>> {
        self.api.wallet_transactions().await
    }

    /// Validates the free-form amount and UTR fields locally, then submits
    /// the top-up request.
    pub async fn submit_top_up(
        &self,
        amount: &str,
        utr_number: &str,
        description: Option<&str>,
    ) -> Result<(), WalletError> {
        let amount: f64 = amount
            .trim()
            .parse()
            .map_err(|_| WalletError::Validation("Please enter a valid amount".into()))?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(WalletError::Validation(
                "Please enter a valid amount".into(),
            ));
        }

        let utr = utr_number.trim();
        if utr.is_empty() {
            return Err(WalletError::Validation("Please enter UTR number".into()));
        }

        let default_description = format!("Wallet top-up - UTR: {utr}");
        let description = description.unwrap_or(&default_description);

        self.api.submit_top_up(amount, utr, description).await?;
        Ok(())
    }
}
