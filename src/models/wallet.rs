use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Completed,
    Rejected,
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Pending
    }
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Approved => "approved",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Rejected => "rejected",
        }
    }

    /// Top-up requests settle only after admin approval.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Approved | TransactionStatus::Completed
        )
    }
}

/// One wallet ledger entry as reported by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    #[serde(rename = "_id")]
    pub id: String,
    pub amount: f64,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub utr_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
