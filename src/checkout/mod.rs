use std::sync::Arc;

use log::{info, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::api::{ApiClient, ApiError};
use crate::cart::CartStore;
use crate::models::CartLineItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseStatus {
    Succeeded,
    Failed,
}

/// One checkout attempt for one line item. Ephemeral; exists only to drive
/// the reconciliation summary.
#[derive(Debug, Clone)]
pub struct PurchaseOutcome {
    pub course_id: String,
    pub title: String,
    pub status: PurchaseStatus,
    pub error: Option<String>,
}

impl PurchaseOutcome {
    fn succeeded(item: &CartLineItem) -> Self {
        Self {
            course_id: item.course_id.clone(),
            title: item.title.clone(),
            status: PurchaseStatus::Succeeded,
            error: None,
        }
    }

    fn failed(item: &CartLineItem, message: String) -> Self {
        Self {
            course_id: item.course_id.clone(),
            title: item.title.clone(),
            status: PurchaseStatus::Failed,
            error: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PurchaseStatus::Succeeded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutResolution {
    AllSucceeded,
    Partial,
    AllFailed,
}

/// Result of one checkout batch. The user always gets an explicit
/// acknowledgment; nobody is left wondering which purchases went through.
#[derive(Debug, Clone)]
pub struct CheckoutReport {
    pub batch_id: Uuid,
    pub resolution: CheckoutResolution,
    /// Outcome order matches cart order.
    pub outcomes: Vec<PurchaseOutcome>,
    /// Balance after the batch, when the refresh (or a purchase response)
    /// supplied one.
    pub new_balance: Option<f64>,
}

impl CheckoutReport {
    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    fn failure_lines(&self) -> String {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| {
                format!(
                    "• {}: {}",
                    o.title,
                    o.error.as_deref().unwrap_or("Unknown error")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn summary(&self) -> String {
        match self.resolution {
            CheckoutResolution::AllSucceeded => "All courses purchased successfully!".to_string(),
            CheckoutResolution::Partial => format!(
                "{} course(s) purchased successfully.\n\nFailed:\n{}",
                self.succeeded_count(),
                self.failure_lines()
            ),
            CheckoutResolution::AllFailed => {
                format!("Failed to purchase courses:\n{}", self.failure_lines())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("You need ₹{required:.2} but only have ₹{available:.2} in your wallet.")]
    InsufficientFunds {
        required: f64,
        available: f64,
        shortfall: f64,
    },
    /// The pre-batch balance check itself failed; nothing was purchased.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Executes a batch purchase of the cart's line items and reconciles local
/// cart state against partial success.
pub struct CheckoutOrchestrator {
    api: Arc<ApiClient>,
    cart: Arc<CartStore>,
}

impl CheckoutOrchestrator {
    pub fn new(api: Arc<ApiClient>, cart: Arc<CartStore>) -> Self {
        Self { api, cart }
    }

    pub async fn run(&self) -> Result<CheckoutReport, CheckoutError> {
        let items = self.cart.items();
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let required: f64 = items.iter().map(|item| item.price).sum();
        let available = self.api.wallet_balance().await?;
        if available < required {
            return Err(CheckoutError::InsufficientFunds {
                required,
                available,
                shortfall: required - available,
            });
        }

        let batch_id = Uuid::new_v4();
        info!(
            "Checkout batch {batch_id}: {} item(s), total ₹{required:.2}",
            items.len()
        );

        // Strictly sequential: the payment path is rate-limited and the
        // outcome order must match the cart order.
        let mut outcomes = Vec::with_capacity(items.len());
        let mut inline_balance = None;
        for item in &items {
            match self.api.purchase_course(&item.course_id).await {
                Ok(response) => {
                    inline_balance = response.new_balance.or(inline_balance);
                    outcomes.push(PurchaseOutcome::succeeded(item));
                }
                Err(err) => {
                    outcomes.push(PurchaseOutcome::failed(item, err.user_message()));
                }
            }
        }

        // One balance refresh for the whole batch, never per item.
        let new_balance = match self.api.wallet_balance().await {
            Ok(balance) => Some(balance),
            Err(err) => {
                warn!("Failed to refresh wallet balance after batch {batch_id}: {err}");
                inline_balance
            }
        };

        let succeeded: Vec<_> = outcomes.iter().filter(|o| o.is_success()).collect();
        let resolution = if succeeded.len() == outcomes.len() {
            self.cart.clear();
            CheckoutResolution::AllSucceeded
        } else if !succeeded.is_empty() {
            // Reconcile by course id; titles are not unique.
            for outcome in &succeeded {
                self.cart.remove(&outcome.course_id);
            }
            CheckoutResolution::Partial
        } else {
            CheckoutResolution::AllFailed
        };

        info!(
            "Checkout batch {batch_id} finished: {}/{} succeeded",
            succeeded.len(),
            outcomes.len()
        );

        Ok(CheckoutReport {
            batch_id,
            resolution,
            outcomes,
            new_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::storage::Storage;
    use mockito::{Server, ServerGuard};
    use tempfile::TempDir;

    fn item(course_id: &str, title: &str, price: f64) -> CartLineItem {
        CartLineItem {
            course_id: course_id.into(),
            title: title.into(),
            price,
        }
    }

    async fn cart_with(dir: &TempDir, items: &[CartLineItem]) -> Arc<CartStore> {
        let storage = Storage::open(dir.path().join("cart.sqlite3")).unwrap();
        let cart = CartStore::load(storage).await;
        for item in items {
            cart.add(item.clone());
        }
        Arc::new(cart)
    }

    fn api_for(server: &ServerGuard) -> Arc<ApiClient> {
        let client = ApiClient::new(&ClientConfig::for_tests(&server.url())).unwrap();
        client.set_token(Some("test-token".into()));
        Arc::new(client)
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_without_network_calls() {
        // An unroutable gateway proves no request is attempted.
        let client = ApiClient::new(&ClientConfig::for_tests("http://127.0.0.1:1")).unwrap();
        client.set_token(Some("test-token".into()));

        let dir = TempDir::new().unwrap();
        let cart = cart_with(&dir, &[]).await;
        let orchestrator = CheckoutOrchestrator::new(Arc::new(client), cart);

        assert!(matches!(
            orchestrator.run().await,
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[tokio::test]
    async fn insufficient_funds_blocks_the_batch() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/wallet/balance")
            .with_status(200)
            .with_body(r#"{"balance":200.0}"#)
            .create_async()
            .await;
        let purchase = server
            .mock("POST", mockito::Matcher::Regex(r"^/api/courses/.*/purchase$".into()))
            .expect(0)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let cart = cart_with(&dir, &[item("a", "Course A", 300.0), item("b", "Course B", 200.0)]).await;
        let orchestrator = CheckoutOrchestrator::new(api_for(&server), cart.clone());

        match orchestrator.run().await {
            Err(CheckoutError::InsufficientFunds {
                required,
                available,
                shortfall,
            }) => {
                assert_eq!(required, 500.0);
                assert_eq!(available, 200.0);
                assert_eq!(shortfall, 300.0);
            }
            other => panic!("expected insufficient funds, got {other:?}"),
        }

        purchase.assert_async().await;
        assert_eq!(cart.len(), 2);
    }

    #[tokio::test]
    async fn partial_failure_keeps_only_failed_items_in_the_cart() {
        let mut server = Server::new_async().await;
        let balance = server
            .mock("GET", "/api/wallet/balance")
            .with_status(200)
            .with_body(r#"{"balance":350.0}"#)
            .expect(2)
            .create_async()
            .await;
        server
            .mock("POST", "/api/courses/a/purchase")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        server
            .mock("POST", "/api/courses/b/purchase")
            .with_status(400)
            .with_body(r#"{"error":"insufficient course capacity"}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/api/courses/c/purchase")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let cart = cart_with(
            &dir,
            &[
                item("a", "Course A", 100.0),
                item("b", "Course B", 200.0),
                item("c", "Course C", 50.0),
            ],
        )
        .await;
        let orchestrator = CheckoutOrchestrator::new(api_for(&server), cart.clone());

        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.resolution, CheckoutResolution::Partial);
        assert_eq!(report.outcomes.len(), 3);
        assert!(report.outcomes[0].is_success());
        assert!(!report.outcomes[1].is_success());
        assert_eq!(
            report.outcomes[1].error.as_deref(),
            Some("insufficient course capacity")
        );
        assert!(report.outcomes[2].is_success());

        // Only the failed line item survives, matched by course id.
        let remaining = cart.items();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].course_id, "b");

        // Pre-check plus exactly one post-batch refresh.
        balance.assert_async().await;

        let summary = report.summary();
        assert!(summary.contains("2 course(s) purchased successfully."));
        assert!(summary.contains("• Course B: insufficient course capacity"));
    }

    #[tokio::test]
    async fn all_succeeded_clears_the_cart() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/wallet/balance")
            .with_status(200)
            .with_body(r#"{"balance":1000.0}"#)
            .expect(2)
            .create_async()
            .await;
        server
            .mock("POST", "/api/courses/a/purchase")
            .with_status(200)
            .with_body(r#"{"newBalance":900.0}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let cart = cart_with(&dir, &[item("a", "Course A", 100.0)]).await;
        let orchestrator = CheckoutOrchestrator::new(api_for(&server), cart.clone());

        let report = orchestrator.run().await.unwrap();
        assert_eq!(report.resolution, CheckoutResolution::AllSucceeded);
        assert_eq!(report.new_balance, Some(1000.0));
        assert!(cart.is_empty());
        assert_eq!(report.summary(), "All courses purchased successfully!");
    }

    #[tokio::test]
    async fn all_failed_leaves_the_cart_untouched() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/wallet/balance")
            .with_status(200)
            .with_body(r#"{"balance":1000.0}"#)
            .expect(2)
            .create_async()
            .await;
        server
            .mock("POST", "/api/courses/a/purchase")
            .with_status(400)
            .with_body(r#"{"error":"already purchased"}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/api/courses/b/purchase")
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let cart = cart_with(
            &dir,
            &[item("a", "Course A", 100.0), item("b", "Course B", 50.0)],
        )
        .await;
        let orchestrator = CheckoutOrchestrator::new(api_for(&server), cart.clone());

        let report = orchestrator.run().await.unwrap();
        assert_eq!(report.resolution, CheckoutResolution::AllFailed);
        assert_eq!(cart.len(), 2);
        assert_eq!(
            report.outcomes[0].error.as_deref(),
            Some("already purchased")
        );
        // A 500 with a non-JSON body degrades to the generic server text.
        assert_eq!(
            report.outcomes[1].error.as_deref(),
            Some("Server error (500)")
        );
    }
}
