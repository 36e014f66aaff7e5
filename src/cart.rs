use std::sync::RwLock;

use anyhow::Result;
use log::{error, warn};

use crate::models::CartLineItem;
use crate::storage::{keys, Storage};

/// Durable local set of prospective purchases. In-memory state is the source
/// of truth for rendering; the durable write happens off the caller's path so
/// a mutation never waits on disk.
pub struct CartStore {
    storage: Storage,
    items: RwLock<Vec<CartLineItem>>,
}

impl CartStore {
    /// Rehydrates the cart from its fixed storage key. Unreadable stored
    /// state degrades to an empty cart rather than failing startup.
    pub async fn load(storage: Storage) -> Self {
        let items = match storage.get(keys::CART_ITEMS).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartLineItem>>(&raw) {
                Ok(items) => items,
                Err(err) => {
                    warn!("Discarding unreadable cart state: {err}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Failed to load cart: {err}");
                Vec::new()
            }
        };

        Self {
            storage,
            items: RwLock::new(items),
        }
    }

    pub fn items(&self) -> Vec<CartLineItem> {
        self.items.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().unwrap().is_empty()
    }

    pub fn contains(&self, course_id: &str) -> bool {
        self.items
            .read()
            .unwrap()
            .iter()
            .any(|item| item.course_id == course_id)
    }

    pub fn total(&self) -> f64 {
        self.items.read().unwrap().iter().map(|item| item.price).sum()
    }

    /// Appends the item unless its course is already in the cart. Returns
    /// whether anything changed.
    pub fn add(&self, item: CartLineItem) -> bool {
        let mut guard = self.items.write().unwrap();
        if guard.iter().any(|c| c.course_id == item.course_id) {
            return false;
        }
        guard.push(item);
        self.persist(&guard);
        true
    }

    pub fn remove(&self, course_id: &str) -> bool {
        let mut guard = self.items.write().unwrap();
        let before = guard.len();
        guard.retain(|item| item.course_id != course_id);
        if guard.len() == before {
            return false;
        }
        self.persist(&guard);
        true
    }

    pub fn clear(&self) {
        let mut guard = self.items.write().unwrap();
        guard.clear();
        // An empty cart deletes the persisted record outright.
        let storage = self.storage.clone();
        tokio::spawn(async move {
            if let Err(err) = storage.delete(keys::CART_ITEMS).await {
                error!("Failed to clear persisted cart: {err}");
            }
        });
    }

    fn persist(&self, items: &[CartLineItem]) {
        match serde_json::to_string(items) {
            Ok(raw) => {
                let storage = self.storage.clone();
                tokio::spawn(async move {
                    if let Err(err) = storage.put(keys::CART_ITEMS, raw).await {
                        error!("Failed to persist cart: {err}");
                    }
                });
            }
            Err(err) => error!("Failed to serialize cart: {err}"),
        }
    }

    /// Writes the current state through synchronously. Shutdown barrier; the
    /// regular mutation path never awaits storage.
    pub async fn flush(&self) -> Result<()> {
        let items = self.items();
        if items.is_empty() {
            self.storage.delete(keys::CART_ITEMS).await
        } else {
            let raw = serde_json::to_string(&items)?;
            self.storage.put(keys::CART_ITEMS, raw).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn item(course_id: &str, price: f64) -> CartLineItem {
        CartLineItem {
            course_id: course_id.into(),
            title: format!("Course {course_id}"),
            price,
        }
    }

    async fn fresh_store(dir: &TempDir) -> (Storage, CartStore) {
        let storage = Storage::open(dir.path().join("cart.sqlite3")).unwrap();
        let cart = CartStore::load(storage.clone()).await;
        (storage, cart)
    }

    #[tokio::test]
    async fn add_is_unique_per_course() {
        let dir = TempDir::new().unwrap();
        let (_storage, cart) = fresh_store(&dir).await;

        assert!(cart.add(item("a", 100.0)));
        assert!(!cart.add(item("a", 100.0)));
        assert_eq!(cart.len(), 1);

        assert!(cart.remove("a"));
        assert!(cart.add(item("a", 100.0)));
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn total_sums_line_prices() {
        let dir = TempDir::new().unwrap();
        let (_storage, cart) = fresh_store(&dir).await;

        cart.add(item("a", 100.0));
        cart.add(item("b", 200.0));
        cart.add(item("c", 50.0));
        assert_eq!(cart.total(), 350.0);

        cart.remove("b");
        assert_eq!(cart.total(), 150.0);
    }

    #[tokio::test]
    async fn cart_survives_reload() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path().join("cart.sqlite3")).unwrap();

        let cart = CartStore::load(storage.clone()).await;
        cart.add(item("a", 100.0));
        cart.add(item("b", 200.0));
        cart.flush().await.unwrap();

        let reloaded = CartStore::load(storage).await;
        assert_eq!(reloaded.items(), cart.items());
    }

    #[tokio::test]
    async fn corrupt_state_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path().join("cart.sqlite3")).unwrap();
        storage
            .put(keys::CART_ITEMS, "not json".into())
            .await
            .unwrap();

        let cart = CartStore::load(storage).await;
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn clear_removes_persisted_record() {
        let dir = TempDir::new().unwrap();
        let (storage, cart) = fresh_store(&dir).await;

        cart.add(item("a", 100.0));
        cart.flush().await.unwrap();
        cart.clear();
        cart.flush().await.unwrap();

        assert!(cart.is_empty());
        assert_eq!(storage.get(keys::CART_ITEMS).await.unwrap(), None);
    }
}
