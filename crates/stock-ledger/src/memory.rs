use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::ProductId;
use tokio::sync::{Mutex, RwLock};

use crate::{
    LedgerConfig, LedgerError, ReservationId, ReservationToken, Result, StockLedger, StockLevel,
};

#[derive(Debug)]
struct Hold {
    quantity: u32,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct ProductEntry {
    available: u32,
    holds: HashMap<ReservationId, Hold>,
    /// Committed reservations and the time after which they are forgotten.
    committed: HashMap<ReservationId, DateTime<Utc>>,
}

impl ProductEntry {
    fn held(&self) -> u32 {
        self.holds.values().map(|h| h.quantity).sum()
    }

    fn level(&self) -> StockLevel {
        StockLevel {
            available: self.available,
            held: self.held(),
        }
    }
}

/// In-memory stock ledger.
///
/// Every product has its own lock, so operations on one product never wait
/// on another. The product table itself is only write-locked when a new
/// product is added.
#[derive(Clone, Default)]
pub struct InMemoryStockLedger {
    products: Arc<RwLock<HashMap<ProductId, Arc<Mutex<ProductEntry>>>>>,
    config: LedgerConfig,
}

impl InMemoryStockLedger {
    /// Creates an empty ledger with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty ledger with the given configuration.
    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            products: Arc::default(),
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Sets the available quantity for a product, creating its record if needed.
    ///
    /// Existing holds are kept; lowering stock below the held quantity makes
    /// later commits of those holds fail.
    pub async fn set_stock(&self, product_id: impl Into<ProductId>, quantity: u32) {
        let product_id = product_id.into();
        let entry = self.entry_or_insert(product_id.clone()).await;
        entry.lock().await.available = quantity;
        tracing::info!(%product_id, quantity, "stock level set");
    }

    /// Adds `quantity` units to a product, creating its record if needed.
    pub async fn restock(&self, product_id: impl Into<ProductId>, quantity: u32) {
        let entry = self.entry_or_insert(product_id.into()).await;
        let mut entry = entry.lock().await;
        entry.available = entry.available.saturating_add(quantity);
    }

    /// Returns the number of committed reservations still remembered.
    pub async fn remembered_commits(&self) -> usize {
        let entries: Vec<_> = self.products.read().await.values().cloned().collect();
        let mut count = 0;
        for entry in entries {
            count += entry.lock().await.committed.len();
        }
        count
    }

    /// Returns the number of uncommitted holds across all products.
    pub async fn active_holds(&self) -> usize {
        let entries: Vec<_> = self.products.read().await.values().cloned().collect();
        let mut count = 0;
        for entry in entries {
            count += entry.lock().await.holds.len();
        }
        count
    }

    async fn entry(&self, product_id: &ProductId) -> Result<Arc<Mutex<ProductEntry>>> {
        self.products
            .read()
            .await
            .get(product_id)
            .cloned()
            .ok_or_else(|| LedgerError::ProductNotFound(product_id.clone()))
    }

    async fn entry_or_insert(&self, product_id: ProductId) -> Arc<Mutex<ProductEntry>> {
        if let Some(entry) = self.products.read().await.get(&product_id) {
            return entry.clone();
        }
        self.products
            .write()
            .await
            .entry(product_id)
            .or_default()
            .clone()
    }
}

#[async_trait]
impl StockLedger for InMemoryStockLedger {
    async fn check_availability(&self, product_id: &ProductId, quantity: u32) -> Result<bool> {
        let entry = self.entry(product_id).await?;
        let available = entry.lock().await.available;
        Ok(available >= quantity)
    }

    #[tracing::instrument(skip(self, product_id), fields(product_id = %product_id))]
    async fn reserve(&self, product_id: &ProductId, quantity: u32) -> Result<ReservationToken> {
        if quantity == 0 {
            return Err(LedgerError::InvalidQuantity {
                product_id: product_id.clone(),
                quantity,
            });
        }

        let entry = self.entry(product_id).await?;
        let mut entry = entry.lock().await;

        let level = entry.level();
        if level.held.saturating_add(quantity) > level.available {
            return Err(LedgerError::InsufficientStock {
                product_id: product_id.clone(),
                requested: quantity,
                available: level.unreserved(),
            });
        }

        let token = ReservationToken::new(
            product_id.clone(),
            quantity,
            Utc::now() + self.config.reservation_ttl,
        );
        entry.holds.insert(
            token.id(),
            Hold {
                quantity,
                expires_at: token.expires_at(),
            },
        );

        metrics::counter!("stock_reservations_total").increment(1);
        tracing::debug!(reservation_id = %token.id(), quantity, "stock reserved");

        Ok(token)
    }

    #[tracing::instrument(skip(self, token), fields(product_id = %token.product_id(), reservation_id = %token.id()))]
    async fn commit(&self, token: &ReservationToken) -> Result<()> {
        let entry = self.entry(token.product_id()).await?;
        let mut entry = entry.lock().await;

        if entry.committed.contains_key(&token.id()) {
            tracing::debug!("reservation already committed");
            return Ok(());
        }

        let quantity = entry
            .holds
            .get(&token.id())
            .map(|h| h.quantity)
            .ok_or(LedgerError::ReservationNotFound(token.id()))?;

        if quantity > entry.available {
            return Err(LedgerError::InsufficientStock {
                product_id: token.product_id().clone(),
                requested: quantity,
                available: entry.available,
            });
        }

        entry.available -= quantity;
        entry.holds.remove(&token.id());
        entry
            .committed
            .insert(token.id(), token.expires_at() + self.config.commit_retention);

        tracing::debug!(quantity, remaining = entry.available, "reservation committed");
        Ok(())
    }

    #[tracing::instrument(skip(self, token), fields(product_id = %token.product_id(), reservation_id = %token.id()))]
    async fn release(&self, token: &ReservationToken) -> Result<()> {
        let entry = self.entry(token.product_id()).await?;
        let mut entry = entry.lock().await;

        if entry.committed.contains_key(&token.id()) {
            return Err(LedgerError::AlreadyCommitted(token.id()));
        }

        if entry.holds.remove(&token.id()).is_some() {
            tracing::debug!("reservation released");
        }
        Ok(())
    }

    async fn stock_level(&self, product_id: &ProductId) -> Result<StockLevel> {
        let entry = self.entry(product_id).await?;
        let level = entry.lock().await.level();
        Ok(level)
    }

    async fn release_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let entries: Vec<(ProductId, Arc<Mutex<ProductEntry>>)> = self
            .products
            .read()
            .await
            .iter()
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect();

        let mut released = 0;
        for (product_id, entry) in entries {
            let mut entry = entry.lock().await;
            let before = entry.holds.len();
            entry.holds.retain(|_, hold| hold.expires_at > now);
            let dropped = before - entry.holds.len();
            entry.committed.retain(|_, forget_at| *forget_at > now);
            if dropped > 0 {
                tracing::info!(%product_id, dropped, "released expired reservations");
                released += dropped;
            }
        }

        if released > 0 {
            metrics::counter!("stock_reservations_expired_total").increment(released as u64);
        }
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    async fn ledger_with(product: &str, quantity: u32) -> InMemoryStockLedger {
        let ledger = InMemoryStockLedger::new();
        ledger.set_stock(product, quantity).await;
        ledger
    }

    #[tokio::test]
    async fn test_check_availability_is_read_only() {
        let ledger = ledger_with("SKU-001", 5).await;
        let sku = ProductId::new("SKU-001");

        assert!(ledger.check_availability(&sku, 5).await.unwrap());
        assert!(!ledger.check_availability(&sku, 6).await.unwrap());
        assert_eq!(
            ledger.stock_level(&sku).await.unwrap(),
            StockLevel {
                available: 5,
                held: 0
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let ledger = InMemoryStockLedger::new();
        let sku = ProductId::new("missing");

        assert_eq!(
            ledger.check_availability(&sku, 1).await,
            Err(LedgerError::ProductNotFound(sku.clone()))
        );
        assert!(matches!(
            ledger.reserve(&sku, 1).await,
            Err(LedgerError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reserve_holds_without_decrementing() {
        let ledger = ledger_with("SKU-001", 5).await;
        let sku = ProductId::new("SKU-001");

        let token = ledger.reserve(&sku, 3).await.unwrap();
        assert_eq!(token.quantity(), 3);

        let level = ledger.stock_level(&sku).await.unwrap();
        assert_eq!(level.available, 5);
        assert_eq!(level.held, 3);
        assert_eq!(level.unreserved(), 2);
    }

    #[tokio::test]
    async fn test_reserve_counts_existing_holds() {
        let ledger = ledger_with("SKU-001", 5).await;
        let sku = ProductId::new("SKU-001");

        ledger.reserve(&sku, 3).await.unwrap();
        let err = ledger.reserve(&sku, 3).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientStock {
                product_id: sku.clone(),
                requested: 3,
                available: 2,
            }
        );
        ledger.reserve(&sku, 2).await.unwrap();
    }

    #[tokio::test]
    async fn test_reserve_rejects_zero_quantity() {
        let ledger = ledger_with("SKU-001", 5).await;
        let err = ledger
            .reserve(&ProductId::new("SKU-001"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidQuantity { quantity: 0, .. }));
    }

    #[tokio::test]
    async fn test_commit_decrements_once() {
        let ledger = ledger_with("SKU-001", 5).await;
        let sku = ProductId::new("SKU-001");

        let token = ledger.reserve(&sku, 2).await.unwrap();
        ledger.commit(&token).await.unwrap();
        ledger.commit(&token).await.unwrap();

        assert_eq!(
            ledger.stock_level(&sku).await.unwrap(),
            StockLevel {
                available: 3,
                held: 0
            }
        );
    }

    #[tokio::test]
    async fn test_release_restores_unreserved_quantity() {
        let ledger = ledger_with("SKU-001", 5).await;
        let sku = ProductId::new("SKU-001");

        let token = ledger.reserve(&sku, 5).await.unwrap();
        ledger.release(&token).await.unwrap();
        ledger.release(&token).await.unwrap();

        let level = ledger.stock_level(&sku).await.unwrap();
        assert_eq!(level.available, 5);
        assert_eq!(level.held, 0);
    }

    #[tokio::test]
    async fn test_released_token_cannot_be_committed() {
        let ledger = ledger_with("SKU-001", 5).await;
        let sku = ProductId::new("SKU-001");

        let token = ledger.reserve(&sku, 1).await.unwrap();
        ledger.release(&token).await.unwrap();

        assert_eq!(
            ledger.commit(&token).await,
            Err(LedgerError::ReservationNotFound(token.id()))
        );
        assert_eq!(ledger.stock_level(&sku).await.unwrap().available, 5);
    }

    #[tokio::test]
    async fn test_committed_token_cannot_be_released() {
        let ledger = ledger_with("SKU-001", 5).await;
        let token = ledger.reserve(&ProductId::new("SKU-001"), 1).await.unwrap();
        ledger.commit(&token).await.unwrap();

        assert_eq!(
            ledger.release(&token).await,
            Err(LedgerError::AlreadyCommitted(token.id()))
        );
    }

    #[tokio::test]
    async fn test_commit_never_drives_stock_negative() {
        let ledger = ledger_with("SKU-001", 5).await;
        let sku = ProductId::new("SKU-001");

        let token = ledger.reserve(&sku, 4).await.unwrap();
        ledger.set_stock("SKU-001", 1).await;

        assert!(matches!(
            ledger.commit(&token).await,
            Err(LedgerError::InsufficientStock { requested: 4, .. })
        ));
        assert_eq!(ledger.stock_level(&sku).await.unwrap().available, 1);
    }

    #[tokio::test]
    async fn test_release_expired_only_drops_expired_holds() {
        let ledger = InMemoryStockLedger::with_config(LedgerConfig {
            reservation_ttl: Duration::from_secs(60),
            ..LedgerConfig::default()
        });
        ledger.set_stock("SKU-001", 10).await;
        let sku = ProductId::new("SKU-001");

        let held = ledger.reserve(&sku, 2).await.unwrap();
        let committed = ledger.reserve(&sku, 3).await.unwrap();
        ledger.commit(&committed).await.unwrap();

        assert_eq!(ledger.release_expired(Utc::now()).await.unwrap(), 0);
        assert_eq!(ledger.active_holds().await, 1);

        let later = held.expires_at() + chrono::TimeDelta::seconds(1);
        assert_eq!(ledger.release_expired(later).await.unwrap(), 1);
        assert_eq!(ledger.active_holds().await, 0);

        let level = ledger.stock_level(&sku).await.unwrap();
        assert_eq!(level.available, 7);
        assert_eq!(level.held, 0);
    }

    #[tokio::test]
    async fn test_release_expired_forgets_old_commits() {
        let ledger = InMemoryStockLedger::with_config(LedgerConfig {
            reservation_ttl: Duration::from_secs(60),
            commit_retention: Duration::from_secs(60),
            ..LedgerConfig::default()
        });
        ledger.set_stock("SKU-001", 10).await;
        let sku = ProductId::new("SKU-001");

        let token = ledger.reserve(&sku, 3).await.unwrap();
        ledger.commit(&token).await.unwrap();
        assert_eq!(ledger.remembered_commits().await, 1);

        let in_window = token.expires_at() + chrono::TimeDelta::seconds(30);
        ledger.release_expired(in_window).await.unwrap();
        assert_eq!(ledger.remembered_commits().await, 1);
        ledger.commit(&token).await.unwrap();
        assert_eq!(ledger.stock_level(&sku).await.unwrap().available, 7);

        let past_window = token.expires_at() + chrono::TimeDelta::seconds(61);
        ledger.release_expired(past_window).await.unwrap();
        assert_eq!(ledger.remembered_commits().await, 0);
        assert!(matches!(
            ledger.commit(&token).await,
            Err(LedgerError::ReservationNotFound(_))
        ));
        assert_eq!(ledger.stock_level(&sku).await.unwrap().available, 7);
    }

    #[tokio::test]
    async fn test_restock_adds_to_existing_quantity() {
        let ledger = ledger_with("SKU-001", 2).await;
        ledger.restock("SKU-001", 3).await;
        ledger.restock("SKU-NEW", 4).await;

        assert_eq!(
            ledger
                .stock_level(&ProductId::new("SKU-001"))
                .await
                .unwrap()
                .available,
            5
        );
        assert_eq!(
            ledger
                .stock_level(&ProductId::new("SKU-NEW"))
                .await
                .unwrap()
                .available,
            4
        );
    }
}
