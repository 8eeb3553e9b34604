use crate::backend::{Backend, StockUpdate, StockUpdateResult};
use crate::error::{Error, Result};
use crate::inventory;
use crate::product::Product;
use crate::scanner::{normalize_code, ScanGuard};
use crate::snapshot::{load_snapshot, save_snapshot, InventorySnapshot};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Result of processing one decoded barcode
#[derive(Clone, Debug, PartialEq)]
pub enum Capture {
    Found(Product),
    NotFound(String),
}

/// Cached inventory list in front of the spreadsheet service
///
/// Lookups run against the cached list first and refresh it from the
/// service on a miss, so newly added sheet rows are picked up without a
/// reload. The last good list is written to disk and served when the
/// service cannot be reached.
pub struct InventoryStore {
    backend: Arc<dyn Backend>,
    cache: RwLock<Vec<Product>>,
    snapshot_path: Option<PathBuf>,
    scans: ScanGuard,
}

impl InventoryStore {
    pub fn new(backend: Arc<dyn Backend>, snapshot_path: Option<PathBuf>) -> Self {
        Self {
            backend,
            cache: RwLock::new(Vec::new()),
            snapshot_path,
            scans: ScanGuard::new(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn scan_guard(&self) -> &ScanGuard {
        &self.scans
    }

    /// Fetch the inventory from the service and replace the cache
    pub async fn refresh(&self) -> Result<Vec<Product>> {
        match self.backend.inventory().await {
            Ok(list) => {
                *self.cache.write().await = list.clone();
                if let Some(path) = &self.snapshot_path {
                    if let Err(e) = save_snapshot(&InventorySnapshot::new(list.clone()), path) {
                        warn!("Could not write inventory snapshot {}: {}", path.display(), e);
                    }
                }
                Ok(list)
            }
            Err(e) => {
                error!("Failed to load inventory: {}", e);
                match self.offline_copy() {
                    Some(list) => {
                        *self.cache.write().await = list.clone();
                        Ok(list)
                    }
                    None => Err(e),
                }
            }
        }
    }

    fn offline_copy(&self) -> Option<Vec<Product>> {
        let path = self.snapshot_path.as_ref()?;
        match load_snapshot(path) {
            Ok(snapshot) => {
                warn!(
                    "Serving {} products from snapshot saved at {}",
                    snapshot.products.len(),
                    snapshot.saved_at
                );
                Some(snapshot.products)
            }
            Err(_) => None,
        }
    }

    /// The cached list, fetching it on first use
    pub async fn products(&self) -> Result<Vec<Product>> {
        {
            let cache = self.cache.read().await;
            if !cache.is_empty() {
                return Ok(cache.clone());
            }
        }
        self.refresh().await
    }

    /// Run a lookup against the cache, then once more after a refresh
    async fn find_with_refresh<F>(&self, matcher: F) -> Result<Option<Product>>
    where
        F: Fn(&[Product]) -> Option<Product>,
    {
        let local = self.products().await?;
        if let Some(found) = matcher(&local) {
            return Ok(Some(found));
        }

        info!("Not found locally. Fetching latest inventory...");
        let fresh = self.refresh().await?;
        Ok(matcher(&fresh))
    }

    /// Process a decoded barcode (camera, photo or typed)
    ///
    /// Only one capture runs at a time; a second one while the first is
    /// still in flight fails with [`Error::Busy`].
    pub async fn capture(&self, raw: &str) -> Result<Capture> {
        let _session = self.scans.try_begin()?;
        let code = normalize_code(raw)?;
        info!("Scan Processing: Received code \"{}\"", code);

        let found = self
            .find_with_refresh(|list| inventory::find_product(list, &code).cloned())
            .await?;

        Ok(match found {
            Some(product) => Capture::Found(product.with_defaults()),
            None => Capture::NotFound(code),
        })
    }

    /// Resolve a typed search term (barcode or name)
    pub async fn resolve(&self, term: &str) -> Result<Option<Product>> {
        if term.trim().is_empty() {
            return Ok(None);
        }
        self.find_with_refresh(|list| inventory::resolve_query(list, term).cloned())
            .await
            .map(|found| found.map(Product::with_defaults))
    }

    /// Write a stock adjustment and mirror it in the cache
    pub async fn adjust_stock(&self, update: StockUpdate) -> Result<StockUpdateResult> {
        inventory::validate_amount(update.amount).map_err(Error::Invalid)?;

        let mut result = self.backend.update_stock(&update).await?;
        let local = {
            let mut cache = self.cache.write().await;
            inventory::apply_adjustment(&mut cache, &update.barcode, update.kind, update.amount)
        };
        if result.new_stock.is_none() {
            result.new_stock = local;
        }
        Ok(result)
    }
}
