use crate::error::{Error, Result};
use crate::product::{Product, StockType, Transaction};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Stock write sent to the spreadsheet service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    pub barcode: String,
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: StockType,
    pub user_id: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Reply to a stock write
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdateResult {
    pub success: bool,
    pub message: Option<String>,
    pub new_stock: Option<i64>,
}

/// One minimum-stock change (from an AI recommendation)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinStockUpdate {
    pub barcode: String,
    pub min_stock: i64,
}

/// The spreadsheet-backed service that owns inventory and history
///
/// [`crate::sheet_api::SheetClient`] talks to the deployed web app;
/// [`MockBackend`] keeps everything in memory for demos and tests.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    async fn inventory(&self) -> Result<Vec<Product>>;

    /// History, optionally only from `start_date` on
    async fn history(&self, start_date: Option<NaiveDate>) -> Result<Vec<Transaction>>;

    async fn search(&self, query: &str) -> Result<Vec<Product>>;

    async fn product(&self, barcode: &str) -> Result<Product>;

    async fn update_stock(&self, update: &StockUpdate) -> Result<StockUpdateResult>;

    /// Returns the service's confirmation message
    async fn bulk_update_min_stock(&self, updates: &[MinStockUpdate]) -> Result<String>;

    /// Snapshot today's figures into the Reports sheet
    async fn save_report(&self, note: &str) -> Result<()>;

    async fn clear_history(&self) -> Result<String>;

    /// Store a photo (data URL) and return its public URL
    async fn upload_image(&self, data_url: &str, barcode: &str) -> Result<String>;
}

struct MockData {
    products: Vec<Product>,
    history: Vec<Transaction>,
}

/// In-memory stand-in for the spreadsheet service
pub struct MockBackend {
    data: Mutex<MockData>,
}

impl MockBackend {
    pub fn new(products: Vec<Product>) -> Self {
        MockBackend {
            data: Mutex::new(MockData {
                products,
                history: Vec::new(),
            }),
        }
    }

    pub fn with_history(self, history: Vec<Transaction>) -> Self {
        if let Ok(mut data) = self.data.lock() {
            data.history = history;
        }
        self
    }

    /// The three demo products the web app ships with
    pub fn demo() -> Self {
        let item = |barcode: &str, name: &str, stock: i64, unit: &str, min_stock: i64| Product {
            barcode: barcode.to_string(),
            name: name.to_string(),
            stock,
            min_stock,
            unit: unit.to_string(),
            ..Product::default()
        };

        MockBackend::new(vec![
            item("8850123456789", "น้ำดื่ม Crystal 600ml", 150, "ขวด", 20),
            item("8850987654321", "Lays Classic 50g", 45, "ซอง", 50),
            item("1234567890123", "Coca Cola 325ml", 12, "กระป๋อง", 24),
        ])
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MockData>> {
        self.data
            .lock()
            .map_err(|_| Error::Remote("mock data poisoned".to_string()))
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn inventory(&self) -> Result<Vec<Product>> {
        Ok(self.lock()?.products.clone())
    }

    async fn history(&self, start_date: Option<NaiveDate>) -> Result<Vec<Transaction>> {
        let data = self.lock()?;
        Ok(data
            .history
            .iter()
            .filter(|h| match (start_date, h.local_time()) {
                (Some(start), Some(t)) => t.date_naive() >= start,
                _ => true,
            })
            .cloned()
            .collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<Product>> {
        let q = query.to_lowercase();
        Ok(self
            .lock()?
            .products
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&q) || p.barcode.contains(query))
            .cloned()
            .collect())
    }

    async fn product(&self, barcode: &str) -> Result<Product> {
        self.lock()?
            .products
            .iter()
            .find(|p| p.barcode == barcode)
            .cloned()
            .ok_or_else(|| Error::NotFound(barcode.to_string()))
    }

    async fn update_stock(&self, update: &StockUpdate) -> Result<StockUpdateResult> {
        let mut data = self.lock()?;
        let item = data
            .products
            .iter_mut()
            .find(|p| p.barcode == update.barcode)
            .ok_or_else(|| Error::NotFound(update.barcode.clone()))?;

        item.stock += update.kind.signed(update.amount);
        item.last_updated = Local::now().to_rfc3339();
        if let Some(url) = &update.image_url {
            item.image_url = url.clone();
        }
        let new_stock = item.stock;
        let product_name = item.name.clone();

        data.history.insert(
            0,
            Transaction {
                timestamp: Local::now().to_rfc3339(),
                barcode: update.barcode.clone(),
                product_name,
                kind: update.kind,
                amount: update.amount,
                user_id: update.user_id.clone(),
            },
        );

        Ok(StockUpdateResult {
            success: true,
            message: Some("อัปเดตสำเร็จ (Mock)".to_string()),
            new_stock: Some(new_stock),
        })
    }

    async fn bulk_update_min_stock(&self, updates: &[MinStockUpdate]) -> Result<String> {
        let mut data = self.lock()?;
        let mut changed = 0;
        for u in updates {
            if let Some(item) = data.products.iter_mut().find(|p| p.barcode == u.barcode) {
                item.min_stock = u.min_stock;
                changed += 1;
            }
        }
        Ok(format!("Mock updated {} items", changed))
    }

    async fn save_report(&self, _note: &str) -> Result<()> {
        Ok(())
    }

    async fn clear_history(&self) -> Result<String> {
        self.lock()?.history.clear();
        Ok("Mock history cleared".to_string())
    }

    async fn upload_image(&self, data_url: &str, _barcode: &str) -> Result<String> {
        if !data_url.starts_with("data:image/") {
            return Err(Error::Invalid("image data must be a data URL".to_string()));
        }
        Ok("https://via.placeholder.com/300".to_string())
    }
}
