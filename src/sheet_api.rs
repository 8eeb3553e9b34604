//! HTTP client for the spreadsheet web service.
//!
//! Every call is a query-string action against one deployed URL
//! (`?action=getInventory`, `?action=updateStock&barcode=...`). Writes go
//! out as POST with the parameters still in the query string, since the
//! script host ignores multipart bodies; only `uploadImage` sends a
//! form body. Replies are JSON, either a bare array or a
//! `{success, data}` / `{success, error}` envelope.

use crate::backend::{Backend, MinStockUpdate, StockUpdate, StockUpdateResult};
use crate::error::{Error, Result};
use crate::product::{value_int, value_text, Product, Transaction};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, error};
use serde_json::Value;

/// Deployed Apps Script endpoint the web app was built against
pub const DEFAULT_API_URL: &str = "https://script.google.com/macros/s/AKfycbwAdd8MyZZ_7K7pWI1vCvpnMp8Rq7B_nhQ4xV-Z7XxbyA2hfFI_Bn8UL9FFWWryC4nm/exec";

/// Client for the spreadsheet web service
#[derive(Clone)]
pub struct SheetClient {
    http: reqwest::Client,
    base_url: String,
}

impl SheetClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, params: &[(&str, String)]) -> Result<Value> {
        debug!("GET {} {:?}", self.base_url, params);
        let resp = self.http.get(&self.base_url).query(params).send().await?;
        Self::decode(resp).await
    }

    async fn post(&self, params: &[(&str, String)]) -> Result<Value> {
        debug!("POST {} {:?}", self.base_url, params);
        let resp = self.http.post(&self.base_url).query(params).send().await?;
        Self::decode(resp).await
    }

    async fn decode(resp: reqwest::Response) -> Result<Value> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Remote(format!("HTTP {}: {}", status.as_u16(), body)));
        }
        serde_json::from_str(&body).map_err(|e| Error::Decode(format!("{}: {}", e, body)))
    }

    async fn list(&self, params: &[(&str, String)]) -> Result<Vec<Value>> {
        let body = self.get(params).await?;
        records(body)
    }
}

fn action(name: &str) -> (&'static str, String) {
    ("action", name.to_string())
}

/// Pull the record list out of either reply shape
///
/// A bare array is the list itself; an envelope carries it in `data`.
/// A failed envelope becomes [`Error::Remote`]; anything else is an
/// empty list.
pub fn records(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            check_success(&map)?;
            match map.remove("data") {
                Some(Value::Array(items)) => Ok(items),
                _ => Ok(Vec::new()),
            }
        }
        _ => Ok(Vec::new()),
    }
}

fn check_success(map: &serde_json::Map<String, Value>) -> Result<()> {
    if map.get("success") == Some(&Value::Bool(false)) {
        let message = map
            .get("error")
            .or_else(|| map.get("message"))
            .map(value_text)
            .unwrap_or_else(|| "request failed".to_string());
        return Err(Error::Remote(message));
    }
    Ok(())
}

/// Parse an acknowledgement (`{success, message, newStock}`)
pub fn ack(body: &Value) -> Result<StockUpdateResult> {
    let map = body
        .as_object()
        .ok_or_else(|| Error::Decode(format!("expected an object, got {}", body)))?;
    check_success(map)?;

    Ok(StockUpdateResult {
        success: true,
        message: map.get("message").map(value_text).filter(|m| !m.is_empty()),
        new_stock: map.get("newStock").and_then(value_int),
    })
}

#[async_trait]
impl Backend for SheetClient {
    async fn inventory(&self) -> Result<Vec<Product>> {
        let items = self.list(&[action("getInventory")]).await.map_err(|e| {
            error!("Error fetching inventory: {}", e);
            e
        })?;
        Ok(items.iter().filter_map(Product::from_record).collect())
    }

    async fn history(&self, start_date: Option<NaiveDate>) -> Result<Vec<Transaction>> {
        let mut params = vec![action("getHistory")];
        if let Some(date) = start_date {
            params.push(("startDate", date.format("%Y-%m-%d").to_string()));
        }
        let items = self.list(&params).await.map_err(|e| {
            error!("Error fetching history: {}", e);
            e
        })?;
        Ok(items.iter().filter_map(Transaction::from_record).collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<Product>> {
        let items = self
            .list(&[action("searchProduct"), ("query", query.to_string())])
            .await?;
        Ok(items.iter().filter_map(Product::from_record).collect())
    }

    async fn product(&self, barcode: &str) -> Result<Product> {
        let body = self
            .get(&[action("getProduct"), ("barcode", barcode.to_string())])
            .await?;

        let record = match body {
            Value::Object(mut map) => {
                check_success(&map).map_err(|_| Error::NotFound(barcode.to_string()))?;
                match map.remove("data") {
                    Some(data) => data,
                    None => Value::Object(map),
                }
            }
            other => other,
        };

        Product::from_record(&record)
            .filter(Product::has_barcode)
            .ok_or_else(|| Error::NotFound(barcode.to_string()))
    }

    async fn update_stock(&self, update: &StockUpdate) -> Result<StockUpdateResult> {
        let mut params = vec![
            action("updateStock"),
            ("barcode", update.barcode.clone()),
            ("amount", update.amount.to_string()),
            ("type", update.kind.as_str().to_string()),
            ("userId", update.user_id.clone()),
        ];
        if let Some(url) = update.image_url.as_ref().filter(|u| !u.is_empty()) {
            params.push(("imageUrl", url.clone()));
        }

        let body = self.post(&params).await.map_err(|e| {
            error!("Error updating stock: {}", e);
            e
        })?;
        ack(&body)
    }

    async fn bulk_update_min_stock(&self, updates: &[MinStockUpdate]) -> Result<String> {
        let payload = serde_json::to_string(updates)?;
        let body = self
            .post(&[action("bulkUpdateMinStock"), ("updates", payload)])
            .await?;
        let reply = ack(&body)?;
        Ok(reply
            .message
            .unwrap_or_else(|| format!("Updated {} items", updates.len())))
    }

    async fn save_report(&self, note: &str) -> Result<()> {
        let body = self
            .post(&[action("saveReport"), ("note", note.to_string())])
            .await?;
        ack(&body).map(|_| ())
    }

    async fn clear_history(&self) -> Result<String> {
        let body = self.post(&[action("clearHistory")]).await?;
        Ok(ack(&body)?.message.unwrap_or_default())
    }

    async fn upload_image(&self, data_url: &str, barcode: &str) -> Result<String> {
        let form = [
            ("action", "uploadImage"),
            ("imageData", data_url),
            ("barcode", barcode),
        ];
        let resp = self.http.post(&self.base_url).form(&form).send().await?;
        let body = Self::decode(resp).await?;

        let map = body
            .as_object()
            .ok_or_else(|| Error::Decode("upload reply is not an object".to_string()))?;
        check_success(map)?;
        map.get("imageUrl")
            .map(value_text)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Decode("upload reply has no imageUrl".to_string()))
    }
}
