use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Name shown when the sheet row has no product name
pub const DEFAULT_NAME: &str = "ไม่ระบุชื่อ";

/// Unit shown when the sheet row has no unit
pub const DEFAULT_UNIT: &str = "ชิ้น";

/// Image shown when the sheet row has no picture
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x400/png?text=No+Image";

/// A product row from the inventory sheet
///
/// The remote sheet is the system of record. This struct is the
/// client's view of one row, read-only apart from stock deltas and
/// minimum-stock updates that are written back through the service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Barcode (unique key of the row)
    pub barcode: String,

    /// Display name
    pub name: String,

    /// Units currently in stock (may be negative)
    pub stock: i64,

    /// Reorder threshold; 0 or less means "not set"
    pub min_stock: i64,

    /// Unit label (bottle, pack, ...)
    pub unit: String,

    /// Unit price
    pub price: f64,

    pub category: String,

    /// Shelf location label
    pub shelf: String,

    /// Row location label
    pub row: String,

    pub image_url: String,

    pub last_updated: String,
}

impl Product {
    /// Build a product from a loosely-typed sheet record
    ///
    /// Sheet rows arrive with header-derived keys. Both the camelCase keys
    /// and the raw column names (`Barcode`, `Min_Stock`, `Image_URL`, ...)
    /// are accepted, and numbers may come through as strings.
    ///
    /// # Returns
    /// * `None` if the record is not a JSON object
    pub fn from_record(record: &Value) -> Option<Self> {
        let obj = record.as_object()?;

        Some(Product {
            barcode: text_field(obj, &["barcode", "Barcode"]),
            name: text_field(obj, &["name", "Name", "Product_Name"]),
            stock: int_field(obj, &["stock", "Stock", "Current_Stock"]).unwrap_or(0),
            min_stock: int_field(obj, &["minStock", "Min_Stock", "min_stock"]).unwrap_or(0),
            unit: text_field(obj, &["unit", "Unit"]),
            price: float_field(obj, &["price", "Price"]).unwrap_or(0.0),
            category: text_field(obj, &["category", "Category"]),
            shelf: text_field(obj, &["shelf", "Shelf"]),
            row: text_field(obj, &["row", "Row"]),
            image_url: text_field(obj, &["imageUrl", "Image_URL", "image_url"]),
            last_updated: text_field(obj, &["lastUpdated", "Last_Updated", "last_updated"]),
        })
    }

    /// Fill display defaults for fields the sheet left blank
    pub fn with_defaults(mut self) -> Self {
        if self.name.trim().is_empty() {
            self.name = DEFAULT_NAME.to_string();
        }
        if self.unit.trim().is_empty() {
            self.unit = DEFAULT_UNIT.to_string();
        }
        if self.image_url.trim().is_empty() {
            self.image_url = PLACEHOLDER_IMAGE.to_string();
        }
        if self.last_updated.trim().is_empty() {
            self.last_updated = Local::now().to_rfc3339();
        }
        self
    }

    /// Badge rule on the product card: at or below the threshold
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// Stock value at unit price
    pub fn stock_value(&self) -> f64 {
        self.stock as f64 * self.price
    }

    /// True when the row carries a usable barcode
    pub fn has_barcode(&self) -> bool {
        !self.barcode.trim().is_empty()
    }
}

/// Direction of a stock adjustment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StockType {
    /// Receive goods
    #[default]
    #[serde(rename = "IN")]
    In,

    /// Issue goods
    #[serde(rename = "OUT")]
    Out,
}

impl StockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockType::In => "IN",
            StockType::Out => "OUT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "IN" => Some(StockType::In),
            "OUT" => Some(StockType::Out),
            _ => None,
        }
    }

    /// Signed delta for an unsigned amount
    pub fn signed(&self, amount: i64) -> i64 {
        match self {
            StockType::In => amount,
            StockType::Out => -amount,
        }
    }
}

impl fmt::Display for StockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the append-only transaction history
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Raw timestamp as written by the service
    pub timestamp: String,

    pub barcode: String,

    pub product_name: String,

    #[serde(rename = "type")]
    pub kind: StockType,

    pub amount: i64,

    pub user_id: String,
}

impl Transaction {
    /// Build a transaction from a loosely-typed history record
    pub fn from_record(record: &Value) -> Option<Self> {
        let obj = record.as_object()?;
        let kind = StockType::parse(&text_field(obj, &["type", "Type"])).unwrap_or_default();

        Some(Transaction {
            timestamp: text_field(obj, &["timestamp", "Timestamp", "date", "Date"]),
            barcode: text_field(obj, &["barcode", "Barcode"]),
            product_name: text_field(obj, &["productName", "name", "Name", "Product_Name"]),
            kind,
            amount: int_field(obj, &["amount", "Amount"]).unwrap_or(0),
            user_id: text_field(obj, &["userId", "User_ID", "user_id", "user"]),
        })
    }

    /// Parse the timestamp into local time
    ///
    /// Accepts RFC 3339 and the plain `YYYY-MM-DD[ HH:MM:SS]` forms the
    /// sheet produces. Naive values are read as local time.
    pub fn local_time(&self) -> Option<DateTime<Local>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Parse a sheet timestamp into local time
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Local.from_local_datetime(&naive).earliest();
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

fn first<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Render a JSON scalar as text (numbers keep their digits)
pub fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Read a JSON scalar as an integer the way a form field would
///
/// Numeric text must be a whole number or decimal; text with trailing
/// characters such as `"12abc"` is rejected instead of read as its prefix.
pub fn value_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

fn value_float(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    first(obj, keys).map(value_text).unwrap_or_default()
}

fn int_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    first(obj, keys).and_then(value_int)
}

fn float_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    first(obj, keys).and_then(value_float)
}
