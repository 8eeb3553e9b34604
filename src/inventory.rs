use crate::product::{Product, StockType, Transaction};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Suggestions shown under the scan page search box
pub const SCAN_SUGGESTION_LIMIT: usize = 5;

/// Suggestions shown on the product search page
pub const SEARCH_SUGGESTION_LIMIT: usize = 500;

/// Quick-add buttons on the adjustment form (accumulative)
pub const QUICK_AMOUNTS: [i64; 5] = [10, 50, 100, 500, 1000];

/// Largest amount accepted in one adjustment
pub const MAX_ADJUSTMENT: i64 = 9999;

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn numeric(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Drop blank sheet rows (rows without a barcode)
pub fn valid_inventory(list: &[Product]) -> Vec<Product> {
    list.iter().filter(|p| p.has_barcode()).cloned().collect()
}

/// Find the product for a scanned code
///
/// Camera decoders and sheets disagree on leading zeros and check
/// digits, so matching is tried in three stages:
///
/// 1. exact match on the trimmed, lower-cased barcode
/// 2. numeric match when both sides parse as numbers (`00123` = `123`)
/// 3. relaxed containment: the stored barcode contains the scan and is
///    at most two characters longer, or the scan contains the stored one
pub fn find_product<'a>(list: &'a [Product], code: &str) -> Option<&'a Product> {
    let scan = normalize(code);
    if scan.is_empty() {
        return None;
    }

    if let Some(found) = list.iter().find(|p| normalize(&p.barcode) == scan) {
        return Some(found);
    }

    if let Some(scanned_num) = numeric(&scan) {
        let found = list.iter().find(|p| {
            p.has_barcode() && numeric(&p.barcode).map_or(false, |n| n == scanned_num)
        });
        if found.is_some() {
            return found;
        }
    }

    list.iter().find(|p| {
        let db = normalize(&p.barcode);
        if db.is_empty() {
            return false;
        }
        db == scan
            || (db.contains(&scan) && db.chars().count() - scan.chars().count() < 3)
            || scan.contains(&db)
    })
}

/// Resolve a typed search term to one product
///
/// Exact barcode or name first (case-insensitive), then the first name
/// containing the term.
pub fn resolve_query<'a>(list: &'a [Product], term: &str) -> Option<&'a Product> {
    let term = normalize(term);
    if term.is_empty() {
        return None;
    }

    list.iter()
        .find(|p| normalize(&p.barcode) == term || normalize(&p.name) == term)
        .or_else(|| list.iter().find(|p| p.name.to_lowercase().contains(&term)))
}

/// Live suggestions for a partially typed barcode or name
pub fn suggestions<'a>(list: &'a [Product], term: &str, limit: usize) -> Vec<&'a Product> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return Vec::new();
    }

    list.iter()
        .filter(|p| p.barcode.to_lowercase().contains(&term) || p.name.to_lowercase().contains(&term))
        .take(limit)
        .collect()
}

/// Products for the dashboard's low-stock alert
///
/// Items without a threshold (min <= 0) and items whose stock is exactly
/// zero are left out; negative stock stays in.
pub fn low_stock(list: &[Product]) -> Vec<Product> {
    list.iter()
        .filter(|p| p.has_barcode())
        .filter(|p| p.min_stock > 0 && p.stock != 0 && p.stock <= p.min_stock)
        .cloned()
        .collect()
}

/// Figures shown on the dashboard cards
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_items: usize,
    pub low_stock: usize,
    pub today_tx: usize,
    pub total_value: f64,
}

impl DashboardStats {
    /// Compute the dashboard for `today` (local date)
    ///
    /// History rows with a blank timestamp count as today; a timestamp
    /// that is present but unreadable never does.
    pub fn compute(inventory: &[Product], history: &[Transaction], today: NaiveDate) -> Self {
        let valid = valid_inventory(inventory);

        let today_tx = history
            .iter()
            .filter(|h| {
                if h.timestamp.trim().is_empty() {
                    return true;
                }
                h.local_time().map_or(false, |t| t.date_naive() == today)
            })
            .count();

        DashboardStats {
            total_items: valid.len(),
            low_stock: low_stock(&valid).len(),
            today_tx,
            total_value: valid.iter().map(Product::stock_value).sum(),
        }
    }
}

/// Check an adjustment amount from the form
pub fn validate_amount(amount: i64) -> Result<i64, String> {
    if amount < 1 {
        return Err("amount must be at least 1".to_string());
    }
    if amount > MAX_ADJUSTMENT {
        return Err(format!("amount must not exceed {}", MAX_ADJUSTMENT));
    }
    Ok(amount)
}

/// Reflect a confirmed adjustment in the locally cached list
///
/// # Returns
/// * the new stock of the product, if it is in the list
pub fn apply_adjustment(list: &mut [Product], barcode: &str, kind: StockType, amount: i64) -> Option<i64> {
    let item = list.iter_mut().find(|p| p.barcode == barcode)?;
    item.stock += kind.signed(amount);
    Some(item.stock)
}
