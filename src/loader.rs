use crate::error::{Error, Result};
use crate::product::Product;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Load products from a CSV export of the inventory sheet
///
/// The first line is the header row. Column names are matched the same
/// way sheet records are (`Barcode`, `Name`, `Min_Stock`, `Image_URL`,
/// ...), so a sheet downloaded as CSV loads without editing. Rows with an
/// empty barcode and name are skipped.
///
/// # Arguments
/// * `filepath` - Path to the CSV file to load
///
/// # Returns
/// * `Result<Vec<Product>>` - The products in file order or an error
///
/// # Examples
/// ```no_run
/// use optistock::loader::from_csv;
///
/// match from_csv("inventory.csv") {
///     Ok(products) => println!("Loaded {} products", products.len()),
///     Err(e) => eprintln!("Error loading CSV: {}", e),
/// }
/// ```
pub fn from_csv(filepath: impl AsRef<Path>) -> Result<Vec<Product>> {
    let file = File::open(filepath)?;
    let reader = BufReader::new(file);
    let lines: Vec<String> = reader.lines().collect::<std::io::Result<_>>()?;
    parse_products_csv(&lines.join("\n"))
}

/// Parse CSV text (header row first) into products
pub fn parse_products_csv(text: &str) -> Result<Vec<Product>> {
    let mut lines = text
        .trim_start_matches('\u{feff}')
        .lines()
        .filter(|l| !l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| Error::Invalid("CSV file is empty".to_string()))?;
    let columns: Vec<String> = parse_csv_row(header)
        .iter()
        .map(|h| header_key(h))
        .collect();

    let mut products = Vec::new();
    for line in lines {
        let fields = parse_csv_row(line);
        let mut record = Map::new();
        for (key, value) in columns.iter().zip(fields) {
            if key.is_empty() {
                continue;
            }
            record.insert(key.clone(), Value::String(value.trim().to_string()));
        }

        if let Some(product) = Product::from_record(&Value::Object(record)) {
            if product.has_barcode() || !product.name.is_empty() {
                products.push(product);
            }
        }
    }

    Ok(products)
}

/// Load products from a JSON file
///
/// Accepts a bare array of records or the service's `{"data": [...]}`
/// envelope.
pub fn from_json(filepath: impl AsRef<Path>) -> Result<Vec<Product>> {
    let file = File::open(filepath)?;
    let body: Value = serde_json::from_reader(BufReader::new(file))?;
    Ok(crate::sheet_api::records(body)?
        .iter()
        .filter_map(Product::from_record)
        .collect())
}

// "Min Stock" / "min-stock" -> "Min_Stock"
fn header_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

// Parse a CSV row into a vector of strings
fn parse_csv_row(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Escaped quote inside a quoted field
                    current_field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                result.push(std::mem::take(&mut current_field));
            }
            _ => current_field.push(c),
        }
    }

    result.push(current_field);
    result
}

/// Detect file type and load appropriate format
///
/// # Arguments
/// * `filepath` - Path to a `.csv` or `.json` product list
///
/// # Examples
/// ```no_run
/// use optistock::loader::load_products;
///
/// let products = load_products("database/demo.json").unwrap_or_default();
/// ```
pub fn load_products(filepath: impl AsRef<Path>) -> Result<Vec<Product>> {
    let path = filepath.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("csv") => from_csv(path),
        Some("json") => from_json(path),
        Some(ext) => Err(Error::Invalid(format!("Unsupported file extension: {}", ext))),
        None => Err(Error::Invalid("File has no extension".to_string())),
    }
}
