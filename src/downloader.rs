#[cfg(feature = "web")]
use crate::error::Result;
#[cfg(feature = "web")]
use crate::product::Transaction;
use crate::product::Product;
use chrono::NaiveDate;

/// Header row of the low-stock export
pub const LOW_STOCK_HEADER: [&str; 7] = [
    "Barcode",
    "Product Name",
    "Category",
    "Current Stock",
    "Min Stock",
    "Price",
    "Value",
];

/// Convert the low-stock list to CSV
///
/// The output starts with a UTF-8 byte order mark so spreadsheet programs
/// read Thai product names correctly. Text fields are always quoted and
/// numbers never are. Value is stock times price.
///
/// # Arguments
/// * `items` - The products to export, usually [`crate::inventory::low_stock`]
///
/// # Returns
/// * `String` - CSV content
///
/// # Examples
/// ```
/// use optistock::downloader::low_stock_csv;
///
/// let csv = low_stock_csv(&[]);
/// assert!(csv.starts_with('\u{feff}'));
/// ```
pub fn low_stock_csv(items: &[Product]) -> String {
    let mut csv_content = String::from('\u{feff}');
    csv_content.push_str(&LOW_STOCK_HEADER.join(","));
    csv_content.push('\n');

    for item in items {
        let fields = [
            quote(&item.barcode),
            quote(&item.name),
            quote(&item.category),
            item.stock.to_string(),
            item.min_stock.to_string(),
            item.price.to_string(),
            item.stock_value().to_string(),
        ];
        csv_content.push_str(&fields.join(","));
        csv_content.push('\n');
    }

    csv_content
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// `Low_Stock_YYYY-MM-DD.csv`
pub fn low_stock_file_name(date: NaiveDate) -> String {
    format!("Low_Stock_{}.csv", date.format("%Y-%m-%d"))
}

/// Convert the inventory to XLSX format
///
/// One sheet, one row per product, with a bold header row.
///
/// # Arguments
/// * `items` - Products to export
///
/// # Returns
/// * `Result<Vec<u8>>` - XLSX file content as bytes or an error
#[cfg(feature = "web")]
pub fn inventory_xlsx(items: &[Product]) -> Result<Vec<u8>> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Inventory").map_err(export_error)?;

    let columns = [
        "Barcode",
        "Name",
        "Stock",
        "Min_Stock",
        "Unit",
        "Price",
        "Category",
        "Shelf",
        "Row",
        "Last_Updated",
    ];
    for (c, title) in columns.iter().enumerate() {
        worksheet
            .write_string_with_format(0, c as u16, *title, &header)
            .map_err(export_error)?;
    }

    for (i, p) in items.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, &p.barcode).map_err(export_error)?;
        worksheet.write_string(r, 1, &p.name).map_err(export_error)?;
        worksheet.write_number(r, 2, p.stock as f64).map_err(export_error)?;
        worksheet.write_number(r, 3, p.min_stock as f64).map_err(export_error)?;
        worksheet.write_string(r, 4, &p.unit).map_err(export_error)?;
        worksheet.write_number(r, 5, p.price).map_err(export_error)?;
        worksheet.write_string(r, 6, &p.category).map_err(export_error)?;
        worksheet.write_string(r, 7, &p.shelf).map_err(export_error)?;
        worksheet.write_string(r, 8, &p.row).map_err(export_error)?;
        worksheet.write_string(r, 9, &p.last_updated).map_err(export_error)?;
    }

    workbook.save_to_buffer().map_err(export_error)
}

/// Convert transaction history to XLSX format
#[cfg(feature = "web")]
pub fn history_xlsx(history: &[Transaction]) -> Result<Vec<u8>> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("History").map_err(export_error)?;

    for (c, title) in ["Timestamp", "Barcode", "Product", "Type", "Amount", "User"]
        .iter()
        .enumerate()
    {
        worksheet
            .write_string_with_format(0, c as u16, *title, &header)
            .map_err(export_error)?;
    }

    for (i, h) in history.iter().enumerate() {
        let r = (i + 1) as u32;
        let when = h
            .local_time()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| h.timestamp.clone());
        worksheet.write_string(r, 0, &when).map_err(export_error)?;
        worksheet.write_string(r, 1, &h.barcode).map_err(export_error)?;
        worksheet.write_string(r, 2, &h.product_name).map_err(export_error)?;
        worksheet.write_string(r, 3, h.kind.as_str()).map_err(export_error)?;
        worksheet.write_number(r, 4, h.amount as f64).map_err(export_error)?;
        worksheet.write_string(r, 5, &h.user_id).map_err(export_error)?;
    }

    workbook.save_to_buffer().map_err(export_error)
}

#[cfg(feature = "web")]
fn export_error(e: rust_xlsxwriter::XlsxError) -> crate::error::Error {
    crate::error::Error::Export(e.to_string())
}
