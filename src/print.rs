#![cfg(feature = "web")]

use crate::error::{Error, Result};
use crate::label::{
    format_lot, format_thai_date, CustomLabelForm, CustomLabelSettings, FontStyles, LabelSettings,
};
use crate::product::{Product, DEFAULT_NAME};
use chrono::{Local, NaiveDate};
use handlebars::Handlebars;
use log::error;
use serde_json::json;

/// Barcode drawing script loaded by the label page
pub const JSBARCODE_SCRIPT: &str = "https://cdn.jsdelivr.net/npm/jsbarcode@3.11.6/dist/JsBarcode.all.min.js";

const BARCODE_LABEL: &str = "barcode_label";
const CUSTOM_LABEL: &str = "custom_label";
const LOW_STOCK: &str = "low_stock";

/// Renders the printable pages
///
/// Each page is a standalone HTML document sized with `@page` to the
/// label or paper, laid out as a CSS grid, which opens the print dialog
/// once it has loaded.
pub struct Printer {
    registry: Handlebars<'static>,
}

impl Printer {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        for (name, source) in [
            (BARCODE_LABEL, include_str!("./templates/barcode_label.hbs")),
            (CUSTOM_LABEL, include_str!("./templates/custom_label.hbs")),
            (LOW_STOCK, include_str!("./templates/low_stock.hbs")),
        ] {
            registry
                .register_template_string(name, source)
                .map_err(|e| Error::Export(format!("template {}: {}", name, e)))?;
        }
        Ok(Printer { registry })
    }

    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String> {
        self.registry.render(name, data).map_err(|e| {
            error!("Error generating {} page: {}", name, e);
            Error::Export(e.to_string())
        })
    }

    /// Sheet of barcode stickers for one product
    pub fn barcode_labels(&self, product: &Product, settings: &LabelSettings) -> Result<String> {
        if !product.has_barcode() {
            return Err(Error::Invalid("product has no barcode".to_string()));
        }
        let settings = settings.clone().clamped();
        let layout = settings.layout();

        let name = if product.name.trim().is_empty() {
            DEFAULT_NAME
        } else {
            product.name.as_str()
        };
        let price = if settings.show_price && product.price > 0.0 {
            format_price(product.price)
        } else {
            String::new()
        };

        self.render(
            BARCODE_LABEL,
            &json!({
                "barcode": product.barcode,
                "script_url": JSBARCODE_SCRIPT,
                "width": settings.label_width,
                "height": settings.label_height,
                "rows": layout.grid.rows,
                "cols": layout.grid.cols,
                "font_px": format!("{:.1}", layout.font_px),
                "labels": (0..settings.copies).collect::<Vec<_>>(),
                "name": name,
                "price": price,
                "code_json": script_literal(&json!(product.barcode)),
                "options_json": script_literal(&json!(layout.barcode)),
            }),
        )
    }

    /// Sheet of custom text labels
    pub fn custom_labels(
        &self,
        form: &CustomLabelForm,
        settings: &CustomLabelSettings,
        styles: &FontStyles,
    ) -> Result<String> {
        let settings = settings.clone().clamped();
        let (page_width, page_height) = settings.page_size();
        let fonts = settings.font_sizes(styles);
        let px = |v: f64| format!("{:.2}", v);

        self.render(
            CUSTOM_LABEL,
            &json!({
                "page_width": page_width,
                "page_height": page_height,
                "orientation": settings.orientation.as_str(),
                "width": settings.label_width,
                "height": settings.label_height,
                "rows": settings.rows,
                "cols": settings.cols,
                "labels": (0..settings.copies()).collect::<Vec<_>>(),
                "fonts": {
                    "company": px(fonts.company),
                    "code": px(fonts.code),
                    "date": px(fonts.date),
                    "qty": px(fonts.qty),
                    "lot": px(fonts.lot),
                },
                "weights": {
                    "company": styles.company.weight(false),
                    "code": styles.code.weight(false),
                    "date": styles.date.weight(false),
                    "qty": styles.qty.weight(true),
                    "lot": styles.lot.weight(false),
                },
                "styles": {
                    "company": styles.company.style(),
                    "code": styles.code.style(),
                    "date": styles.date.style(),
                    "qty": styles.qty.style(),
                    "lot": styles.lot.style(),
                },
                "company": form.company_name,
                "code": form.product_code,
                "date": format_thai_date(form.date),
                "quantity": form.quantity,
                "lot": format_lot(form.lot_number),
            }),
        )
    }

    /// A4 low-stock report
    pub fn low_stock_report(&self, items: &[Product], date: NaiveDate) -> Result<String> {
        let rows: Vec<_> = items
            .iter()
            .map(|item| {
                let name = if item.name.is_empty() {
                    "Unknown Product"
                } else {
                    item.name.as_str()
                };
                json!({
                    "name": name,
                    "barcode": item.barcode,
                    "stock": item.stock,
                    "min_stock": item.min_stock,
                    "out": item.stock <= 0,
                })
            })
            .collect();

        self.render(
            LOW_STOCK,
            &json!({
                "date": format_thai_date(date),
                "count": items.len(),
                "items": rows,
                "generated": Local::now().format("%d/%m/%Y %H:%M:%S").to_string(),
            }),
        )
    }
}

/// `1234.5` -> `1,234.50`
pub fn format_price(price: f64) -> String {
    let fixed = format!("{:.2}", price.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if price < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

// JSON is valid JS; `<` is escaped so a value cannot close the script tag
fn script_literal(value: &serde_json::Value) -> String {
    value.to_string().replace('<', "\\u003c")
}
