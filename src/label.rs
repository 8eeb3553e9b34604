use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// CSS pixels per millimetre at 96 dpi
pub const PX_PER_MM: f64 = 3.78;

/// Inner size of the on-screen preview box (px)
pub const PREVIEW_WIDTH: f64 = 350.0;
pub const PREVIEW_HEIGHT: f64 = 288.0;

/// Lot number a fresh install starts from
pub const DEFAULT_LOT_NUMBER: u64 = 1_000_000;

/// Rows and columns of a label sheet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelGrid {
    pub rows: u32,
    pub cols: u32,
}

impl LabelGrid {
    /// Lay `copies` labels out on a `width` x `height` page
    ///
    /// Columns follow the page's aspect ratio so cells stay close to the
    /// page's own shape; rows are whatever it takes to hold every copy.
    pub fn for_copies(copies: u32, width: f64, height: f64) -> Self {
        let copies = copies.max(1);
        let ratio = if width > 0.0 && height > 0.0 { width / height } else { 1.0 };

        let cols = ((copies as f64 * ratio).sqrt().ceil() as u32).clamp(1, copies);
        let rows = (copies + cols - 1) / cols;

        LabelGrid { rows, cols }
    }

    pub fn capacity(&self) -> u32 {
        self.rows * self.cols
    }
}

/// Settings of the single-product barcode label dialog
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelSettings {
    /// Label width in mm (30-100)
    pub label_width: f64,

    /// Label height in mm (20-100)
    pub label_height: f64,

    /// Number of labels (1-100)
    pub copies: u32,

    pub show_price: bool,

    /// Caption size in px (8-20)
    pub font_size: u32,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            label_width: 50.0,
            label_height: 30.0,
            copies: 1,
            show_price: true,
            font_size: 12,
        }
    }
}

impl LabelSettings {
    /// Pull every field into the range the dialog allows
    pub fn clamped(self) -> Self {
        Self {
            label_width: clamp_mm(self.label_width, 30.0, 100.0, 50.0),
            label_height: clamp_mm(self.label_height, 20.0, 100.0, 30.0),
            copies: self.copies.clamp(1, 100),
            show_price: self.show_price,
            font_size: self.font_size.clamp(8, 20),
        }
    }

    /// Geometry of the printed sheet
    pub fn layout(&self) -> BarcodeLayout {
        let grid = LabelGrid::for_copies(self.copies, self.label_width, self.label_height);
        let cell_width = self.label_width / grid.cols as f64;
        let cell_height = self.label_height / grid.rows as f64;

        // shrink with the cell, never enlarge past the single-label size
        let scale = (cell_width / self.label_width)
            .min(cell_height / self.label_height)
            .clamp(0.2, 1.0);

        BarcodeLayout {
            grid,
            cell_width,
            cell_height,
            scale,
            font_px: (self.font_size as f64 * scale).max(6.0),
            barcode: BarcodeRender {
                bar_width: if scale < 0.5 { 1 } else { 2 },
                height: (cell_height * PX_PER_MM * 0.5).clamp(12.0, 60.0).round() as u32,
                font_size: ((self.font_size as f64 * scale).round() as u32).max(6),
                ..BarcodeRender::default()
            },
        }
    }
}

fn clamp_mm(v: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v.clamp(min, max)
    } else {
        fallback
    }
}

/// Options handed to the barcode drawing script
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeRender {
    pub format: String,
    pub bar_width: u32,
    pub height: u32,
    pub display_value: bool,
    pub font_size: u32,
    pub margin: u32,
}

impl Default for BarcodeRender {
    fn default() -> Self {
        Self {
            format: "CODE128".to_string(),
            bar_width: 2,
            height: 60,
            display_value: true,
            font_size: 12,
            margin: 5,
        }
    }
}

/// Computed geometry of a barcode label sheet
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeLayout {
    pub grid: LabelGrid,
    pub cell_width: f64,
    pub cell_height: f64,
    pub scale: f64,
    pub font_px: f64,
    pub barcode: BarcodeRender,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// Per-field text style of the custom label
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontStyle {
    /// Percentage of the computed size (50-200)
    pub size: u32,
    pub bold: bool,
    pub italic: bool,
}

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            size: 100,
            bold: false,
            italic: false,
        }
    }
}

impl FontStyle {
    fn bold(size: u32) -> Self {
        Self {
            size,
            bold: true,
            italic: false,
        }
    }

    pub fn weight(&self, heavy: bool) -> &'static str {
        match (self.bold, heavy) {
            (true, true) => "900",
            (true, false) => "bold",
            (false, _) => "normal",
        }
    }

    pub fn style(&self) -> &'static str {
        if self.italic {
            "italic"
        } else {
            "normal"
        }
    }

    fn factor(&self) -> f64 {
        self.size.clamp(50, 200) as f64 / 100.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontStyles {
    pub company: FontStyle,
    pub code: FontStyle,
    pub date: FontStyle,
    pub qty: FontStyle,
    pub lot: FontStyle,
}

impl Default for FontStyles {
    fn default() -> Self {
        Self {
            company: FontStyle::bold(100),
            code: FontStyle::bold(100),
            date: FontStyle::default(),
            qty: FontStyle::bold(100),
            lot: FontStyle::default(),
        }
    }
}

/// Page settings of the custom label dialog
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomLabelSettings {
    pub label_width: f64,
    pub label_height: f64,
    /// 1-10
    pub rows: u32,
    /// 1-10
    pub cols: u32,
    pub auto_fit: bool,
    /// Percent (50-200)
    pub text_scale: u32,
    pub orientation: Orientation,
}

impl Default for CustomLabelSettings {
    fn default() -> Self {
        Self {
            label_width: 100.0,
            label_height: 70.0,
            rows: 1,
            cols: 1,
            auto_fit: true,
            text_scale: 100,
            orientation: Orientation::Portrait,
        }
    }
}

/// Font sizes (px) of the printed custom label fields
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintFontSizes {
    pub company: f64,
    pub code: f64,
    pub date: f64,
    pub qty: f64,
    pub lot: f64,
}

impl CustomLabelSettings {
    pub fn clamped(self) -> Self {
        Self {
            label_width: clamp_mm(self.label_width, 10.0, 300.0, 100.0),
            label_height: clamp_mm(self.label_height, 10.0, 300.0, 70.0),
            rows: self.rows.clamp(1, 10),
            cols: self.cols.clamp(1, 10),
            auto_fit: self.auto_fit,
            text_scale: self.text_scale.clamp(50, 200),
            orientation: self.orientation,
        }
    }

    pub fn grid(&self) -> LabelGrid {
        LabelGrid {
            rows: self.rows,
            cols: self.cols,
        }
    }

    pub fn copies(&self) -> u32 {
        self.rows * self.cols
    }

    /// `@page` size: long side across for landscape, down for portrait
    pub fn page_size(&self) -> (f64, f64) {
        let long = self.label_width.max(self.label_height);
        let short = self.label_width.min(self.label_height);
        match self.orientation {
            Orientation::Landscape => (long, short),
            Orientation::Portrait => (short, long),
        }
    }

    /// Text scale: auto-fit grows text with the paper (30 mm = 1.0)
    pub fn scale(&self) -> f64 {
        let base = self.label_width.min(self.label_height);
        let fit = if self.auto_fit { base / 30.0 } else { 1.0 };
        fit * self.text_scale as f64 / 100.0
    }

    /// Size of one label cell in mm
    pub fn cell_size(&self) -> (f64, f64) {
        (
            self.label_width / self.cols.max(1) as f64,
            self.label_height / self.rows.max(1) as f64,
        )
    }

    /// Printed font sizes as a share of the cell height
    pub fn font_sizes(&self, styles: &FontStyles) -> PrintFontSizes {
        let (_, cell_height) = self.cell_size();
        let px = |share: f64, style: &FontStyle| cell_height * share * PX_PER_MM * style.factor();

        PrintFontSizes {
            company: px(0.10, &styles.company),
            code: px(0.18, &styles.code),
            date: px(0.09, &styles.date),
            qty: px(0.22, &styles.qty),
            lot: px(0.09, &styles.lot),
        }
    }

    /// Scale that fits the whole page into the preview box
    pub fn preview_scale(&self) -> f64 {
        let w = self.label_width * PX_PER_MM;
        let h = self.label_height * PX_PER_MM;
        (PREVIEW_WIDTH / w).min(PREVIEW_HEIGHT / h)
    }
}

/// Text printed on a custom label
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomLabelForm {
    pub company_name: String,
    pub product_code: String,
    pub date: NaiveDate,
    pub quantity: u32,
    pub lot_number: u64,
}

impl CustomLabelForm {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            company_name: "J NAC (THAILAND) CO.,LTD.".to_string(),
            product_code: "132-025-5000".to_string(),
            date,
            quantity: 1,
            lot_number: DEFAULT_LOT_NUMBER,
        }
    }
}

/// Lot numbers print as ten digits
pub fn format_lot(lot: u64) -> String {
    format!("{:010}", lot)
}

/// `dd/mm/yyyy` in the Thai solar calendar (Buddhist era)
pub fn format_thai_date(date: NaiveDate) -> String {
    format!("{:02}/{:02}/{}", date.day(), date.month(), date.year() + 543)
}

/// A stock paper size offered in the dialog
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PaperSize {
    pub width: f64,
    pub height: f64,
    pub label: &'static str,
    pub group: &'static str,
}

const fn paper(width: f64, height: f64, label: &'static str, group: &'static str) -> PaperSize {
    PaperSize {
        width,
        height,
        label,
        group,
    }
}

pub const PAPER_SIZES: [PaperSize; 14] = [
    paper(25.0, 15.0, "Mini Label", "small"),
    paper(38.0, 25.0, "Price Tag", "small"),
    paper(50.0, 25.0, "Shelf Label", "small"),
    paper(50.0, 30.0, "Standard", "small"),
    paper(60.0, 40.0, "Medium", "small"),
    paper(70.0, 40.0, "Wide", "small"),
    paper(100.0, 50.0, "Large", "large"),
    paper(100.0, 70.0, "Shipping Label", "large"),
    paper(100.0, 150.0, "4x6\" Shipping", "large"),
    paper(152.0, 102.0, "6x4\" Photo", "large"),
    paper(152.0, 228.0, "6 x 9 inch", "paper"),
    paper(148.0, 210.0, "A5", "paper"),
    paper(210.0, 297.0, "A4", "paper"),
    paper(216.0, 279.0, "Letter", "paper"),
];

/// Standard sizes offered by the barcode label dialog
pub const BARCODE_LABEL_SIZES: [(f64, f64); 4] = [(50.0, 30.0), (40.0, 25.0), (60.0, 40.0), (70.0, 50.0)];

/// Parse a `WxH` paper value from the size picker
pub fn parse_paper_size(value: &str) -> Option<(f64, f64)> {
    let (w, h) = value.split_once(['x', 'X'])?;
    let w: f64 = w.trim().parse().ok()?;
    let h: f64 = h.trim().parse().ok()?;
    (w > 0.0 && h > 0.0).then_some((w, h))
}
