use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// UI language, Thai by default
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Th,
    En,
}

impl Language {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "th" => Some(Language::Th),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Th => "th",
            Language::En => "en",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Language::Th => Language::En,
            Language::En => Language::Th,
        }
    }
}

// (key, thai, english)
const ENTRIES: &[(&str, &str, &str)] = &[
    ("nav.dashboard", "แดชบอร์ด", "Dashboard"),
    ("nav.scan", "สแกนและปรับสต็อก", "Scan & Adjust"),
    ("nav.search", "ค้นหาสินค้า", "Product Search"),
    ("nav.history", "ประวัติ", "History"),
    ("nav.ai", "วิเคราะห์ด้วย AI", "AI Analysis"),
    ("nav.language", "ภาษา", "Language"),
    ("dashboard.title", "แดชบอร์ด", "Dashboard"),
    ("dashboard.subtitle", "ภาพรวมสถานะสินค้าคงคลัง", "Inventory status overview"),
    ("dashboard.totalProducts", "สินค้าทั้งหมด", "Total Products"),
    ("dashboard.totalProductsSub", "รายการที่ใช้งานอยู่", "Active items"),
    ("dashboard.lowStockAlerts", "แจ้งเตือนสินค้าใกล้หมด", "Low Stock Alerts"),
    ("dashboard.lowStockAlertsSub", "รายการที่ต้องเติมสต็อก", "Items to restock"),
    ("dashboard.transactionsToday", "ธุรกรรมวันนี้", "Transactions Today"),
    ("dashboard.totalValue", "มูลค่าสต็อกรวม", "Total Stock Value"),
    ("dashboard.reportSaved", "บันทึกรายงานแล้ว", "Report saved to Sheet!"),
    ("dashboard.reportFailed", "บันทึกรายงานไม่สำเร็จ", "Error saving report"),
    ("scan.title", "สแกนสินค้า", "Scan Product"),
    ("scan.subtitle", "ชี้กล้องที่บาร์โค้ดหรือใส่ด้วยตนเอง", "Point the camera at a barcode or enter it manually"),
    ("scan.enterBarcode", "ใส่รหัสบาร์โค้ด หรือ ชื่อสินค้า...", "Enter barcode or product name..."),
    ("scan.loading", "กำลังค้นหาสินค้า...", "Looking up product..."),
    ("scan.receive", "+ รับเข้า (IN)", "+ Receive (IN)"),
    ("scan.issue", "- จ่ายออก (OUT)", "- Issue (OUT)"),
    ("scan.quickAdd", "เพิ่มจำนวนด่วน (+)", "Quick Add Amounts (+)"),
    ("scan.confirm", "ยืนยัน", "Confirm"),
    ("scan.productNotFound", "ไม่พบสินค้าสำหรับบาร์โค้ด", "Product not found for barcode"),
    ("scan.errorFetching", "เกิดข้อผิดพลาดในการดึงข้อมูลสินค้า", "Error fetching product data"),
    ("scan.stockUpdated", "อัปเดตสต็อกสำเร็จ!", "Stock updated successfully!"),
    ("scan.failedUpdate", "ไม่สามารถอัปเดตสต็อกได้", "Failed to update stock"),
    ("scan.busy", "กำลังประมวลผลการสแกนก่อนหน้า", "Still processing the previous scan"),
    ("scanner.notLoaded", "Scanner ยังโหลดไม่เสร็จ กรุณารอสักครู่", "Scanner is still loading, please wait"),
    ("scanner.loadFailed", "ไม่สามารถโหลด Scanner ได้ กรุณาลองใหม่", "Could not load the scanner, please retry"),
    ("scanner.permission", "กรุณาอนุญาตให้เข้าถึงกล้อง", "Please allow camera access"),
    ("scanner.noCamera", "ไม่พบกล้อง", "No camera found"),
    ("scanner.cameraFailed", "ไม่สามารถเปิดกล้องได้", "Could not open the camera"),
    ("scanner.noBarcode", "ไม่พบบาร์โค้ดในภาพ กรุณาลองใหม่", "No barcode found in the image, please retry"),
    ("scanner.tapToStart", "แตะเพื่อเปิดกล้อง", "Tap to open camera"),
    ("scanner.scanning", "กำลังสแกน...", "Scanning..."),
    ("history.title", "ประวัติการเคลื่อนไหว", "Movement History"),
    ("history.by", "โดย", "by"),
    ("history.noHistory", "ยังไม่มีประวัติการเคลื่อนไหว", "No movement history yet"),
    ("history.cleared", "ล้างประวัติเรียบร้อยแล้ว", "History cleared successfully"),
    ("inventory.stock", "คงเหลือ", "In stock"),
    ("inventory.minStock", "ขั้นต่ำ", "Min stock"),
    ("inventory.lowStock", "สินค้าใกล้หมด", "Low stock"),
    ("inventory.inStock", "มีสินค้า", "In stock"),
    ("inventory.row", "แถว", "Row"),
    ("inventory.shelf", "ชั้น", "Shelf"),
    ("label.title", "พิมพ์สติ๊กเกอร์บาร์โค้ด", "Print Barcode Label"),
    ("label.customTitle", "พิมพ์ฉลากกำหนดเอง", "Custom Label Print"),
    ("label.presetSaved", "บันทึกรูปแบบแล้ว", "Preset saved"),
    ("label.noPresets", "ยังไม่มีรูปแบบที่บันทึก", "No presets saved"),
    ("ai.keyRequired", "กรุณาใส่ Gemini API Key ก่อนเริ่มการวิเคราะห์", "Please enter a Gemini API key before analysing"),
    ("ai.failed", "เกิดข้อผิดพลาดในการวิเคราะห์", "Analysis failed"),
    ("ai.applyFailed", "อัปเดตไม่สำเร็จ", "Update failed"),
    ("ai.noInventory", "ไม่พบข้อมูลสินค้า", "No inventory data"),
];

lazy_static! {
    static ref TRANSLATIONS: HashMap<&'static str, (&'static str, &'static str)> =
        ENTRIES.iter().map(|(k, th, en)| (*k, (*th, *en))).collect();
}

/// Look up a UI string; unknown keys come back unchanged
pub fn t<'a>(lang: Language, key: &'a str) -> &'a str {
    match TRANSLATIONS.get(key) {
        Some((th, en)) => match lang {
            Language::Th => *th,
            Language::En => *en,
        },
        None => key,
    }
}

/// The whole table for one language, for the page script
pub fn table(lang: Language) -> HashMap<&'static str, &'static str> {
    TRANSLATIONS
        .iter()
        .map(|(k, (th, en))| (*k, if lang == Language::Th { *th } else { *en }))
        .collect()
}
