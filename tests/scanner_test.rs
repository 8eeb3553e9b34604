use optistock::i18n::{t, table, Language};
use optistock::scanner::{
    normalize_code, Device, Engine, ScanFailure, ScanGuard, ScannerConfig, HTML5_QRCODE_SCRIPT, QUAGGA_SCRIPT,
};
use optistock::Error;

const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";
const ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Chrome/124.0 Mobile Safari/537.36";
const MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 Version/17.4 Safari/605.1.15";
const WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/124.0 Safari/537.36";

#[test]
fn device_detection() {
    assert_eq!(Device::detect(IPHONE), Device::Ios);
    assert_eq!(Device::detect("Mozilla/5.0 (iPad; CPU OS 16_0 like Mac OS X)"), Device::Ios);
    assert_eq!(Device::detect(ANDROID), Device::Android);
    assert_eq!(Device::detect(WINDOWS), Device::Desktop);
    assert_eq!(Device::detect(""), Device::Desktop);
}

#[test]
fn touch_mac_is_an_ipad() {
    assert_eq!(Device::detect_with_touch(MAC, true), Device::Ios);
    assert_eq!(Device::detect_with_touch(MAC, false), Device::Desktop);
    assert_eq!(Device::detect_with_touch(WINDOWS, true), Device::Desktop);
    assert_eq!(Device::detect_with_touch(ANDROID, false), Device::Android);
}

#[test]
fn engine_follows_device() {
    let phone = ScannerConfig::for_device(Device::detect(IPHONE));
    assert_eq!(phone.engine, Engine::Quagga2);
    assert_eq!(phone.script_url, QUAGGA_SCRIPT);
    assert_eq!(ScannerConfig::for_device(Device::Android).engine, Engine::Quagga2);

    let desktop = ScannerConfig::for_device(Device::detect(WINDOWS));
    assert_eq!(desktop.engine, Engine::Html5Qrcode);
    assert_eq!(desktop.script_url, HTML5_QRCODE_SCRIPT);
}

#[test]
fn camera_tuning() {
    let config = ScannerConfig::for_device(Device::Ios);
    assert_eq!(config.constraints.facing_mode, "environment");
    assert_eq!(config.constraints.width.ideal, 1280);
    assert_eq!(config.constraints.height.ideal, 720);
    assert!(config.readers.contains(&"ean_reader"));
    assert!(config.readers.contains(&"code_128_reader"));
    assert_eq!(config.area.top, 10);

    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["engine"], "quagga2");
    assert_eq!(json["device"], "ios");
    assert_eq!(json["constraints"]["facingMode"], "environment");
    assert_eq!(json["halfSample"], true);
}

#[test]
fn decoded_text_is_cleaned() {
    assert_eq!(normalize_code("  8850123456789\r\n").unwrap(), "8850123456789");
    assert_eq!(normalize_code("\u{1d}ABC-99").unwrap(), "ABC-99");
    assert!(matches!(normalize_code(" \n\t"), Err(Error::Invalid(_))));
    assert!(normalize_code("").is_err());
}

#[test]
fn camera_errors_map_to_failures() {
    assert_eq!(ScanFailure::from_camera_error("NotAllowedError"), ScanFailure::PermissionDenied);
    assert_eq!(ScanFailure::from_camera_error("NotFoundError"), ScanFailure::NoCamera);
    assert_eq!(ScanFailure::from_camera_error("OverconstrainedError"), ScanFailure::CameraFailed);
}

#[test]
fn failure_messages_are_localized() {
    assert_eq!(ScanFailure::PermissionDenied.message(Language::En), "Please allow camera access");
    assert_eq!(ScanFailure::NoCamera.message(Language::Th), "ไม่พบกล้อง");

    let missing = ScanFailure::ProductNotFound {
        code: "123".to_string(),
    };
    assert_eq!(missing.message(Language::En), "Product not found for barcode: 123");

    let json = serde_json::to_value(&missing).unwrap();
    assert_eq!(json["kind"], "productNotFound");
    assert_eq!(json["code"], "123");
}

#[test]
fn one_scan_at_a_time() {
    let guard = ScanGuard::new();
    assert!(!guard.is_busy());
    {
        let _session = guard.try_begin().unwrap();
        assert!(guard.is_busy());
        assert!(matches!(guard.try_begin(), Err(Error::Busy)));
    }
    assert!(!guard.is_busy());
    assert!(guard.try_begin().is_ok());
}

#[test]
fn translations() {
    assert_eq!(Language::default(), Language::Th);
    assert_eq!(Language::from_code(" EN "), Some(Language::En));
    assert_eq!(Language::from_code("fr"), None);
    assert_eq!(Language::Th.toggle(), Language::En);
    assert_eq!(Language::En.code(), "en");

    assert_eq!(t(Language::En, "nav.dashboard"), "Dashboard");
    assert_eq!(t(Language::Th, "nav.history"), "ประวัติ");
    assert_eq!(t(Language::En, "no.such.key"), "no.such.key");

    let th = table(Language::Th);
    let en = table(Language::En);
    assert_eq!(th.len(), en.len());
    assert_eq!(en["scan.confirm"], "Confirm");
    assert_eq!(th["scan.confirm"], "ยืนยัน");
}
