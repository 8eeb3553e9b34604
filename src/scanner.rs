//! Barcode capture.
//!
//! Decoding happens in the browser, with whichever camera library suits
//! the device. This module picks that library and its tuning from the
//! user agent, cleans up the decoded text, and makes sure only one scan
//! is processed at a time.

use crate::error::{Error, Result};
use crate::i18n::{t, Language};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

lazy_static! {
    static ref IOS_REGEX: Regex = Regex::new(r"(?i)iphone|ipad|ipod").unwrap();
    static ref ANDROID_REGEX: Regex = Regex::new(r"(?i)android").unwrap();
    static ref MAC_REGEX: Regex = Regex::new(r"(?i)macintosh").unwrap();
}

pub const QUAGGA_SCRIPT: &str = "https://cdn.jsdelivr.net/npm/@ericblade/quagga2/dist/quagga.min.js";
pub const HTML5_QRCODE_SCRIPT: &str = "https://unpkg.com/html5-qrcode@2.3.8/html5-qrcode.min.js";

/// Symbologies the live and still-image decoders look for
pub const READERS: [&str; 9] = [
    "code_128_reader",
    "ean_reader",
    "ean_8_reader",
    "code_39_reader",
    "code_39_vin_reader",
    "codabar_reader",
    "upc_reader",
    "upc_e_reader",
    "i2of5_reader",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Ios,
    Android,
    Desktop,
}

impl Device {
    /// Classify the browser from its User-Agent header
    pub fn detect(user_agent: &str) -> Self {
        if IOS_REGEX.is_match(user_agent) {
            Device::Ios
        } else if ANDROID_REGEX.is_match(user_agent) {
            Device::Android
        } else {
            Device::Desktop
        }
    }

    /// Like [`Device::detect`], but an iPad reporting a desktop Mac user
    /// agent is recognised when the page says the screen is touch capable.
    pub fn detect_with_touch(user_agent: &str, touch: bool) -> Self {
        match Self::detect(user_agent) {
            Device::Desktop if touch && MAC_REGEX.is_match(user_agent) => Device::Ios,
            device => device,
        }
    }

    pub fn is_mobile(&self) -> bool {
        !matches!(self, Device::Desktop)
    }
}

/// Camera decoding library loaded by the page
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Engine {
    Quagga2,
    Html5Qrcode,
}

impl Engine {
    pub fn script_url(&self) -> &'static str {
        match self {
            Engine::Quagga2 => QUAGGA_SCRIPT,
            Engine::Html5Qrcode => HTML5_QRCODE_SCRIPT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Range {
    pub min: u32,
    pub ideal: u32,
    pub max: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraConstraints {
    pub width: Range,
    pub height: Range,
    pub facing_mode: &'static str,
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
}

/// Margins of the region the decoder looks at, in percent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScanArea {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

/// Everything the page needs to start a camera session
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerConfig {
    pub device: Device,
    pub engine: Engine,
    pub script_url: &'static str,
    pub readers: Vec<&'static str>,
    pub constraints: CameraConstraints,
    pub area: ScanArea,
    pub patch_size: &'static str,
    pub half_sample: bool,
    /// Decode attempts per second (live stream)
    pub frequency: u32,
    /// Frames per second (html5-qrcode)
    pub fps: u32,
    /// Square scan box in px (html5-qrcode)
    pub qrbox: u32,
    /// Longest side a still photo is scaled to before decoding
    pub image_size: u32,
}

impl ScannerConfig {
    /// Quagga2 on phones (it copes with iOS Safari's camera stream),
    /// html5-qrcode on desktop webcams.
    pub fn for_device(device: Device) -> Self {
        let engine = if device.is_mobile() {
            Engine::Quagga2
        } else {
            Engine::Html5Qrcode
        };

        ScannerConfig {
            device,
            engine,
            script_url: engine.script_url(),
            readers: READERS.to_vec(),
            constraints: CameraConstraints {
                width: Range {
                    min: 640,
                    ideal: 1280,
                    max: 1920,
                },
                height: Range {
                    min: 480,
                    ideal: 720,
                    max: 1080,
                },
                facing_mode: "environment",
                min_aspect_ratio: 1.0,
                max_aspect_ratio: 2.0,
            },
            area: ScanArea {
                top: 10,
                right: 10,
                bottom: 10,
                left: 10,
            },
            patch_size: "medium",
            half_sample: true,
            frequency: 10,
            fps: 10,
            qrbox: 250,
            image_size: 800,
        }
    }
}

/// Clean up decoded text before lookup
pub fn normalize_code(raw: &str) -> Result<String> {
    let code: String = raw.chars().filter(|c| !c.is_control()).collect();
    let code = code.trim();
    if code.is_empty() {
        return Err(Error::Invalid("empty barcode".to_string()));
    }
    Ok(code.to_string())
}

/// Why a capture attempt produced no product
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ScanFailure {
    NotLoaded,
    LoadFailed,
    PermissionDenied,
    NoCamera,
    CameraFailed,
    NoBarcodeInImage,
    ProductNotFound { code: String },
}

impl ScanFailure {
    /// Map the browser's camera error name (`NotAllowedError`, ...)
    pub fn from_camera_error(name: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => ScanFailure::PermissionDenied,
            "NotFoundError" | "DevicesNotFoundError" => ScanFailure::NoCamera,
            _ => ScanFailure::CameraFailed,
        }
    }

    pub fn message(&self, lang: Language) -> String {
        match self {
            ScanFailure::NotLoaded => t(lang, "scanner.notLoaded").to_string(),
            ScanFailure::LoadFailed => t(lang, "scanner.loadFailed").to_string(),
            ScanFailure::PermissionDenied => t(lang, "scanner.permission").to_string(),
            ScanFailure::NoCamera => t(lang, "scanner.noCamera").to_string(),
            ScanFailure::CameraFailed => t(lang, "scanner.cameraFailed").to_string(),
            ScanFailure::NoBarcodeInImage => t(lang, "scanner.noBarcode").to_string(),
            ScanFailure::ProductNotFound { code } => {
                format!("{}: {}", t(lang, "scan.productNotFound"), code)
            }
        }
    }
}

/// Single in-flight scan flag
#[derive(Debug, Default)]
pub struct ScanGuard {
    busy: AtomicBool,
}

impl ScanGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the scanner; fails with [`Error::Busy`] while another scan runs
    pub fn try_begin(&self) -> Result<ScanSession<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::Busy)?;
        Ok(ScanSession { guard: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// An active scan; the scanner is released when this is dropped
#[derive(Debug)]
pub struct ScanSession<'a> {
    guard: &'a ScanGuard,
}

impl Drop for ScanSession<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}
