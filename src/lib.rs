/*!
# OptiStock

A barcode-driven inventory front end for a spreadsheet-backed stock service, built in Rust.

## Overview

Stock lives in a Google Sheet exposed through a small web app (Apps Script).
This crate is the client side of that system: it serves the scanning web
page, resolves scanned barcodes against the inventory, writes stock
movements back to the sheet, prints barcode and custom labels, exports
reports, and asks Gemini for minimum-stock recommendations.

## Architecture

### Frontend Layer
- **Technologies**: HTML, CSS, JavaScript
- **Key Components**:
  - Camera scanner - Quagga2 on phones, html5-qrcode on desktop webcams
  - Dashboard - Totals, low-stock alerts and today's movements
  - Stock form - Receive (IN) / issue (OUT) with quick-add amounts
  - Print pages - `@page`-sized HTML sheets opened in a new tab

### Backend Layer
- **Technologies**: Rust, axum, tokio
- **Core Components**:
  - Inventory Store - Cached product list with lookup-then-refresh on scan misses
  - Sheet Client - Query-string actions against the spreadsheet web app
  - Gemini Client - Model ranking, ordered fallback and report parsing
  - Label Layout - Grid, page size and font size computation for stickers
  - Printer - Handlebars templates for label sheets and the low-stock report

### Data Persistence Layer
- The spreadsheet is the system of record
- Offline snapshot of the last inventory (bincode + gzip, `.bin.gz`)
- Label presets, lot number and AI key in a local JSON file

## Modules

- **product**: Product and transaction records, lenient sheet decoding
- **inventory**: Scan matching, search, low-stock and dashboard rules
- **backend**: The `Backend` trait and the in-memory mock
- **sheet_api**: HTTP client for the spreadsheet web app
- **store**: Cached inventory, scan capture and stock adjustments
- **scanner**: Scanner engine selection and the single-scan guard
- **label**: Barcode and custom label geometry
- **presets**: Custom label presets, lot number and API key storage
- **gemini**: AI stock analysis
- **i18n**: Thai / English strings
- **snapshot**: Offline inventory copy
- **loader**: Product lists from CSV / JSON for the mock backend
- **downloader**: CSV and XLSX exports
- **print**: Printable HTML pages
- **photo**: Product photo downscaling for upload
- **app**: Routing and handlers

## REST API Endpoints

- `/api/inventory`, `/api/dashboard`, `/api/low-stock` - Inventory views
- `/api/scan` - Resolve a decoded barcode
- `/api/scan-error?name=` - Localize a browser camera error
- `/api/stock` - Receive or issue stock
- `/api/history` - Movement history
- `/api/presets`, `/api/lot` - Custom label presets and lot number
- `/api/ai/analyze`, `/api/ai/apply` - AI recommendations
- `/print/barcode/{barcode}`, `/print/custom`, `/print/low-stock` - Print pages
*/

pub mod backend;
pub mod config;
pub mod downloader;
pub mod error;
pub mod gemini;
pub mod i18n;
pub mod inventory;
pub mod label;
pub mod loader;
pub mod presets;
pub mod product;
pub mod scanner;
pub mod sheet_api;
pub mod snapshot;
pub mod store;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod photo;
#[cfg(feature = "web")]
pub mod print;

/// Re-export the types most callers need
pub use backend::{Backend, MockBackend};
pub use error::{Error, Result};
pub use product::{Product, StockType, Transaction};
pub use store::InventoryStore;
