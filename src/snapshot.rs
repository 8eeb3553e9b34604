use bincode::{deserialize_from, serialize_into};
use chrono::Utc;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::product::Product;

/// File name of the offline copy inside the data directory
pub const SNAPSHOT_FILE: &str = "inventory.bin.gz";

/// Last inventory fetched from the sheet, kept for offline lookups
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// Unix seconds at save time
    pub saved_at: i64,
    pub products: Vec<Product>,
}

impl InventorySnapshot {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            saved_at: Utc::now().timestamp(),
            products,
        }
    }
}

pub fn save_snapshot(snapshot: &InventorySnapshot, path: impl AsRef<Path>) -> std::io::Result<()> {
    let file = File::create(path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = std::io::BufWriter::new(encoder);

    serialize_into(&mut writer, snapshot)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    writer.flush()?;
    writer.into_inner()?.finish()?;

    Ok(())
}

pub fn load_snapshot(path: impl AsRef<Path>) -> std::io::Result<InventorySnapshot> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(file);
    let mut reader = std::io::BufReader::new(decoder);

    let snapshot: InventorySnapshot = deserialize_from(&mut reader)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    Ok(snapshot)
}
