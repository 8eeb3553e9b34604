use crate::error::{Error, Result};
use crate::label::{CustomLabelForm, CustomLabelSettings, FontStyles, DEFAULT_LOT_NUMBER};
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File name of the settings store inside the data directory
pub const PRESETS_FILE: &str = "presets.json";

/// A saved custom-label setup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomLabelPreset {
    pub id: String,
    pub name: String,
    pub company_name: String,
    pub product_code: String,
    pub quantity: u32,
    pub lot_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_settings: Option<CustomLabelSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_styles: Option<FontStyles>,
}

/// What the user asks to save as a preset
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPreset {
    pub name: String,
    pub company_name: String,
    pub product_code: String,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub lot_number: Option<u64>,
    #[serde(default)]
    pub print_settings: Option<CustomLabelSettings>,
    #[serde(default)]
    pub font_styles: Option<FontStyles>,
}

fn one() -> u32 {
    1
}

// presets.json -> presets.json.bak
fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}

fn next_lot(lot: u64) -> Result<u64> {
    lot.checked_add(1)
        .ok_or_else(|| Error::Invalid(format!("lot number {} cannot be advanced", lot)))
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct PresetData {
    #[serde(rename = "customLabelPresets", default)]
    presets: Vec<CustomLabelPreset>,
    #[serde(rename = "customLabelLotNumber", default, skip_serializing_if = "Option::is_none")]
    lot_number: Option<u64>,
    #[serde(rename = "gemini_api_key", default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
}

/// A preset loaded into the custom label form
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedPreset {
    pub form: CustomLabelForm,
    pub print_settings: Option<CustomLabelSettings>,
    pub font_styles: Option<FontStyles>,
}

/// Label presets, the running lot number and the AI key, kept in one JSON file
///
/// Every change is written straight back to disk.
#[derive(Debug)]
pub struct PresetStore {
    path: Option<PathBuf>,
    data: PresetData,
}

impl PresetStore {
    /// Open the store at `path`; a missing file starts empty
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let text = fs::read_to_string(&path)?;
            match serde_json::from_str(&text) {
                Ok(data) => data,
                Err(e) => {
                    let backup = backup_path(&path);
                    warn!(
                        "Unreadable preset file {} ({}), moved to {}",
                        path.display(),
                        e,
                        backup.display()
                    );
                    fs::rename(&path, &backup)?;
                    PresetData::default()
                }
            }
        } else {
            PresetData::default()
        };

        Ok(PresetStore {
            path: Some(path),
            data,
        })
    }

    /// A store that never touches the disk
    pub fn in_memory() -> Self {
        PresetStore {
            path: None,
            data: PresetData::default(),
        }
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let text = serde_json::to_string_pretty(&self.data)?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn presets(&self) -> &[CustomLabelPreset] {
        &self.data.presets
    }

    /// Save the current form under `name`, newest first
    pub fn add_preset(&mut self, preset: NewPreset) -> Result<CustomLabelPreset> {
        let name = preset.name.trim();
        if name.is_empty() {
            return Err(Error::Invalid("preset name is required".to_string()));
        }

        let saved = CustomLabelPreset {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            company_name: preset.company_name,
            product_code: preset.product_code,
            quantity: preset.quantity.max(1),
            lot_number: preset.lot_number.unwrap_or_else(|| self.lot_number()),
            print_settings: preset.print_settings.map(CustomLabelSettings::clamped),
            font_styles: preset.font_styles,
        };
        self.data.presets.insert(0, saved.clone());
        self.save()?;

        info!("Saved label preset \"{}\"", saved.name);
        Ok(saved)
    }

    /// Returns false when no preset has that id
    pub fn delete_preset(&mut self, id: &str) -> Result<bool> {
        let before = self.data.presets.len();
        self.data.presets.retain(|p| p.id != id);
        if self.data.presets.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Fill the form from a preset; the date is always today's
    pub fn load_preset(&self, id: &str, today: NaiveDate) -> Result<LoadedPreset> {
        let preset = self
            .data
            .presets
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(format!("preset {}", id)))?;

        Ok(LoadedPreset {
            form: CustomLabelForm {
                company_name: preset.company_name.clone(),
                product_code: preset.product_code.clone(),
                date: today,
                quantity: preset.quantity,
                lot_number: preset.lot_number,
            },
            print_settings: preset.print_settings.clone(),
            font_styles: preset.font_styles,
        })
    }

    pub fn lot_number(&self) -> u64 {
        self.data.lot_number.unwrap_or(DEFAULT_LOT_NUMBER)
    }

    /// Advance the lot number after a print and persist it
    pub fn increment_lot(&mut self) -> Result<u64> {
        let next = next_lot(self.lot_number())?;
        self.data.lot_number = Some(next);
        self.save()?;
        Ok(next)
    }

    /// Store the lot that follows `printed`
    pub fn advance_past(&mut self, printed: u64) -> Result<u64> {
        let next = next_lot(printed)?;
        self.set_lot_number(next)?;
        Ok(next)
    }

    pub fn set_lot_number(&mut self, lot: u64) -> Result<()> {
        self.data.lot_number = Some(lot);
        self.save()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.data.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Store (or with an empty key, forget) the Gemini API key
    pub fn set_api_key(&mut self, key: &str) -> Result<()> {
        let key = key.trim();
        self.data.api_key = if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        };
        self.save()
    }
}
