use crate::gemini;
use crate::presets::PRESETS_FILE;
use crate::sheet_api::DEFAULT_API_URL;
use crate::snapshot::SNAPSHOT_FILE;
use clap::Parser;
use std::path::PathBuf;

/// OptiStock inventory server.
#[derive(Parser, Debug, Clone)]
#[command(name = "optistock", about = "Barcode inventory front end for a spreadsheet-backed stock service")]
pub struct Config {
    /// Address the web server listens on.
    #[arg(long, env = "OPTISTOCK_BIND", default_value = "127.0.0.1:3000")]
    pub bind: String,

    /// Deployed spreadsheet web app URL.
    #[arg(long, env = "OPTISTOCK_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Directory for presets and the offline inventory snapshot.
    #[arg(long, env = "OPTISTOCK_DATA_DIR", default_value = "database")]
    pub data_dir: PathBuf,

    /// Serve the in-memory demo data instead of calling the sheet.
    #[arg(long, env = "OPTISTOCK_MOCK")]
    pub mock: bool,

    /// Seed the mock backend from a CSV or JSON product list.
    #[arg(long, requires = "mock")]
    pub mock_data: Option<PathBuf>,

    /// Recorded as the user on every stock transaction.
    #[arg(long, default_value = "WebApp")]
    pub user_id: String,

    /// Gemini REST endpoint.
    #[arg(long, default_value = gemini::DEFAULT_BASE_URL)]
    pub gemini_url: String,
}

impl Config {
    pub fn presets_path(&self) -> PathBuf {
        self.data_dir.join(PRESETS_FILE)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }
}
