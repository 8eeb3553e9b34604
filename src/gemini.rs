//! AI-assisted stock optimisation through the Gemini text endpoint.
//!
//! The inventory and recent history are flattened into CSV inside a
//! prompt that asks for JSON only. Models are tried in priority order;
//! the first one that answers wins.

use crate::backend::MinStockUpdate;
use crate::error::{Error, Result};
use crate::product::{value_int, value_text, Product, Transaction};
use chrono::{Months, NaiveDate};
use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Preferred models, best first
pub const MODEL_PRIORITY: [&str; 4] = ["gemini-1.5-flash", "gemini-1.5-pro", "gemini-pro", "gemini-1.0-pro"];

/// Used when the model list cannot be read
pub const FALLBACK_MODELS: [&str; 2] = ["gemini-1.5-flash", "gemini-pro"];

/// History rows included in the prompt
pub const HISTORY_PROMPT_LIMIT: usize = 100;

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// List the models this key may use (without the `models/` prefix)
    ///
    /// Doubles as the "test key" action: an invalid key comes back as
    /// [`Error::Ai`] carrying the service's message.
    pub async fn check_api_key(&self, api_key: &str) -> Result<Vec<String>> {
        let url = format!("{}/models", self.base_url);
        let resp = self.http.get(&url).query(&[("key", api_key)]).send().await?;

        if !resp.status().is_success() {
            let body: Value = resp.json().await.unwrap_or(Value::Null);
            return Err(Error::Ai(
                error_message(&body).unwrap_or_else(|| "Invalid API Key".to_string()),
            ));
        }

        let body: Value = resp.json().await?;
        Ok(body["models"]
            .as_array()
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m["name"].as_str())
                    .map(|name| name.replace("models/", ""))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// One completion from one model
    pub async fn generate(&self, model: &str, api_key: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let resp = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body: Value = resp.json().await.unwrap_or(Value::Null);
            return Err(Error::Ai(error_message(&body).unwrap_or_else(|| {
                format!("Model {} returned error {}", model, status.as_u16())
            })));
        }

        let body: Value = resp.json().await?;
        body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::Ai(format!("Model {} returned no content.", model)))
    }

    /// Models to try for this key, in order
    pub async fn candidates(&self, api_key: &str) -> Vec<String> {
        match self.check_api_key(api_key).await {
            Ok(available) => {
                let ranked = rank_models(&available);
                if ranked.is_empty() {
                    warn!("No 'gemini' models found in list. Using defaults.");
                    fallback_models()
                } else {
                    ranked
                }
            }
            Err(e) => {
                warn!("Could not list models. Using defaults. {}", e);
                fallback_models()
            }
        }
    }

    /// Send `prompt` to each model in turn until one answers
    pub async fn complete_with_fallback(&self, api_key: &str, models: &[String], prompt: &str) -> Result<String> {
        let mut last_error: Option<Error> = None;

        for model in models {
            info!("Attempting analysis with: {}", model);
            match self.generate(model, api_key, prompt).await {
                Ok(text) => {
                    info!("Success with {}", model);
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Failed with {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(Error::Ai(format!(
            "All AI models failed to respond. Last error: {}",
            last_error.map(|e| e.to_string()).unwrap_or_else(|| "Unknown error".to_string())
        )))
    }

    /// Run the full optimisation report
    pub async fn analyze(&self, api_key: &str, inventory: &[Product], history: &[Transaction]) -> Result<Analysis> {
        if inventory.is_empty() {
            return Err(Error::Invalid("no inventory data to analyse".to_string()));
        }
        let prompt = build_prompt(inventory, history);
        let models = self.candidates(api_key).await;
        info!("Candidate models: {:?}", models);

        let text = self.complete_with_fallback(api_key, &models, &prompt).await?;
        Ok(parse_analysis(&text))
    }
}

fn error_message(body: &Value) -> Option<String> {
    body["error"]["message"].as_str().map(str::to_string)
}

fn fallback_models() -> Vec<String> {
    FALLBACK_MODELS.iter().map(|m| m.to_string()).collect()
}

fn priority_of(model: &str) -> usize {
    MODEL_PRIORITY
        .iter()
        .position(|p| *p == model)
        .or_else(|| MODEL_PRIORITY.iter().position(|p| model.contains(p)))
        .unwrap_or(999)
}

/// Keep text-generation Gemini models and order them by priority
///
/// Ties keep the order the service listed them in.
pub fn rank_models(available: &[String]) -> Vec<String> {
    let mut models: Vec<String> = available
        .iter()
        .filter(|m| m.contains("gemini") && !m.contains("vision"))
        .cloned()
        .collect();
    models.sort_by_key(|m| priority_of(m));
    models
}

/// Build the analysis prompt
pub fn build_prompt(inventory: &[Product], history: &[Transaction]) -> String {
    let inventory_csv = inventory
        .iter()
        .map(|i| {
            format!(
                "{},{},{},{},{},{},{}",
                i.barcode, i.name, i.stock, i.price, i.min_stock, i.category, i.unit
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let history_csv = history
        .iter()
        .take(HISTORY_PROMPT_LIMIT)
        .map(|h| format!("{},{},{},{},{}", h.timestamp, h.barcode, h.kind, h.amount, h.user_id))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"
    System Role: คุณคือ Lead Inventory Optimization Architect และ Expert Data Scientist

    Constraints:
    1. Calculate precisely.
    2. IMPORTANT: Output Format must be **JSON ONLY** with structure:
    {{
      "summary_markdown": "Markdown table summary...",
      "recommendations": [
         {{ "barcode": "...", "name": "...", "current_stock": 0, "current_min_stock": 0, "recommended_min_stock": 0, "status": "...", "reason": "..." }}
      ]
    }}
    NO markdown code blocks. Raw JSON.

    Data:
    [Inventory]
    {}
    [History]
    {}
    "#,
        inventory_csv, history_csv
    )
}

fn lenient_int<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<i64, D::Error> {
    Ok(value_int(&Value::deserialize(d)?).unwrap_or(0))
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(value_text(&Value::deserialize(d)?))
}

/// A proposed minimum-stock change
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default, deserialize_with = "lenient_text")]
    pub barcode: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_int")]
    pub current_stock: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub current_min_stock: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub recommended_min_stock: i64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reason: String,
}

/// The model's report
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub summary_markdown: String,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

impl Analysis {
    /// Updates to push back to the sheet
    pub fn min_stock_updates(&self) -> Vec<MinStockUpdate> {
        self.recommendations
            .iter()
            .filter(|r| !r.barcode.trim().is_empty())
            .map(|r| MinStockUpdate {
                barcode: r.barcode.clone(),
                min_stock: r.recommended_min_stock,
            })
            .collect()
    }
}

/// Read the model's reply, tolerating a fenced code block
///
/// Unparseable replies become a summary-only report holding the raw text.
pub fn parse_analysis(text: &str) -> Analysis {
    let trimmed = text.trim();
    let clean = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let clean = clean.strip_suffix("```").unwrap_or(clean).trim();

    match serde_json::from_str::<Analysis>(clean) {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!("JSON Parse Error {}", e);
            Analysis {
                summary_markdown: text.to_string(),
                recommendations: Vec::new(),
            }
        }
    }
}

/// How much history the report looks at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisPeriod {
    #[default]
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    All,
    Custom,
}

impl AnalysisPeriod {
    /// First day of history to include, `None` for everything
    ///
    /// `custom` uses `custom_start`; without one it behaves like today.
    pub fn start_date(&self, today: NaiveDate, custom_start: Option<NaiveDate>) -> Option<NaiveDate> {
        let back = |months: u32| today.checked_sub_months(Months::new(months)).or(Some(today));
        match self {
            AnalysisPeriod::All => None,
            AnalysisPeriod::OneMonth => back(1),
            AnalysisPeriod::ThreeMonths => back(3),
            AnalysisPeriod::SixMonths => back(6),
            AnalysisPeriod::OneYear => back(12),
            AnalysisPeriod::Custom => Some(custom_start.unwrap_or(today)),
        }
    }
}
