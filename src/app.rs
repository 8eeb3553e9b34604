use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Local, NaiveDate};
use log::{info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::backend::{Backend, MinStockUpdate, MockBackend, StockUpdate};
use crate::config::Config;
use crate::downloader;
use crate::error::Error;
use crate::gemini::{Analysis, AnalysisPeriod, GeminiClient, Recommendation};
use crate::i18n::{t, table, Language};
use crate::inventory::{self, DashboardStats, MAX_ADJUSTMENT, QUICK_AMOUNTS, SCAN_SUGGESTION_LIMIT, SEARCH_SUGGESTION_LIMIT};
use crate::label::{
    format_lot, CustomLabelForm, CustomLabelSettings, FontStyles, LabelSettings, BARCODE_LABEL_SIZES, PAPER_SIZES,
};
use crate::loader;
use crate::photo::{prepare_upload, UPLOAD_MAX_SIDE};
use crate::presets::{NewPreset, PresetStore};
use crate::print::Printer;
use crate::product::StockType;
use crate::scanner::{Device, ScanFailure, ScannerConfig};
use crate::sheet_api::SheetClient;
use crate::store::{Capture, InventoryStore};

const LANG_COOKIE: &str = "lang";

/// Photo uploads from phone cameras exceed axum's 2 MB default
const IMAGE_BODY_LIMIT: usize = 16 * 1024 * 1024;

pub struct AppState {
    pub store: InventoryStore,
    pub gemini: GeminiClient,
    presets: Mutex<PresetStore>,
    printer: Printer,
    user_id: String,
}

impl AppState {
    /// Wire up the backend and local stores from the command line settings
    pub fn new(config: &Config) -> Result<Self, Error> {
        std::fs::create_dir_all(&config.data_dir)?;

        let (backend, snapshot): (Arc<dyn Backend>, Option<PathBuf>) = if config.mock {
            let backend = match &config.mock_data {
                Some(path) => {
                    let products = loader::load_products(path)?;
                    info!("Mock backend seeded with {} products from {}", products.len(), path.display());
                    MockBackend::new(products)
                }
                None => MockBackend::demo(),
            };
            (Arc::new(backend), None)
        } else {
            info!("Using spreadsheet service at {}", config.api_url);
            (Arc::new(SheetClient::new(&config.api_url)), Some(config.snapshot_path()))
        };

        Self::from_parts(
            InventoryStore::new(backend, snapshot),
            PresetStore::open(config.presets_path())?,
            GeminiClient::new(&config.gemini_url),
            &config.user_id,
        )
    }

    pub fn from_parts(
        store: InventoryStore,
        presets: PresetStore,
        gemini: GeminiClient,
        user_id: &str,
    ) -> Result<Self, Error> {
        Ok(AppState {
            store,
            gemini,
            presets: Mutex::new(presets),
            printer: Printer::new()?,
            user_id: user_id.to_string(),
        })
    }

    fn presets(&self) -> Result<MutexGuard<'_, PresetStore>, Error> {
        self.presets
            .lock()
            .map_err(|_| Error::Invalid("preset store is unavailable".to_string()))
    }
}

/// Error reply: `{success: false, error}` with a status picked by kind
pub struct AppError {
    error: Error,
    lang: Language,
}

impl AppError {
    fn localized(error: Error, lang: Language) -> Self {
        AppError { error, lang }
    }

    fn status(&self) -> StatusCode {
        match self.error {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Invalid(_) => StatusCode::BAD_REQUEST,
            Error::Busy => StatusCode::CONFLICT,
            Error::Remote(_) | Error::Network(_) | Error::Decode(_) | Error::Ai(_) => StatusCode::BAD_GATEWAY,
            Error::Io(_) | Error::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match &self.error {
            Error::Busy => t(self.lang, "scan.busy").to_string(),
            other => other.to_string(),
        }
    }
}

impl From<Error> for AppError {
    fn from(error: Error) -> Self {
        AppError {
            error,
            lang: Language::default(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed: {}", self.error);
        }
        (status, Json(json!({ "success": false, "error": self.message() }))).into_response()
    }
}

type ApiResult<T = Json<Value>> = Result<T, AppError>;

fn language(jar: &CookieJar) -> Language {
    jar.get(LANG_COOKIE)
        .and_then(|c| Language::from_code(c.value()))
        .unwrap_or_default()
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/api/config", get(get_config))
        .route("/api/lang/:lang", get(set_language))
        .route("/api/inventory", get(get_inventory))
        .route("/api/inventory.xlsx", get(export_inventory))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/low-stock", get(get_low_stock))
        .route("/api/low-stock.csv", get(export_low_stock))
        .route("/api/history", get(get_history))
        .route("/api/history.xlsx", get(export_history))
        .route("/api/history/clear", post(clear_history))
        .route("/api/suggest", get(get_suggestions))
        .route("/api/search", get(search_product))
        .route("/api/product/:barcode", get(get_product))
        .route("/api/scan", post(scan_code))
        .route("/api/scan-error", get(scan_error))
        .route("/api/stock", post(update_stock))
        .route(
            "/api/image",
            post(upload_image).layer(DefaultBodyLimit::max(IMAGE_BODY_LIMIT)),
        )
        .route("/api/report", post(save_report))
        .route("/api/min-stock", post(update_min_stock))
        .route("/api/presets", get(list_presets).post(add_preset))
        .route("/api/presets/:id", get(load_preset).delete(delete_preset))
        .route("/api/lot", get(get_lot).post(set_lot))
        .route("/api/lot/next", post(next_lot))
        .route("/api/ai/key", get(get_ai_key).post(set_ai_key))
        .route("/api/ai/analyze", post(analyze))
        .route("/api/ai/apply", post(apply_recommendations))
        .route("/print/barcode/:barcode", get(print_barcode))
        .route("/print/custom", post(print_custom))
        .route("/print/low-stock", get(print_low_stock))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new(&config)?);

    match state.store.refresh().await {
        Ok(list) => info!("Loaded {} products", list.len()),
        Err(e) => warn!("Starting without inventory: {}", e),
    }

    let app = router(state);

    let listener = TcpListener::bind(&config.bind).await?;
    info!("Listening on http://{}", config.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

#[derive(Deserialize)]
struct ConfigQuery {
    #[serde(default)]
    touch: bool,
}

async fn get_config(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConfigQuery>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Json<Value> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let lang = language(&jar);

    Json(json!({
        "scanner": ScannerConfig::for_device(Device::detect_with_touch(user_agent, params.touch)),
        "language": lang.code(),
        "translations": table(lang),
        "quickAmounts": QUICK_AMOUNTS,
        "maxAdjustment": MAX_ADJUSTMENT,
        "paperSizes": PAPER_SIZES,
        "barcodeLabelSizes": BARCODE_LABEL_SIZES,
        "userId": state.user_id,
    }))
}

async fn set_language(Path(code): Path<String>, jar: CookieJar) -> Result<(CookieJar, Json<Value>), AppError> {
    let lang = Language::from_code(&code).ok_or_else(|| Error::Invalid(format!("unknown language {}", code)))?;
    let mut cookie = Cookie::new(LANG_COOKIE, lang.code());
    cookie.set_path("/");

    Ok((
        jar.add(cookie),
        Json(json!({ "success": true, "language": lang.code() })),
    ))
}

#[derive(Deserialize)]
struct InventoryQuery {
    #[serde(default)]
    refresh: bool,
}

async fn get_inventory(State(state): State<Arc<AppState>>, Query(params): Query<InventoryQuery>) -> ApiResult {
    let list = if params.refresh {
        state.store.refresh().await?
    } else {
        state.store.products().await?
    };
    Ok(Json(json!(inventory::valid_inventory(&list))))
}

async fn get_dashboard(State(state): State<Arc<AppState>>) -> ApiResult {
    let list = inventory::valid_inventory(&state.store.products().await?);
    let history = state.store.backend().history(None).await.unwrap_or_else(|e| {
        warn!("Dashboard without history: {}", e);
        Vec::new()
    });

    let today = Local::now().date_naive();
    let stats = DashboardStats::compute(&list, &history, today);
    Ok(Json(json!({
        "stats": stats,
        "lowStock": inventory::low_stock(&list),
        "recent": history.iter().take(10).collect::<Vec<_>>(),
    })))
}

async fn get_low_stock(State(state): State<Arc<AppState>>) -> ApiResult {
    let list = state.store.products().await?;
    Ok(Json(json!(inventory::low_stock(&inventory::valid_inventory(&list)))))
}

fn attachment(content_type: &str, file_name: &str, body: impl Into<Body>) -> Response {
    let body: Body = body.into();
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        file_name,
        urlencoding::encode(file_name)
    );
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

const XLSX_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

async fn export_low_stock(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let list = state.store.products().await?;
    let items = inventory::low_stock(&inventory::valid_inventory(&list));
    let name = downloader::low_stock_file_name(Local::now().date_naive());
    Ok(attachment("text/csv; charset=utf-8", &name, downloader::low_stock_csv(&items)))
}

async fn export_inventory(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let list = inventory::valid_inventory(&state.store.products().await?);
    let bytes = downloader::inventory_xlsx(&list)?;
    let name = format!("Inventory_{}.xlsx", Local::now().format("%Y-%m-%d"));
    Ok(attachment(XLSX_TYPE, &name, bytes))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryQuery {
    start_date: Option<NaiveDate>,
}

async fn get_history(State(state): State<Arc<AppState>>, Query(params): Query<HistoryQuery>) -> ApiResult {
    let history = state.store.backend().history(params.start_date).await?;
    Ok(Json(json!(history)))
}

async fn export_history(State(state): State<Arc<AppState>>, Query(params): Query<HistoryQuery>) -> ApiResult<Response> {
    let history = state.store.backend().history(params.start_date).await?;
    let bytes = downloader::history_xlsx(&history)?;
    let name = format!("History_{}.xlsx", Local::now().format("%Y-%m-%d"));
    Ok(attachment(XLSX_TYPE, &name, bytes))
}

async fn clear_history(State(state): State<Arc<AppState>>, jar: CookieJar) -> ApiResult {
    let message = state.store.backend().clear_history().await?;
    let message = if message.is_empty() {
        t(language(&jar), "history.cleared").to_string()
    } else {
        message
    };
    Ok(Json(json!({ "success": true, "message": message })))
}

#[derive(Deserialize)]
struct SuggestQuery {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

async fn get_suggestions(State(state): State<Arc<AppState>>, Query(params): Query<SuggestQuery>) -> ApiResult {
    let limit = params
        .limit
        .unwrap_or(SCAN_SUGGESTION_LIMIT)
        .min(SEARCH_SUGGESTION_LIMIT);
    let list = state.store.products().await?;
    Ok(Json(json!(inventory::suggestions(&list, &params.q, limit))))
}

async fn search_product(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SuggestQuery>,
    jar: CookieJar,
) -> ApiResult {
    let lang = language(&jar);
    match state.store.resolve(&params.q).await {
        Ok(Some(product)) => Ok(Json(json!({ "success": true, "product": product }))),
        Ok(None) => Err(AppError::localized(
            Error::NotFound(format!("{}: {}", t(lang, "scan.productNotFound"), params.q.trim())),
            lang,
        )),
        Err(e) => Err(AppError::localized(e, lang)),
    }
}

async fn get_product(State(state): State<Arc<AppState>>, Path(barcode): Path<String>) -> ApiResult {
    let product = state.store.backend().product(&barcode).await?;
    Ok(Json(json!(product.with_defaults())))
}

#[derive(Deserialize)]
struct ScanRequest {
    code: String,
}

async fn scan_code(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<ScanRequest>,
) -> ApiResult<Response> {
    let lang = language(&jar);
    match state.store.capture(&req.code).await {
        Ok(Capture::Found(product)) => Ok(Json(json!({ "success": true, "product": product })).into_response()),
        Ok(Capture::NotFound(code)) => {
            let failure = ScanFailure::ProductNotFound { code: code.clone() };
            Ok((
                StatusCode::NOT_FOUND,
                Json(json!({ "success": false, "error": failure.message(lang), "code": code })),
            )
                .into_response())
        }
        Err(e) => Err(AppError::localized(e, lang)),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StockRequest {
    barcode: String,
    amount: i64,
    #[serde(rename = "type")]
    kind: StockType,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Deserialize)]
struct ScanErrorQuery {
    #[serde(default)]
    name: String,
}

/// Turn a browser camera error name into the localized failure the page shows
async fn scan_error(Query(params): Query<ScanErrorQuery>, jar: CookieJar) -> Json<Value> {
    let failure = ScanFailure::from_camera_error(&params.name);
    Json(json!({
        "success": false,
        "failure": failure,
        "error": failure.message(language(&jar)),
    }))
}

async fn update_stock(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<StockRequest>,
) -> ApiResult {
    let lang = language(&jar);
    let update = StockUpdate {
        barcode: req.barcode,
        amount: req.amount,
        kind: req.kind,
        user_id: state.user_id.clone(),
        image_url: req.image_url,
    };
    info!("Stock {} {} x{}", update.kind, update.barcode, update.amount);

    let result = state
        .store
        .adjust_stock(update)
        .await
        .map_err(|e| AppError::localized(e, lang))?;
    Ok(Json(json!({
        "success": true,
        "message": result.message.unwrap_or_else(|| t(lang, "scan.stockUpdated").to_string()),
        "newStock": result.new_stock,
    })))
}

async fn upload_image(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> ApiResult {
    let mut image = Vec::new();
    let mut barcode = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Invalid(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                image = field
                    .bytes()
                    .await
                    .map_err(|e| Error::Invalid(e.to_string()))?
                    .to_vec()
            }
            "barcode" => barcode = field.text().await.map_err(|e| Error::Invalid(e.to_string()))?,
            _ => {}
        }
    }

    if image.is_empty() {
        return Err(Error::Invalid("No image data received".to_string()).into());
    }
    if barcode.trim().is_empty() {
        return Err(Error::Invalid("barcode is required".to_string()).into());
    }

    let data_url = tokio::task::spawn_blocking(move || prepare_upload(&image, UPLOAD_MAX_SIDE))
        .await
        .map_err(|e| Error::Export(format!("image task failed: {}", e)))??;
    let url = state.store.backend().upload_image(&data_url, barcode.trim()).await?;
    Ok(Json(json!({ "success": true, "imageUrl": url })))
}

#[derive(Deserialize, Default)]
struct ReportRequest {
    #[serde(default)]
    note: String,
}

async fn save_report(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Option<Json<ReportRequest>>,
) -> ApiResult {
    let lang = language(&jar);
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let note = if req.note.trim().is_empty() {
        format!("Report from {}", state.user_id)
    } else {
        req.note
    };

    state
        .store
        .backend()
        .save_report(&note)
        .await
        .map_err(|e| AppError::localized(Error::Remote(format!("{}: {}", t(lang, "dashboard.reportFailed"), e)), lang))?;
    Ok(Json(json!({ "success": true, "message": t(lang, "dashboard.reportSaved") })))
}

async fn push_min_stock(state: &AppState, updates: &[MinStockUpdate]) -> Result<String, Error> {
    if updates.is_empty() {
        return Err(Error::Invalid("no updates".to_string()));
    }
    let message = state.store.backend().bulk_update_min_stock(updates).await?;
    if let Err(e) = state.store.refresh().await {
        warn!("Could not reload inventory after min stock update: {}", e);
    }
    Ok(message)
}

async fn update_min_stock(State(state): State<Arc<AppState>>, Json(updates): Json<Vec<MinStockUpdate>>) -> ApiResult {
    let message = push_min_stock(&state, &updates).await?;
    Ok(Json(json!({ "success": true, "message": message })))
}

async fn list_presets(State(state): State<Arc<AppState>>) -> ApiResult {
    let presets = state.presets()?;
    Ok(Json(json!(presets.presets())))
}

async fn add_preset(State(state): State<Arc<AppState>>, Json(preset): Json<NewPreset>) -> ApiResult {
    let saved = state.presets()?.add_preset(preset)?;
    Ok(Json(json!({ "success": true, "preset": saved })))
}

async fn load_preset(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    let loaded = state.presets()?.load_preset(&id, Local::now().date_naive())?;
    Ok(Json(json!(loaded)))
}

async fn delete_preset(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    if !state.presets()?.delete_preset(&id)? {
        return Err(Error::NotFound(format!("preset {}", id)).into());
    }
    Ok(Json(json!({ "success": true })))
}

fn lot_reply(lot: u64) -> Json<Value> {
    Json(json!({ "lotNumber": lot, "formatted": format_lot(lot) }))
}

async fn get_lot(State(state): State<Arc<AppState>>) -> ApiResult {
    Ok(lot_reply(state.presets()?.lot_number()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LotRequest {
    lot_number: u64,
}

async fn set_lot(State(state): State<Arc<AppState>>, Json(req): Json<LotRequest>) -> ApiResult {
    state.presets()?.set_lot_number(req.lot_number)?;
    Ok(lot_reply(req.lot_number))
}

async fn next_lot(State(state): State<Arc<AppState>>) -> ApiResult {
    let lot = state.presets()?.increment_lot()?;
    Ok(lot_reply(lot))
}

async fn get_ai_key(State(state): State<Arc<AppState>>) -> ApiResult {
    Ok(Json(json!({ "hasKey": state.presets()?.api_key().is_some() })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyRequest {
    #[serde(default)]
    api_key: String,
}

/// Test the key against the model list and keep it when it works
async fn set_ai_key(State(state): State<Arc<AppState>>, Json(req): Json<KeyRequest>) -> ApiResult {
    let key = req.api_key.trim();
    if key.is_empty() {
        state.presets()?.set_api_key("")?;
        return Ok(Json(json!({ "success": true, "models": [] })));
    }

    let models = state.gemini.check_api_key(key).await?;
    state.presets()?.set_api_key(key)?;
    Ok(Json(json!({ "success": true, "models": models })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    #[serde(default)]
    period: AnalysisPeriod,
    #[serde(default)]
    custom_start: Option<NaiveDate>,
    #[serde(default)]
    api_key: Option<String>,
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<AnalyzeRequest>,
) -> ApiResult {
    let lang = language(&jar);
    let stored = state.presets()?.api_key().map(str::to_string);
    let key = req
        .api_key
        .filter(|k| !k.trim().is_empty())
        .or(stored)
        .ok_or_else(|| AppError::localized(Error::Invalid(t(lang, "ai.keyRequired").to_string()), lang))?;

    let list = inventory::valid_inventory(&state.store.products().await?);
    if list.is_empty() {
        return Err(AppError::localized(Error::Invalid(t(lang, "ai.noInventory").to_string()), lang));
    }

    let start = req.period.start_date(Local::now().date_naive(), req.custom_start);
    let history = state.store.backend().history(start).await?;
    info!("Analysing {} products and {} history rows", list.len(), history.len());

    let analysis = state.gemini.analyze(key.trim(), &list, &history).await?;
    Ok(Json(json!(analysis)))
}

#[derive(Deserialize)]
struct ApplyRequest {
    recommendations: Vec<Recommendation>,
}

async fn apply_recommendations(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<ApplyRequest>,
) -> ApiResult {
    let lang = language(&jar);
    let updates = Analysis {
        summary_markdown: String::new(),
        recommendations: req.recommendations,
    }
    .min_stock_updates();

    let message = push_min_stock(&state, &updates)
        .await
        .map_err(|e| AppError::localized(Error::Remote(format!("{}: {}", t(lang, "ai.applyFailed"), e)), lang))?;
    Ok(Json(json!({ "success": true, "message": message, "updated": updates.len() })))
}

async fn print_barcode(
    State(state): State<Arc<AppState>>,
    Path(barcode): Path<String>,
    Query(settings): Query<LabelSettings>,
) -> ApiResult<Html<String>> {
    let cached = state.store.products().await?;
    let product = match inventory::find_product(&cached, &barcode) {
        Some(p) => p.clone(),
        None => state.store.backend().product(&barcode).await?,
    };
    Ok(Html(state.printer.barcode_labels(&product, &settings)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomPrintRequest {
    form: CustomLabelForm,
    #[serde(default)]
    settings: CustomLabelSettings,
    #[serde(default)]
    font_styles: FontStyles,
}

/// Render the custom label sheet; the next lot number is stored once it renders
async fn print_custom(State(state): State<Arc<AppState>>, Json(req): Json<CustomPrintRequest>) -> ApiResult<Html<String>> {
    let page = state
        .printer
        .custom_labels(&req.form, &req.settings, &req.font_styles)?;
    state.presets()?.advance_past(req.form.lot_number)?;
    Ok(Html(page))
}

async fn print_low_stock(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    let list = state.store.products().await?;
    let items = inventory::low_stock(&inventory::valid_inventory(&list));
    Ok(Html(state.printer.low_stock_report(&items, Local::now().date_naive())?))
}
