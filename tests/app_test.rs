#![cfg(feature = "web")]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use optistock::app::{router, AppState};
use optistock::gemini::GeminiClient;
use optistock::label::DEFAULT_LOT_NUMBER;
use optistock::presets::PresetStore;
use optistock::store::InventoryStore;
use optistock::MockBackend;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";
const MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 Version/17.4 Safari/605.1.15";

fn state() -> Arc<AppState> {
    let store = InventoryStore::new(Arc::new(MockBackend::demo()), None);
    Arc::new(AppState::from_parts(store, PresetStore::in_memory(), GeminiClient::default(), "WebApp").unwrap())
}

fn app() -> Router {
    router(state())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn send_json(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    send_json(Method::POST, uri, body)
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn call_text(app: &Router, req: Request<Body>) -> (StatusCode, String) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn index_page_is_served() {
    let (status, html) = call_text(&app(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<html"));
}

#[tokio::test]
async fn config_picks_scanner_by_user_agent() {
    let app = app();
    let req = Request::builder()
        .uri("/api/config")
        .header(header::USER_AGENT, IPHONE)
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scanner"]["engine"], "quagga2");
    assert_eq!(body["language"], "th");
    assert_eq!(body["userId"], "WebApp");
    assert_eq!(body["quickAmounts"], json!([10, 50, 100, 500, 1000]));
    assert_eq!(body["maxAdjustment"], 9999);

    let req = Request::builder()
        .uri("/api/config?touch=true")
        .header(header::USER_AGENT, MAC)
        .body(Body::empty())
        .unwrap();
    let (_, body) = call(&app, req).await;
    assert_eq!(body["scanner"]["device"], "ios");

    let (_, body) = call(&app, get("/api/config")).await;
    assert_eq!(body["scanner"]["engine"], "html5Qrcode");
}

#[tokio::test]
async fn language_cookie() {
    let app = app();
    let resp = app.clone().oneshot(get("/api/lang/en")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("lang=en"));

    let (status, _) = call(&app, get("/api/lang/fr")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .uri("/api/config")
        .header(header::COOKIE, "lang=en")
        .body(Body::empty())
        .unwrap();
    let (_, body) = call(&app, req).await;
    assert_eq!(body["language"], "en");
    assert_eq!(body["translations"]["scan.confirm"], "Confirm");
}

#[tokio::test]
async fn dashboard_and_low_stock() {
    let app = app();
    let (status, body) = call(&app, get("/api/dashboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["totalItems"], 3);
    assert_eq!(body["stats"]["lowStock"], 2);
    assert_eq!(body["lowStock"].as_array().unwrap().len(), 2);

    let (_, body) = call(&app, get("/api/low-stock")).await;
    let barcodes: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["barcode"].as_str())
        .collect();
    assert_eq!(barcodes, vec!["8850987654321", "1234567890123"]);

    let (_, body) = call(&app, get("/api/inventory?refresh=true")).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn low_stock_csv_download() {
    let resp = app().oneshot(get("/api/low-stock.csv")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains("Low_Stock_"));
    assert!(disposition.contains(".csv"));

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with("\u{feff}".as_bytes()));
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("\"Lays Classic 50g\""));
}

#[tokio::test]
async fn inventory_workbook_download() {
    let resp = app().oneshot(get("/api/inventory.xlsx")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn scan_found_missing_and_empty() {
    let app = app();
    let (status, body) = call(&app, post_json("/api/scan", json!({ "code": " 8850123456789\n" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["product"]["unit"], "ขวด");

    let (status, body) = call(&app, post_json("/api/scan", json!({ "code": "9999999999999" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "9999999999999");
    assert!(body["error"].as_str().unwrap().contains("9999999999999"));

    let (status, body) = call(&app, post_json("/api/scan", json!({ "code": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn scan_while_busy_is_conflict() {
    let state = state();
    let app = router(state.clone());
    let _session = state.store.scan_guard().try_begin().unwrap();

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/scan")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, "lang=en")
        .body(Body::from(json!({ "code": "8850123456789" }).to_string()))
        .unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Still processing the previous scan");
}

#[tokio::test]
async fn camera_errors_are_localized() {
    let app = app();
    let req = Request::builder()
        .uri("/api/scan-error?name=OverconstrainedError")
        .header(header::COOKIE, "lang=en")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["failure"]["kind"], "cameraFailed");
    assert_eq!(body["error"], "Could not open the camera");

    let (_, body) = call(&app, get("/api/scan-error?name=NotAllowedError")).await;
    assert_eq!(body["failure"]["kind"], "permissionDenied");
    assert_eq!(body["error"], "กรุณาอนุญาตให้เข้าถึงกล้อง");

    let (_, body) = call(&app, get("/api/scan-error")).await;
    assert_eq!(body["failure"]["kind"], "cameraFailed");
}

#[tokio::test]
async fn stock_adjustment_and_history() {
    let app = app();
    let req = post_json(
        "/api/stock",
        json!({ "barcode": "1234567890123", "amount": 6, "type": "IN" }),
    );
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["newStock"], 18);

    let (status, body) = call(
        &app,
        post_json("/api/stock", json!({ "barcode": "1234567890123", "amount": 0, "type": "OUT" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, body) = call(&app, get("/api/history")).await;
    let history = body.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["userId"], "WebApp");
    assert_eq!(history[0]["type"], "IN");

    let (_, body) = call(&app, post_json("/api/history/clear", json!({}))).await;
    assert_eq!(body["success"], true);
    let (_, body) = call(&app, get("/api/history")).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn search_and_suggestions() {
    let app = app();
    let (status, body) = call(&app, get("/api/search?q=lays")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["barcode"], "8850987654321");

    let req = Request::builder()
        .uri("/api/search?q=pepsi")
        .header(header::COOKIE, "lang=en")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Product not found for barcode: pepsi"));

    let (_, body) = call(&app, get("/api/suggest?q=88")).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = call(&app, get("/api/product/1234567890123")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Coca Cola 325ml");
    let (status, _) = call(&app, get("/api/product/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn min_stock_updates_reach_inventory() {
    let app = app();
    let (status, _) = call(&app, post_json("/api/min-stock", json!([]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        post_json("/api/min-stock", json!([{ "barcode": "8850123456789", "minStock": 99 }])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Mock updated 1 items");

    let (_, body) = call(&app, get("/api/inventory")).await;
    let water = body
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["barcode"] == "8850123456789")
        .unwrap()
        .clone();
    assert_eq!(water["minStock"], 99);

    let (_, body) = call(
        &app,
        post_json(
            "/api/ai/apply",
            json!({ "recommendations": [{ "barcode": "1234567890123", "recommended_min_stock": 30 }] }),
        ),
    )
    .await;
    assert_eq!(body["updated"], 1);
}

#[tokio::test]
async fn presets_and_lot_numbers() {
    let app = app();
    let (status, body) = call(
        &app,
        post_json(
            "/api/presets",
            json!({ "name": "Line A", "companyName": "ACME", "productCode": "X-1", "quantity": 4 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["preset"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["preset"]["lotNumber"], DEFAULT_LOT_NUMBER);

    let (_, body) = call(&app, get("/api/presets")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = call(&app, get(&format!("/api/presets/{}", id))).await;
    assert_eq!(body["form"]["companyName"], "ACME");
    assert_eq!(body["form"]["quantity"], 4);

    let delete = || {
        Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/presets/{}", id))
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(call(&app, delete()).await.0, StatusCode::OK);
    assert_eq!(call(&app, delete()).await.0, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, post_json("/api/presets", json!({ "name": " ", "companyName": "", "productCode": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(&app, get("/api/lot")).await;
    assert_eq!(body["lotNumber"], DEFAULT_LOT_NUMBER);
    let (_, body) = call(&app, post_json("/api/lot/next", json!({}))).await;
    assert_eq!(body["lotNumber"], DEFAULT_LOT_NUMBER + 1);
    assert_eq!(body["formatted"], "0001000001");
    let (_, body) = call(&app, post_json("/api/lot", json!({ "lotNumber": 42 }))).await;
    assert_eq!(body["formatted"], "0000000042");
}

#[tokio::test]
async fn custom_print_advances_lot() {
    let app = app();
    let req = post_json(
        "/print/custom",
        json!({
            "form": {
                "companyName": "ACME",
                "productCode": "X-1",
                "date": "2024-03-07",
                "quantity": 5,
                "lotNumber": 1000123
            },
            "settings": { "rows": 2, "cols": 2 }
        }),
    );
    let (status, html) = call_text(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("0001000123"));
    assert!(html.contains("07/03/2567"));
    assert!(html.contains("ACME"));

    let (_, body) = call(&app, get("/api/lot")).await;
    assert_eq!(body["lotNumber"], 1_000_124);
}

#[tokio::test]
async fn lot_number_at_the_limit_is_rejected() {
    let app = app();
    let req = post_json(
        "/print/custom",
        json!({
            "form": {
                "companyName": "ACME",
                "productCode": "X-1",
                "date": "2024-03-07",
                "quantity": 1,
                "lotNumber": u64::MAX
            },
            "settings": { "rows": 1, "cols": 1 }
        }),
    );
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    call(&app, post_json("/api/lot", json!({ "lotNumber": u64::MAX }))).await;
    let (status, _) = call(&app, post_json("/api/lot/next", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = call(&app, get("/api/lot")).await;
    assert_eq!(body["lotNumber"], u64::MAX);
}

#[tokio::test]
async fn barcode_and_low_stock_print_pages() {
    let app = app();
    let (status, html) = call_text(&app, get("/print/barcode/8850123456789?copies=4&showPrice=false")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("8850123456789"));
    assert!(html.contains("JsBarcode"));

    let (status, _) = call_text(&app, get("/print/barcode/0000000000000")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, html) = call_text(&app, get("/print/low-stock")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Lays Classic 50g"));
    assert!(!html.contains("Crystal"));
}

#[tokio::test]
async fn ai_requires_a_key() {
    let app = app();
    let (_, body) = call(&app, get("/api/ai/key")).await;
    assert_eq!(body["hasKey"], false);

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/ai/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, "lang=en")
        .body(Body::from(json!({ "period": "3m" }).to_string()))
        .unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Gemini API key"));

    let (status, body) = call(&app, post_json("/api/ai/key", json!({ "apiKey": "" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["models"], json!([]));
}

#[tokio::test]
async fn photo_upload_is_downscaled_and_stored() {
    use image::{ImageBuffer, ImageOutputFormat, Rgb};
    use std::io::Cursor;

    let mut png = Vec::new();
    ImageBuffer::from_pixel(8, 8, Rgb([200u8, 10, 10]))
        .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
        .unwrap();

    let boundary = "optistock-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"barcode\"\r\n\r\n8850123456789\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"p.png\"\r\nContent-Type: image/png\r\n\r\n",
            b = boundary
        )
        .as_bytes(),
    );
    body.extend_from_slice(&png);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/image")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, body) = call(&app(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["imageUrl"], "https://via.placeholder.com/300");

    let empty = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"barcode\"\r\n\r\n111\r\n--{b}--\r\n",
        b = boundary
    );
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/image")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(empty))
        .unwrap();
    let (status, _) = call(&app(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
