//! End-to-end request pipeline tests.
//!
//! Drives the full router: validation → provider chain → override store or
//! mocked Open-Meteo → status mapping.

use serde_json::json;
use std::time::Duration;
use wiremock::ResponseTemplate;

use crate::mock_upstream::{app_for, get, post_json, wire_date, MockUpstream};
use weather_api::config::UpstreamConfig;

const TIMEOUT: Duration = Duration::from_secs(2);

fn override_body(city: &str, date: &str, min: f64, max: f64) -> serde_json::Value {
    json!({
        "city": city,
        "date": date,
        "min_temperature": min,
        "max_temperature": max
    })
}

// -- Overrides ---------------------------------------------------------------

#[tokio::test]
async fn test_override_answers_without_upstream() {
    let mock = MockUpstream::start().await.with_berlin().await.with_daily_window().await;
    let (app, _) = app_for(mock.config(), TIMEOUT).await;

    let (status, _) = post_json(&app, "/forecast", override_body("Berlin", "15.06.2025", 10.0, 20.0)).await;
    assert_eq!(status, 200);

    let (status, body) = get(&app, "/forecast?city=Berlin&date=15.06.2025").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"min_temperature": 10.0, "max_temperature": 20.0}));
    assert_eq!(mock.request_count().await, 0);
}

#[tokio::test]
async fn test_post_then_get_round_trips_and_reports_update() {
    let mock = MockUpstream::start().await.with_berlin().await.with_daily_window().await;
    let (app, store) = app_for(mock.config(), TIMEOUT).await;
    let date = wire_date(3);

    let (status, body) = post_json(&app, "/forecast", override_body("Paris", &date, -1.5, 7.25)).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"message": "OK", "created": true}));

    let (status, body) = post_json(&app, "/forecast", override_body("Paris", &date, 2.0, 9.0)).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"message": "OK", "created": false}));

    let (status, body) = get(&app, &format!("/forecast?city=Paris&date={date}")).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"min_temperature": 2.0, "max_temperature": 9.0}));
    assert_eq!(store.list(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_min_above_max_rejected() {
    let mock = MockUpstream::start().await;
    let (app, store) = app_for(mock.config(), TIMEOUT).await;

    let (status, body) = post_json(&app, "/forecast", override_body("Berlin", &wire_date(1), 30.0, 20.0)).await;
    assert_eq!(status, 400);
    assert!(body["non_field_errors"].is_array());
    assert!(store.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_and_delete_overrides() {
    let mock = MockUpstream::start().await;
    let (app, _) = app_for(mock.config(), TIMEOUT).await;
    post_json(&app, "/forecast", override_body("Oslo", &wire_date(2), 1.0, 6.0)).await;
    post_json(&app, "/forecast", override_body("Rome", &wire_date(2), 20.0, 31.0)).await;

    let (status, body) = get(&app, "/overrides").await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["city"], "Oslo");
    assert_eq!(body[0]["date"], "2025-06-12");

    let (status, body) = get(&app, "/overrides?city=Rome").await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let req = axum::http::Request::builder()
        .method("DELETE")
        .uri(format!("/forecast?city=Oslo&date={}", wire_date(2)))
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = tower::ServiceExt::oneshot(app.clone(), req).await.unwrap();
    assert_eq!(resp.status(), 200);

    let (_, body) = get(&app, "/overrides").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

// -- Date window -------------------------------------------------------------

#[tokio::test]
async fn test_date_window_on_read_path() {
    let mock = MockUpstream::start().await.with_berlin().await.with_daily_window().await;
    let (app, store) = app_for(mock.config(), TIMEOUT).await;
    store
        .upsert("Berlin", crate::mock_upstream::today() + chrono::Duration::days(10), 1.0, 2.0)
        .await
        .unwrap();

    let (status, _) = get(&app, &format!("/forecast?city=Berlin&date={}", wire_date(0))).await;
    assert_eq!(status, 200);
    let (status, body) = get(&app, &format!("/forecast?city=Berlin&date={}", wire_date(10))).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"min_temperature": 1.0, "max_temperature": 2.0}));

    let (status, body) = get(&app, &format!("/forecast?city=Berlin&date={}", wire_date(-1))).await;
    assert_eq!(status, 400);
    assert!(body["date"].is_array());
    let (status, _) = get(&app, &format!("/forecast?city=Berlin&date={}", wire_date(11))).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_date_window_on_write_path() {
    let mock = MockUpstream::start().await;
    let (app, _) = app_for(mock.config(), TIMEOUT).await;

    for (days, expected) in [(0, 200), (10, 200), (-1, 400), (11, 400)] {
        let (status, _) = post_json(&app, "/forecast", override_body("Berlin", &wire_date(days), 1.0, 2.0)).await;
        assert_eq!(status, expected, "offset {days}");
    }
}

// -- Upstream ----------------------------------------------------------------

#[tokio::test]
async fn test_forecast_from_upstream_exact_date() {
    let mock = MockUpstream::start().await.with_berlin().await.with_daily_window().await;
    let (app, _) = app_for(mock.config(), TIMEOUT).await;

    let (status, body) = get(&app, &format!("/forecast?city=Berlin&date={}", wire_date(4))).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"min_temperature": 4.0, "max_temperature": 14.0}));
}

#[tokio::test]
async fn test_date_beyond_upstream_window_is_not_found() {
    // The daily series covers ten days; the eleventh is valid input but
    // absent upstream.
    let mock = MockUpstream::start().await.with_berlin().await.with_daily_window().await;
    let (app, _) = app_for(mock.config(), TIMEOUT).await;

    let (status, body) = get(&app, &format!("/forecast?city=Berlin&date={}", wire_date(10))).await;
    assert_eq!(status, 404);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_current_weather() {
    let mock = MockUpstream::start().await.with_berlin().await.with_daily_window().await;
    let (app, _) = app_for(mock.config(), TIMEOUT).await;

    let (status, body) = get(&app, "/current?city=Berlin").await;
    assert_eq!(status, 200);
    assert_eq!(body["temperature"], 18.5);
    let local_time = body["local_time"].as_str().unwrap();
    assert_eq!(local_time.len(), 5);
    assert!(chrono::NaiveTime::parse_from_str(local_time, "%H:%M").is_ok());
}

#[tokio::test]
async fn test_unknown_city_is_not_found() {
    let mock = MockUpstream::start().await.with_no_cities().await;
    let (app, _) = app_for(mock.config(), TIMEOUT).await;

    let (status, _) = get(&app, "/current?city=Nonexistentville").await;
    assert_eq!(status, 404);
    let (status, _) = get(&app, &format!("/forecast?city=Nonexistentville&date={}", wire_date(1))).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_current_validation() {
    let mock = MockUpstream::start().await;
    let (app, _) = app_for(mock.config(), TIMEOUT).await;

    let (status, body) = get(&app, "/current").await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"city": ["This field is required."]}));

    let (status, _) = get(&app, "/current?city=ABCDEFGHIJKLMNOPQRSTU").await;
    assert_eq!(status, 400);
    assert_eq!(mock.request_count().await, 0);
}

// -- Fault mapping -----------------------------------------------------------

#[tokio::test]
async fn test_connection_failure_is_503() {
    let cfg = UpstreamConfig {
        geocoding_url: "http://127.0.0.1:1".to_string(),
        forecast_url: "http://127.0.0.1:1".to_string(),
        ..UpstreamConfig::default()
    };
    let (app, _) = app_for(cfg, TIMEOUT).await;

    let (status, _) = get(&app, "/current?city=Berlin").await;
    assert_eq!(status, 503);
    let (status, _) = get(&app, &format!("/forecast?city=Berlin&date={}", wire_date(1))).await;
    assert_eq!(status, 503);
}

#[tokio::test]
async fn test_timeout_is_504() {
    let mock = MockUpstream::start()
        .await
        .with_berlin()
        .await
        .forecast(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(3)),
        )
        .await;
    let (app, _) = app_for(mock.config(), Duration::from_millis(300)).await;

    let (status, _) = get(&app, "/current?city=Berlin").await;
    assert_eq!(status, 504);
    let (status, _) = get(&app, &format!("/forecast?city=Berlin&date={}", wire_date(1))).await;
    assert_eq!(status, 504);
}

#[tokio::test]
async fn test_malformed_payload_is_500() {
    let mock = MockUpstream::start()
        .await
        .with_berlin()
        .await
        .forecast(ResponseTemplate::new(200).set_body_json(json!({"latitude": 52.52})))
        .await;
    let (app, _) = app_for(mock.config(), TIMEOUT).await;

    let (status, body) = get(&app, "/current?city=Berlin").await;
    assert_eq!(status, 500);
    assert!(body["detail"].is_string());
    let (status, _) = get(&app, &format!("/forecast?city=Berlin&date={}", wire_date(1))).await;
    assert_eq!(status, 500);
}

#[tokio::test]
async fn test_upstream_error_status_is_500() {
    let mock = MockUpstream::start()
        .await
        .with_berlin()
        .await
        .forecast(ResponseTemplate::new(503))
        .await;
    let (app, _) = app_for(mock.config(), TIMEOUT).await;

    let (status, _) = get(&app, &format!("/forecast?city=Berlin&date={}", wire_date(1))).await;
    assert_eq!(status, 500);
}

#[tokio::test]
async fn test_broken_override_store_is_500_not_upstream() {
    let mock = MockUpstream::start().await.with_berlin().await.with_daily_window().await;
    let (app, store) = app_for(mock.config(), TIMEOUT).await;
    post_json(&app, "/forecast", override_body("Berlin", &wire_date(2), 10.0, 20.0)).await;
    store.close().await;

    let (status, body) = get(&app, &format!("/forecast?city=Berlin&date={}", wire_date(2))).await;
    assert_eq!(status, 500);
    assert!(body["detail"].is_string());
    assert_eq!(mock.request_count().await, 0);
}
