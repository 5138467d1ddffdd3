use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use starfish_core::{Config, providers_from_config};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JAN_1: i64 = 1_704_067_200;

/// App wired to real providers that talk to `mock_server`.
fn app_against(mock_server: &MockServer) -> Router {
    let mut cfg = Config::default();
    cfg.providers.geocoding_url = mock_server.uri();
    cfg.providers.forecast_url = mock_server.uri();
    cfg.retry.max_attempts = 2;
    cfg.retry.initial_backoff_ms = 1;

    let providers = providers_from_config(&cfg).expect("providers");
    starfish_cli::build_app(providers)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let res = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn healthz_is_ok() {
    let mock_server = MockServer::start().await;
    let app = app_against(&mock_server);

    let (status, _) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn get_coords_returns_latitude_and_longitude() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/postcodes/SW1A1AA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": 200,
            "result": {"postcode": "SW1A 1AA", "longitude": -0.141588, "latitude": 51.501009}
        })))
        .mount(&mock_server)
        .await;

    let app = app_against(&mock_server);
    let (status, body) = get(&app, "/get_coords?postcode=SW1A1AA").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, serde_json::json!({"latitude": 51.501009, "longitude": -0.141588}));
}

#[tokio::test]
async fn get_coords_without_postcode_is_bad_request() {
    let mock_server = MockServer::start().await;
    let app = app_against(&mock_server);

    let (status, _) = get(&app, "/get_coords").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_postcode_is_bad_gateway() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/postcodes/NOPE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "status": 404,
            "error": "Postcode not found"
        })))
        .mount(&mock_server)
        .await;

    let app = app_against(&mock_server);
    let (status, body) = get(&app, "/get_coords?postcode=NOPE").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn get_weather_returns_timestamp_keyed_records() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("forecast_days", "1"))
        .and(query_param("hourly", "temperature_2m,cloud_cover,rain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "hourly": {
                "time": [JAN_1, JAN_1 + 3600],
                "temperature_2m": [10.0, 11.0],
                "cloud_cover": [50.0, 25.0],
                "rain": [0.0, 0.3]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = app_against(&mock_server);
    let (status, body) = get(&app, "/get_weather?latitude=51.5&longitude=-0.12&days=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        "{\"2024-01-01T00:00:00+00:00\":{\"temperature_2m\":10.0,\"cloud_cover\":50.0,\"rain\":0.0},\
         \"2024-01-01T01:00:00+00:00\":{\"temperature_2m\":11.0,\"cloud_cover\":25.0,\"rain\":0.3}}"
    );

    // Second identical request is served from the transport cache.
    let (status, again) = get(&app, "/get_weather?latitude=51.5&longitude=-0.12&days=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again, body);
}

#[tokio::test]
async fn get_weather_rejects_bad_input() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = app_against(&mock_server);

    let (status, _) = get(&app, "/get_weather?latitude=abc&longitude=-0.12&days=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/get_weather?latitude=51.5&longitude=-0.12").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(&app, "/get_weather?latitude=51.5&longitude=-0.12&days=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("days must be at least 1"));
}

#[tokio::test]
async fn malformed_forecast_is_bad_gateway() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "hourly": {
                "time": [JAN_1],
                "temperature_2m": [10.0],
                "cloud_cover": [50.0]
            }
        })))
        .mount(&mock_server)
        .await;

    let app = app_against(&mock_server);
    let (status, body) = get(&app, "/get_weather?latitude=51.5&longitude=-0.12&days=1").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("rain"));
}

#[tokio::test]
async fn exhausted_retries_are_bad_gateway() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let app = app_against(&mock_server);
    let (status, _) = get(&app, "/get_weather?latitude=51.5&longitude=-0.12&days=3").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
