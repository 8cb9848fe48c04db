use axum::body::Body;
use axum::http::{Request, StatusCode};
use crime_choropleth::color::ColorScale;
use crime_choropleth::names::CanonicalNameMap;
use crime_choropleth::server::{router, AppState};
use crime_choropleth::store::Store;
use crime_choropleth::types::{Boundary, Category, CategoryCounts, YearlyRecord};
use crime_choropleth::viewport::ViewportController;
use crime_choropleth::map::RegionLayer;
use geo::{polygon, MultiPolygon};
use http_body_util::BodyExt;
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const HEADER: &str = "state,year,rape_cases,kidnap_assault,dowry_deaths,assault_on_women,assault_on_modesty,domestic_violence,women_trafficking";

fn record(region: &str, year: i32, rape: u64, dowry: u64) -> YearlyRecord {
    YearlyRecord {
        region: region.to_string(),
        year,
        counts: CategoryCounts::default()
            .with(Category::Rape, rape)
            .with(Category::Dowry, dowry),
    }
}

fn square(name: &str, x: f64) -> Boundary {
    let poly = polygon![
        (x: x, y: 0.0),
        (x: x + 1.0, y: 0.0),
        (x: x + 1.0, y: 1.0),
        (x: x, y: 1.0),
        (x: x, y: 0.0),
    ];
    Boundary {
        name: name.to_string(),
        geometry: MultiPolygon::new(vec![poly]),
    }
}

fn state_with(records: Vec<YearlyRecord>, data_csv: PathBuf) -> Arc<AppState> {
    Arc::new(AppState {
        store: Store::with_records(records),
        names: CanonicalNameMap::builtin(),
        scale: ColorScale::default(),
        layer: Some(RegionLayer::new(vec![square("Orissa", 0.0), square("Ladakh", 2.0)])),
        viewport: Mutex::new(ViewportController::default()),
        data_csv,
    })
}

fn test_state() -> Arc<AppState> {
    state_with(
        vec![
            record("Kerala", 2001, 10, 0),
            record("Odisha", 2002, 20, 10),
            record("Odisha", 2001, 0, 0),
            record("Goa", 2001, 20, 0),
        ],
        PathBuf::from("/nonexistent/crimes.csv"),
    )
}

async fn send(state: Arc<AppState>, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = router(state, None)
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn get(uri: &str) -> (StatusCode, Value) {
    send(test_state(), "GET", uri, None).await
}

#[tokio::test]
async fn crimes_are_ranked_with_breakdown() {
    let (status, json) = get("/api/crimes").await;
    assert_eq!(status, StatusCode::OK);

    let rows = json.as_array().unwrap();
    let order: Vec<(&str, u64)> = rows
        .iter()
        .map(|r| (r["state"].as_str().unwrap(), r["rank"].as_u64().unwrap()))
        .collect();
    assert_eq!(order, vec![("Odisha", 1), ("Goa", 2), ("Kerala", 3)]);

    let odisha = &rows[0];
    assert_eq!(odisha["total_crimes"], 30);
    assert_eq!(odisha["rape_cases"], 20);
    assert_eq!(odisha["crimeBreakdown"]["rape"], 66.7);
    assert_eq!(odisha["crimeBreakdown"]["dowry"], 33.3);
    assert_eq!(odisha["crimeBreakdown"]["trafficking"], 0.0);
}

#[tokio::test]
async fn crimes_can_be_sorted_by_name() {
    let (status, json) = get("/api/crimes?sort=state&dir=asc").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["state"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Goa", "Kerala", "Odisha"]);
}

#[tokio::test]
async fn bad_sort_key_is_rejected() {
    let (status, json) = get("/api/crimes?sort=population").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid sort");
}

#[tokio::test]
async fn region_history_is_year_ascending() {
    let (status, json) = get("/api/crimes/Odisha").await;
    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows[0]["year"], 2001);
    assert_eq!(rows[0]["total_crimes"], 0);
    assert_eq!(rows[1]["year"], 2002);
    assert_eq!(rows[1]["total_crimes"], 30);
}

#[tokio::test]
async fn region_history_accepts_display_names_and_case() {
    let (status, json) = get("/api/crimes/Orissa").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (status, _) = get("/api/crimes/odisha").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_region_is_404() {
    let (status, json) = get("/api/crimes/Atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Region not found");
}

#[tokio::test]
async fn overall_stats_report_bounds() {
    let (status, json) = get("/api/crimes/stats/overall").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_rape_cases"], 50);
    assert_eq!(json["total_dowry_deaths"], 10);
    assert_eq!(json["total_states"], 3);
    assert_eq!(json["start_year"], 2001);
    assert_eq!(json["end_year"], 2002);
}

#[tokio::test]
async fn overall_stats_without_data_is_unavailable() {
    let state = state_with(Vec::new(), PathBuf::from("/nonexistent/crimes.csv"));
    let (status, json) = send(state, "GET", "/api/crimes/stats/overall", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], "Data unavailable");
}

#[tokio::test]
async fn table_defaults_to_newest_first_and_toggles() {
    let (_, json) = get("/api/table/Odisha").await;
    assert_eq!(json["sort"]["key"], "year");
    assert_eq!(json["sort"]["direction"], "desc");
    assert_eq!(json["rows"][0]["year"], 2002);

    let (_, json) = get("/api/table/Odisha?toggle=year").await;
    assert_eq!(json["sort"]["direction"], "asc");
    assert_eq!(json["rows"][0]["year"], 2001);

    let (_, json) = get("/api/table/Odisha?sort=year&dir=asc&toggle=total_crimes").await;
    assert_eq!(json["sort"]["key"], "total_crimes");
    assert_eq!(json["sort"]["direction"], "asc");
    assert_eq!(json["rows"][0]["total_crimes"], 0);
}

#[tokio::test]
async fn resolve_maps_variants() {
    let (_, json) = get("/api/resolve/Orissa").await;
    assert_eq!(json["canonical"], "Odisha");
    let (_, json) = get("/api/resolve/Delhi").await;
    assert_eq!(json["canonical"], "Delhi");
}

#[tokio::test]
async fn map_features_use_scale_and_no_data() {
    let (status, json) = get("/api/map/features").await;
    assert_eq!(status, StatusCode::OK);
    let features = json.as_array().unwrap();
    assert_eq!(features[0]["name"], "Orissa");
    assert_eq!(features[0]["canonical"], "Odisha");
    assert_eq!(features[0]["fill"], "#ff5233");
    assert_eq!(features[1]["fill"], "#eeeeee");
    assert_eq!(features[1]["total"], Value::Null);
}

#[tokio::test]
async fn hover_returns_summary_or_null() {
    let (_, json) = get("/api/map/hover?lat=0.5&lon=0.5").await;
    assert_eq!(json["canonical"], "Odisha");
    assert_eq!(json["crimeData"]["total_crimes"], 30);

    let (_, json) = get("/api/map/hover?lat=0.5&lon=2.5").await;
    assert_eq!(json["name"], "Ladakh");
    assert_eq!(json["crimeData"], Value::Null);

    let (_, json) = get("/api/map/hover?lat=50.0&lon=50.0").await;
    assert_eq!(json, Value::Null);
}

#[tokio::test]
async fn viewport_transitions_are_bounded() {
    let state = test_state();
    for _ in 0..30 {
        send(state.clone(), "POST", "/api/viewport/zoom-in", None).await;
    }
    let (_, json) = send(state.clone(), "GET", "/api/viewport", None).await;
    assert_eq!(json["zoom"], 8.0);

    let body = serde_json::json!({ "center": [72.8, 19.0] });
    let (_, json) = send(state.clone(), "POST", "/api/viewport/move", Some(body)).await;
    assert_eq!(json["center"][0], 72.8);
    assert_eq!(json["zoom"], 8.0);

    for _ in 0..30 {
        send(state.clone(), "POST", "/api/viewport/zoom-out", None).await;
    }
    let (_, json) = send(state, "GET", "/api/viewport", None).await;
    assert_eq!(json["zoom"], 0.8);
}

#[tokio::test]
async fn reload_replaces_dataset() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    writeln!(file, "Uttaranchal,2005,7,0,0,0,0,0,0").unwrap();

    let state = state_with(vec![record("Kerala", 2001, 1, 0)], file.path().to_path_buf());
    let (status, json) = send(state.clone(), "POST", "/api/reload", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["installed"], true);
    assert_eq!(json["records"], 1);

    let (_, json) = send(state, "GET", "/api/crimes", None).await;
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["state"], "Uttarakhand");
}

#[tokio::test]
async fn failed_reload_keeps_previous_data() {
    let state = test_state();
    let (status, _) = send(state.clone(), "POST", "/api/reload", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (_, json) = send(state, "GET", "/api/crimes", None).await;
    assert_eq!(json.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn malformed_query_is_a_json_error() {
    let (status, json) = get("/api/map/hover?lat=abc&lon=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid request");
    assert!(json["details"].as_str().unwrap().contains("lat"));
}

#[tokio::test]
async fn malformed_body_is_a_json_error() {
    let body = serde_json::json!({ "center": 1 });
    let (status, json) = send(test_state(), "POST", "/api/viewport/move", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "Invalid request");
}

#[tokio::test]
async fn move_keeps_viewport_after_bad_body() {
    let state = test_state();
    let body = serde_json::json!({ "center": "x" });
    send(state.clone(), "POST", "/api/viewport/move", Some(body)).await;
    let (_, json) = send(state, "GET", "/api/viewport", None).await;
    assert_eq!(json["zoom"], 1.0);
    assert_eq!(json["center"][0], 78.9629);
}
