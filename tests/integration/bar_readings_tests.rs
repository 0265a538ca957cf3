//! Bar readings tests for meters and groups

use rstest::rstest;
use serde_json::Value;

use crate::common::{
    approx_eq, assert_series_eq, interval, load_expected_csv, prepare_test, TestApp,
};

fn bar_uri(kind: &str, ids: &str, time_interval: &str, width: &str, graphic_unit_id: i64) -> String {
    format!(
        "/api/unitReadings/bar/{}/{}?timeInterval={}&barWidthDays={}&graphicUnitId={}",
        kind, ids, time_interval, width, graphic_unit_id
    )
}

#[tokio::test]
async fn test_meter_weekly_bars() {
    let app = TestApp::new().await;
    let fixture = prepare_test(&app).await;
    let id = fixture.electric_meter.id;

    let response = app
        .get(&bar_uri("meters", &id.to_string(), "all", "7", fixture.kwh.id))
        .await;
    response.assert_ok();

    let body: Value = response.json();
    assert_series_eq(
        &body[id.to_string()],
        &load_expected_csv("expected_bar_meter_7d_kwh.csv"),
    );
}

#[tokio::test]
async fn test_bars_scale_with_slope() {
    let app = TestApp::new().await;
    let fixture = prepare_test(&app).await;
    let id = fixture.electric_meter.id;

    let kwh: Value = app
        .get(&bar_uri("meters", &id.to_string(), "all", "7", fixture.kwh.id))
        .await
        .json();
    let mj: Value = app
        .get(&bar_uri("meters", &id.to_string(), "all", "7", fixture.mj.id))
        .await
        .json();

    let kwh = kwh[id.to_string()].as_array().unwrap().clone();
    let mj = mj[id.to_string()].as_array().unwrap().clone();
    assert_eq!(kwh.len(), mj.len());
    for (k, m) in kwh.iter().zip(&mj) {
        assert!(approx_eq(
            m["reading"].as_f64().unwrap(),
            k["reading"].as_f64().unwrap() * 3.6
        ));
        assert_eq!(k["startTimestamp"], m["startTimestamp"]);
    }
}

#[rstest]
#[case("1", 5)]
#[case("2", 2)]
#[case("3", 1)]
#[tokio::test]
async fn test_bar_count_drops_partial_leading_bar(#[case] width: &str, #[case] expected: usize) {
    let app = TestApp::new().await;
    let fixture = prepare_test(&app).await;
    let id = fixture.electric_meter.id;

    // Five whole days after rounding inward
    let body: Value = app
        .get(&bar_uri(
            "meters",
            &id.to_string(),
            &interval("2022-01-01T06:00:00", "2022-01-07T23:00:00"),
            width,
            fixture.kwh.id,
        ))
        .await
        .json();

    let bars = body[id.to_string()].as_array().unwrap();
    assert_eq!(bars.len(), expected);
    // The last bar ends at the last whole day
    let last_end = bars.last().unwrap()["endTimestamp"].as_i64().unwrap();
    assert_eq!(last_end, 1_641_513_600_000);
}

#[tokio::test]
async fn test_interval_shorter_than_bar_has_no_bars() {
    let app = TestApp::new().await;
    let fixture = prepare_test(&app).await;
    let id = fixture.electric_meter.id;

    let body: Value = app
        .get(&bar_uri(
            "meters",
            &id.to_string(),
            &interval("2022-01-01T00:00:00", "2022-01-05T00:00:00"),
            "7",
            fixture.kwh.id,
        ))
        .await
        .json();
    assert_eq!(body[id.to_string()], serde_json::json!([]));
}

#[tokio::test]
async fn test_bars_need_quantity_meter() {
    let app = TestApp::new().await;
    let fixture = prepare_test(&app).await;
    let id = fixture.temperature_meter.id;

    let body: Value = app
        .get(&bar_uri("meters", &id.to_string(), "all", "1", fixture.celsius.id))
        .await
        .json();
    assert_eq!(body[id.to_string()], serde_json::json!([]));
}

#[rstest]
#[case("0")]
#[case("-1")]
#[case("week")]
#[tokio::test]
async fn test_bad_bar_width_is_rejected(#[case] width: &str) {
    let app = TestApp::new().await;
    let fixture = prepare_test(&app).await;

    app.get(&bar_uri(
        "meters",
        &fixture.electric_meter.id.to_string(),
        "all",
        width,
        fixture.kwh.id,
    ))
    .await
    .assert_bad_request();
}

#[tokio::test]
async fn test_group_weekly_bars() {
    let app = TestApp::new().await;
    let fixture = prepare_test(&app).await;
    let id = fixture.electric_group.id;

    let response = app
        .get(&bar_uri("groups", &id.to_string(), "all", "7", fixture.kwh.id))
        .await;
    response.assert_ok();

    let body: Value = response.json();
    assert_series_eq(
        &body[id.to_string()],
        &load_expected_csv("expected_bar_group_7d_kwh.csv"),
    );
}

#[tokio::test]
async fn test_group_bars_equal_sum_of_member_bars() {
    let app = TestApp::new().await;
    let fixture = prepare_test(&app).await;
    let group = fixture.electric_group.id;
    let meters = format!("{},{}", fixture.electric_meter.id, fixture.second_meter.id);
    let window = interval("2022-02-01T00:00:00", "2022-02-15T00:00:00");

    let group_body: Value = app
        .get(&bar_uri("groups", &group.to_string(), &window, "2", fixture.kwh.id))
        .await
        .json();
    let meter_body: Value = app
        .get(&bar_uri("meters", &meters, &window, "2", fixture.kwh.id))
        .await
        .json();

    let group_bars = group_body[group.to_string()].as_array().unwrap();
    let electric = meter_body[fixture.electric_meter.id.to_string()].as_array().unwrap();
    let second = meter_body[fixture.second_meter.id.to_string()].as_array().unwrap();
    assert_eq!(group_bars.len(), 7);
    for ((g, e), s) in group_bars.iter().zip(electric).zip(second) {
        let sum = e["reading"].as_f64().unwrap() + s["reading"].as_f64().unwrap();
        assert!(approx_eq(g["reading"].as_f64().unwrap(), sum));
    }
}

#[tokio::test]
async fn test_group_with_incompatible_meter_has_no_bars() {
    let app = TestApp::new().await;
    let fixture = prepare_test(&app).await;
    let id = fixture.mixed_group.id;

    let body: Value = app
        .get(&bar_uri("groups", &id.to_string(), "all", "7", fixture.kwh.id))
        .await
        .json();
    assert_eq!(body[id.to_string()], serde_json::json!([]));
}
