use std::time::Duration;

use puca_core::category::Category;
use puca_core::clients::{HttpUpstream, UpstreamConfig};
use puca_core::geo::compute_bounding_box;
use puca_core::query::build_query;
use puca_core::retry::RetryPolicy;
use puca_core::services::{Geocoder, RouteService, SpatialStore, UpstreamError};
use puca_models::Coordinates;
use serde_json::json;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn upstream_for(server: &MockServer) -> HttpUpstream {
    let base = server.uri();
    HttpUpstream::new(UpstreamConfig {
        nominatim_url: base.clone(),
        osrm_url: format!("{base}/route/v1/driving"),
        overpass_url: format!("{base}/api/interpreter"),
        request_timeout: Duration::from_secs(5),
        retry: RetryPolicy::new(3)
            .with_backoff(Duration::from_millis(1), Duration::from_millis(5)),
        ..UpstreamConfig::default()
    })
    .expect("client should build")
}

#[tokio::test]
async fn forward_geocode_reads_first_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Hill Street, Newry"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "lat": "54.1762", "lon": "-6.3385", "display_name": "Hill Street, Newry" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let coords = upstream_for(&server)
        .geocode_forward("Hill Street, Newry")
        .await
        .expect("request should succeed")
        .expect("address should match");

    assert!((coords.latitude - 54.1762).abs() < 1e-9);
    assert!((coords.longitude - -6.3385).abs() < 1e-9);
}

#[tokio::test]
async fn reverse_geocode_without_match_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("extratags", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": "Unable to geocode" })),
        )
        .mount(&server)
        .await;

    let address = upstream_for(&server)
        .geocode_reverse(Coordinates::new(0.0, 0.0))
        .await
        .expect("request should succeed");
    assert!(address.is_none());
}

#[tokio::test]
async fn route_distance_uses_lon_lat_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/route/v1/driving/-6\.34,54\.17;-6\.3,54\.2$"))
        .and(query_param("overview", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "Ok",
            "routes": [{ "distance": 4021.7, "duration": 380.2 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let metres = upstream_for(&server)
        .route_distance(Coordinates::new(54.17, -6.34), Coordinates::new(54.2, -6.3))
        .await
        .expect("request should succeed");
    assert_eq!(metres, Some(4021.7));
}

#[tokio::test]
async fn spatial_query_is_sent_as_data_parameter() {
    let server = MockServer::start().await;
    let bbox = compute_bounding_box(Coordinates::new(54.17, -6.34), 200.0)
        .expect("box should compute");
    let query = build_query(&Category::Museum.filter(), &bbox);

    Mock::given(method("GET"))
        .and(path("/api/interpreter"))
        .and(query_param("data", query.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [
                { "type": "node", "id": 5, "lat": 54.171, "lon": -6.341,
                  "tags": { "tourism": "museum", "name": "Bagenal's Castle" } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let features = upstream_for(&server)
        .execute(&query)
        .await
        .expect("query should succeed");
    assert_eq!(features.len(), 1);
    assert_eq!(features.nodes[0].tags.get("name"), Some("Bagenal's Castle"));
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/interpreter"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/interpreter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "elements": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let features = upstream_for(&server)
        .execute(&build_query(
            &Category::Hotel.filter(),
            &compute_bounding_box(Coordinates::new(54.0, -6.0), 100.0).expect("box"),
        ))
        .await
        .expect("third attempt should succeed");
    assert!(features.is_empty());
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/interpreter"))
        .respond_with(ResponseTemplate::new(400).set_body_string("parse error"))
        .expect(1)
        .mount(&server)
        .await;

    let err = upstream_for(&server)
        .execute(&build_query(
            &Category::Hotel.filter(),
            &compute_bounding_box(Coordinates::new(54.0, -6.0), 100.0).expect("box"),
        ))
        .await
        .expect_err("bad request should fail");
    assert!(matches!(err, UpstreamError::Status { status: 400, .. }));
}

#[tokio::test]
async fn html_error_pages_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/interpreter"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>too busy</html>"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/interpreter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "elements": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let features = upstream_for(&server)
        .execute(&build_query(
            &Category::Hotel.filter(),
            &compute_bounding_box(Coordinates::new(54.0, -6.0), 100.0).expect("box"),
        ))
        .await
        .expect("second attempt should succeed");
    assert!(features.is_empty());
}

#[tokio::test]
async fn persistent_html_bodies_are_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/interpreter"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>too busy</html>"))
        .expect(3)
        .mount(&server)
        .await;

    let err = upstream_for(&server)
        .execute(&build_query(
            &Category::Hotel.filter(),
            &compute_bounding_box(Coordinates::new(54.0, -6.0), 100.0).expect("box"),
        ))
        .await
        .expect_err("html body should fail");
    assert!(matches!(err, UpstreamError::Malformed { .. }));
}
