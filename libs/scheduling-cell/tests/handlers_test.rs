use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scheduling_cell::router::appointment_routes;
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

const APPOINTMENTS: &str = "/rest/v1/appointments";

fn create_test_app(mock_server: &MockServer) -> Router {
    appointment_routes(TestConfig::for_mock_server(&mock_server.uri()).to_arc())
}

fn json_request(http_method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(http_method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn post_books_an_appointment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(APPOINTMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(APPOINTMENTS))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::appointment_row(
                "t1", "APPT23XY", "u1", "d1",
                "2025-11-11T14:00:00Z", "2025-11-11T14:30:00Z", "scheduled",
            )
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(json_request(
            "POST",
            "/",
            json!({
                "tenantId": "t1",
                "userId": "u1",
                "patientName": "Maria Gomez",
                "doctorId": "d1",
                "startIso": "2025-11-11T14:00:00Z"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["appointment"]["appointmentId"], json!("APPT23XY"));
    // The store-internal key columns never leak through the projection.
    assert!(body["appointment"].get("startKey").is_none());
}

#[tokio::test]
async fn post_with_conflicting_slot_is_bad_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(APPOINTMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                "t1", "BUSY2345", "u2", "d1",
                "2025-11-11T14:00:00Z", "2025-11-11T14:30:00Z", "scheduled",
            )
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(json_request(
            "POST",
            "/",
            json!({
                "tenantId": "t1",
                "userId": "u1",
                "patientName": "Maria Gomez",
                "doctorId": "d1",
                "startIso": "2025-11-11T14:15:00Z"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_with_unparsable_start_is_bad_request() {
    let mock_server = MockServer::start().await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(json_request(
            "POST",
            "/",
            json!({
                "tenantId": "t1",
                "userId": "u1",
                "patientName": "Maria Gomez",
                "doctorId": "d1",
                "startIso": "next tuesday"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn patch_without_id_or_full_natural_key_is_bad_request() {
    let mock_server = MockServer::start().await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(json_request(
            "PATCH",
            "/",
            json!({
                "tenantId": "t1",
                "userId": "u1",
                "newStartIso": "2025-11-12T09:00:00Z"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patch_with_path_id_reschedules() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(APPOINTMENTS))
        .and(query_param("appointment_id", "eq.APPT23XY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                "t1", "APPT23XY", "u1", "d1",
                "2025-11-11T14:00:00Z", "2025-11-11T14:30:00Z", "scheduled",
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(APPOINTMENTS))
        .and(query_param("doctor_key", "eq.t1#DOCTOR#d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(APPOINTMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                "t1", "APPT23XY", "u1", "d1",
                "2025-11-12T09:00:00Z", "2025-11-12T09:30:00Z", "scheduled",
            )
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(json_request(
            "PATCH",
            "/APPT23XY",
            json!({
                "tenantId": "t1",
                "newStartIso": "2025-11-12T09:00:00Z"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["appointment"]["startIso"], json!("2025-11-12T09:00:00Z"));
}

#[tokio::test]
async fn delete_unknown_appointment_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(APPOINTMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(json_request(
            "DELETE",
            "/MISSING2",
            json!({ "tenantId": "t1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_by_natural_key_cancels() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(APPOINTMENTS))
        .and(query_param("user_key", "eq.t1#USER#u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                "t1", "APPT23XY", "u1", "d1",
                "2025-11-11T14:00:00Z", "2025-11-11T14:30:00Z", "scheduled",
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(APPOINTMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                "t1", "APPT23XY", "u1", "d1",
                "2025-11-11T14:00:00Z", "2025-11-11T14:30:00Z", "cancelled",
            )
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(json_request(
            "DELETE",
            "/",
            json!({
                "tenantId": "t1",
                "userId": "u1",
                "doctorId": "d1",
                "startIso": "2025-11-11T14:00:00Z"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["appointment"]["status"], json!("cancelled"));
}

#[tokio::test]
async fn availability_returns_busy_intervals_for_the_day() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(APPOINTMENTS))
        .and(query_param("doctor_key", "eq.t1#DOCTOR#d1"))
        .and(query_param("start_key", "gte.START#20251111#0000"))
        .and(query_param("start_key", "lte.START#20251111#2359"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                "t1", "KEEP2345", "u1", "d1",
                "2025-11-11T09:00:00Z", "2025-11-11T09:30:00Z", "scheduled",
            ),
            MockStoreResponses::appointment_row(
                "t1", "SKIP2345", "u2", "d1",
                "2025-11-11T10:00:00Z", "2025-11-11T10:30:00Z", "cancelled",
            ),
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/availability?tenantId=t1&doctorId=d1&date=2025-11-11")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let busy = body["busy"].as_array().unwrap();
    assert_eq!(busy.len(), 1);
    assert_eq!(busy[0]["appointmentId"], json!("KEEP2345"));
    assert_eq!(busy[0]["startIso"], json!("2025-11-11T09:00:00Z"));
    assert_eq!(busy[0]["endIso"], json!("2025-11-11T09:30:00Z"));
}

#[tokio::test]
async fn availability_range_form_lists_user_appointments() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(APPOINTMENTS))
        .and(query_param("user_key", "eq.t1#USER#u1"))
        .and(query_param("start_key", "gte.START#20251110#0000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                "t1", "APPT23XY", "u1", "d1",
                "2025-11-11T14:00:00Z", "2025-11-11T14:30:00Z", "scheduled",
            )
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/availability?tenantId=t1&userId=u1&from=2025-11-10T00:00:00Z&to=2025-11-17T00:00:00Z")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let appointments = body["appointments"].as_array().unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0]["appointmentId"], json!("APPT23XY"));
}

#[tokio::test]
async fn availability_without_subject_is_bad_request() {
    let mock_server = MockServer::start().await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/availability?tenantId=t1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn availability_with_inverted_range_is_bad_request() {
    let mock_server = MockServer::start().await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/availability?tenantId=t1&doctorId=d1&from=2025-11-17T00:00:00Z&to=2025-11-10T00:00:00Z")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
