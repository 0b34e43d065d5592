use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use fleet_maintenance::{
    build_router,
    config::EnvironmentConfig,
    models::session::{SessionContext, UserRole},
    repositories::MemoryFleetStore,
    state::AppState,
    utils::{
        clock::FixedClock,
        jwt::{generate_token, JwtConfig},
    },
};

struct TestApp {
    router: Router,
    admin_token: String,
    staff_token: String,
}

fn create_test_app() -> TestApp {
    let config = EnvironmentConfig {
        environment: "test".to_string(),
        jwt_secret: "integration-secret".to_string(),
        ..EnvironmentConfig::default()
    };
    let jwt = JwtConfig::from(&config);

    let token_for = |name: &str, role: UserRole| {
        let session = SessionContext {
            user_id: Uuid::new_v4(),
            display_name: name.to_string(),
            role,
        };
        generate_token(&session, &jwt).unwrap()
    };
    let admin_token = token_for("Fleet Admin", UserRole::Admin);
    let staff_token = token_for("Dispatcher", UserRole::Staff);

    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 1, 0, 0).unwrap()));
    let (state, _audit_worker) = AppState::new(config, Arc::new(MemoryFleetStore::new()), clock);

    TestApp {
        router: build_router(state),
        admin_token,
        staff_token,
    }
}

async fn send(app: &TestApp, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Registra un conductor y un camión con él asignado
async fn seed_truck(app: &TestApp, plate: &str, odometer: i64, next_oil: i64) {
    let (status, driver) = send(
        app,
        "POST",
        "/api/drivers",
        Some(&app.admin_token),
        Some(json!({ "full_name": "Maria Santos", "license_number": format!("LIC-{}", plate) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", driver);

    let (status, truck) = send(
        app,
        "POST",
        "/api/trucks",
        Some(&app.staff_token),
        Some(json!({
            "plate_number": plate,
            "brand": "Isuzu",
            "driver_id": driver["data"]["id"],
            "current_odometer": odometer,
            "last_oil_change_odometer": (next_oil - 5000).min(odometer),
            "next_oil_change_odometer": next_oil,
            "oil_change_interval": 5000,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", truck);
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = create_test_app();
    let (status, body) = send(&app, "GET", "/api/trucks", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = send(&app, "GET", "/api/trucks", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_plate_is_a_validation_error() {
    let app = create_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/trucks",
        Some(&app.staff_token),
        Some(json!({ "plate_number": "!!", "oil_change_interval": 5000 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_deploy_and_return_flow() {
    let app = create_test_app();
    seed_truck(&app, "ABC-1234", 9000, 10000).await;

    let (status, body) = send(&app, "POST", "/api/trucks/abc-1234/deploy", Some(&app.staff_token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["truck"]["status"], "Deployed");
    // 01:00 UTC es 09:00 en la zona civil por defecto
    assert_eq!(body["data"]["deployment"]["deployed_at"], "2024-03-01T09:00:00+08:00");

    let (status, body) = send(
        &app,
        "POST",
        "/api/trucks/ABC-1234/return",
        Some(&app.staff_token),
        Some(json!({ "odometer": 9950 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["reconciled"], false);
    assert_eq!(body["data"]["truck"]["status"], "Available");
    assert_eq!(body["data"]["notification"]["outcome"], "recorded");
    assert_eq!(body["data"]["notification"]["value"]["severity"], "warning");

    let (status, body) = send(&app, "GET", "/api/trucks/ABC-1234/deployments", Some(&app.staff_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deployments"].as_array().map(Vec::len), Some(1));

    let (status, body) = send(&app, "GET", "/api/notifications?unread_only=true", Some(&app.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_odometer_rollback_is_rejected() {
    let app = create_test_app();
    seed_truck(&app, "ABC-1234", 1000, 6000).await;
    send(&app, "POST", "/api/trucks/ABC-1234/deploy", Some(&app.staff_token), None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/trucks/ABC-1234/return",
        Some(&app.staff_token),
        Some(json!({ "odometer": 900 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ODOMETER_ROLLBACK");
}

#[tokio::test]
async fn test_overdue_truck_cannot_deploy() {
    let app = create_test_app();
    seed_truck(&app, "ABC-1234", 12000, 11000).await;

    let (status, body) = send(&app, "POST", "/api/trucks/ABC-1234/deploy", Some(&app.staff_token), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "OIL_CHANGE_OVERDUE");
}

#[tokio::test]
async fn test_deploying_twice_is_a_conflict() {
    let app = create_test_app();
    seed_truck(&app, "ABC-1234", 1000, 6000).await;
    send(&app, "POST", "/api/trucks/ABC-1234/deploy", Some(&app.staff_token), None).await;

    let (status, body) = send(&app, "POST", "/api/trucks/ABC-1234/deploy", Some(&app.staff_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_maintenance_blocks_deploy_until_completed() {
    let app = create_test_app();
    seed_truck(&app, "ABC-1234", 12000, 11000).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/trucks/ABC-1234/maintenance/start",
        Some(&app.staff_token),
        Some(json!({ "kind": "oil_change" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "POST", "/api/trucks/ABC-1234/deploy", Some(&app.staff_token), None).await;
    assert_eq!(body["code"], "TRUCK_IN_MAINTENANCE");

    let (status, body) = send(&app, "POST", "/api/trucks/ABC-1234/maintenance/complete", Some(&app.staff_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["truck"]["next_oil_change_odometer"], "17000");

    let (status, _) = send(&app, "POST", "/api/trucks/ABC-1234/deploy", Some(&app.staff_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cancel_deployment_keeps_odometer() {
    let app = create_test_app();
    seed_truck(&app, "ABC-1234", 1000, 6000).await;
    send(&app, "POST", "/api/trucks/ABC-1234/deploy", Some(&app.staff_token), None).await;

    let (status, body) = send(&app, "POST", "/api/trucks/ABC-1234/cancel-deployment", Some(&app.staff_token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["truck"]["status"], "Available");
    assert_eq!(body["data"]["truck"]["current_odometer"], "1000");
    assert_eq!(body["data"]["voided"]["voided"], true);
}

#[tokio::test]
async fn test_admin_only_endpoints() {
    let app = create_test_app();
    seed_truck(&app, "ABC-1234", 1000, 6000).await;

    let (status, _) = send(&app, "GET", "/api/audit-logs", Some(&app.staff_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", "/api/trucks/ABC-1234", Some(&app.staff_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "DELETE", "/api/trucks/ABC-1234", Some(&app.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_archived"], true);

    let (status, _) = send(&app, "GET", "/api/audit-logs?limit=10", Some(&app.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_truck_is_not_found() {
    let app = create_test_app();
    let (status, body) = send(&app, "GET", "/api/trucks/NOPE-123", Some(&app.staff_token), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TRUCK_NOT_FOUND");
}
