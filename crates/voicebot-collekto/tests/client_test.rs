//! Integration tests for the live Collekto client against a local stub
//! backend, and for mock-mode isolation.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use voicebot_collekto::{
    encrypt_password, from_config, CollektoClient, CollektoConfig, CollektoError, SourceKind,
    DEFAULT_ENCRYPTION_KEY,
};

const TOKEN: &str = "fake-token-123";

#[derive(Clone, Default)]
struct StubState {
    hits: Arc<AtomicUsize>,
    auth_status: Option<StatusCode>,
    auth_body: Option<Value>,
    loan_status: Option<StatusCode>,
}

async fn authenticate(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = state.auth_status {
        return (status, Json(json!({ "message": "Unauthorized" })));
    }
    let expected = encrypt_password("s3cret", DEFAULT_ENCRYPTION_KEY).unwrap();
    if body["username"] != "agent@example.com" || body["password"] != expected.as_str() {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    let reply = state.auth_body.clone().unwrap_or_else(|| {
        json!({ "data": { "authenticationResult": { "bdInfoGHKey_1000": TOKEN } } })
    });
    (StatusCode::OK, Json(reply))
}

async fn loan(State(state): State<StubState>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = state.loan_status {
        return (status, Json(json!({ "error": "boom" })));
    }
    assert_eq!(headers["authorization"], format!("Bearer {}", TOKEN).as_str());
    let id = headers["id"].to_str().unwrap().to_string();
    (
        StatusCode::OK,
        Json(json!({
            "data": {
                "_id": id,
                "Debtor_Name": "Harish Kumar",
                "Gender": "Male",
                "EMI_Amount": 5175,
                "DPD": 2
            }
        })),
    )
}

async fn disposition(
    State(state): State<StubState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    assert_eq!(headers["authorization"], format!("Bearer {}", TOKEN).as_str());
    let loan_id = headers["loanid"].to_str().unwrap().to_string();
    (
        StatusCode::OK,
        Json(json!({ "caseId": loan_id, "status": "Open" })),
    )
}

async fn start_stub(state: StubState) -> SocketAddr {
    let app = Router::new()
        .route("/api/v2/profile/authenticate", post(authenticate))
        .route("/crm/api/v1/loans/id", get(loan))
        .route("/api/v1/call-disposition/caseHistory", get(disposition))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> CollektoClient {
    CollektoClient::new(CollektoConfig::new(
        format!("http://{}", addr),
        "agent@example.com",
        "s3cret",
    ))
    .unwrap()
}

#[tokio::test]
async fn test_fetch_customer_full_flow() {
    let state = StubState::default();
    let addr = start_stub(state.clone()).await;
    let client = client_for(addr);

    let record = client
        .fetch_customer("C02504204479230106", "68240b1240ee32c9049c41b7")
        .await
        .expect("fetch should succeed");

    // Loan is looked up by system id, case history by loan number.
    assert_eq!(record.get("_id"), Some(&json!("68240b1240ee32c9049c41b7")));
    assert_eq!(record.debtor_name(), Some("Harish Kumar"));
    assert_eq!(record.dpd(), Some(2));
    assert_eq!(
        record.get("disposition"),
        Some(&json!({ "caseId": "C02504204479230106", "status": "Open" }))
    );
    assert_eq!(state.hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_authenticate_http_error() {
    let state = StubState {
        auth_status: Some(StatusCode::UNAUTHORIZED),
        ..StubState::default()
    };
    let addr = start_stub(state).await;
    let client = client_for(addr);

    let result = client.authenticate("agent@example.com", "s3cret").await;
    match result {
        Err(CollektoError::Authentication(msg)) => assert!(msg.contains("401"), "got: {}", msg),
        other => panic!("expected Authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_authenticate_malformed_response() {
    let state = StubState {
        auth_body: Some(json!({ "data": { "authenticationResult": {} } })),
        ..StubState::default()
    };
    let addr = start_stub(state).await;
    let client = client_for(addr);

    let result = client.authenticate("agent@example.com", "s3cret").await;
    match result {
        Err(CollektoError::Authentication(msg)) => assert!(msg.contains("malformed")),
        other => panic!("expected Authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_loan_http_error_maps_to_api_error() {
    let state = StubState {
        loan_status: Some(StatusCode::INTERNAL_SERVER_ERROR),
        ..StubState::default()
    };
    let addr = start_stub(state).await;
    let client = client_for(addr);

    let result = client.get_loan_by_id(TOKEN, "L-1").await;
    match result {
        Err(CollektoError::Api(msg)) => assert!(msg.contains("failed to fetch loan L-1")),
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // Bind then drop to get a port with nothing listening.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let client = client_for(addr);

    let result = client.authenticate("agent@example.com", "s3cret").await;
    assert!(matches!(result, Err(CollektoError::Network(_))), "got {:?}", result);
}

#[tokio::test]
async fn test_mock_mode_never_contacts_backend() {
    let state = StubState::default();
    let addr = start_stub(state.clone()).await;

    let config = CollektoConfig {
        mock: true,
        ..CollektoConfig::new(format!("http://{}", addr), "agent@example.com", "s3cret")
    };
    let source = from_config(&config).unwrap();
    assert_eq!(source.kind(), SourceKind::Mock);

    let record = source
        .fetch_customer("C02504204479230106", "68240b1240ee32c9049c41b7")
        .await
        .unwrap();
    assert_eq!(record.debtor_name(), Some("Harish Kumar"));

    let missing = source.fetch_customer("nope", "nope").await.unwrap();
    assert!(missing.is_empty());

    assert_eq!(state.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_mock_mode_reads_configured_csv() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    use std::io::Write;
    writeln!(file, "Loan_ID,system_id,Debtor_Name,Gender,EMI_Amount,DPD").unwrap();
    writeln!(file, "L-9,S-9,Meera Iyer,Female,2100,0").unwrap();

    let config = CollektoConfig {
        mock: true,
        mock_data_path: Some(file.path().to_path_buf()),
        ..CollektoConfig::default()
    };
    let source = from_config(&config).unwrap();

    let record = source.fetch_customer("L-9", "S-9").await.unwrap();
    assert_eq!(record.debtor_name(), Some("Meera Iyer"));
    assert_eq!(record.dpd(), Some(0));
}

#[tokio::test]
async fn test_mock_mode_missing_csv_is_error() {
    let config = CollektoConfig {
        mock: true,
        mock_data_path: Some("/definitely/not/here.csv".into()),
        ..CollektoConfig::default()
    };
    assert!(matches!(from_config(&config), Err(CollektoError::MockData(_))));
}
