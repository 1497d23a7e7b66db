use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use pyramid::{
    config::{AppConfig, BrokerConfig, BrokerCredentials},
    AlpacaClient, Direction, OrderDispatcher, OrderRequest,
};
use serde_json::{json, Value};
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

#[derive(Debug, Clone)]
struct Captured {
    account: String,
    key_id: Option<String>,
    secret_key: Option<String>,
    body: Value,
}

type CaptureLog = Arc<Mutex<Vec<Captured>>>;

async fn fake_orders(
    State(log): State<CaptureLog>,
    Path(account): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    log.lock().unwrap().push(Captured {
        account: account.clone(),
        key_id: header("APCA-API-KEY-ID"),
        secret_key: header("APCA-API-SECRET-KEY"),
        body: body.clone(),
    });

    if body["symbol"] == "HALT" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"code": 42210000, "message": "asset HALT is not tradable"})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "id": format!("{}-order", account),
            "symbol": body["symbol"],
            "qty": body["qty"].to_string(),
            "status": "accepted"
        })),
    )
}

async fn start_fake_broker() -> (SocketAddr, CaptureLog) {
    let log: CaptureLog = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/:account/v2/orders", post(fake_orders))
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind fake broker");
    let addr = listener.local_addr().expect("fake broker has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake broker crashed");
    });

    (addr, log)
}

fn broker_config(addr: SocketAddr) -> BrokerConfig {
    let mut config = AppConfig::dry_run_config("unused.json").broker;
    config.dry_run = false;
    config.buy = BrokerCredentials {
        key_id: "buy-key".to_string(),
        secret_key: "buy-secret".to_string(),
        endpoint: format!("http://{}/buyer/v2/orders", addr),
    };
    config.sell = BrokerCredentials {
        key_id: "sell-key".to_string(),
        secret_key: "sell-secret".to_string(),
        endpoint: format!("http://{}/seller/v2/orders", addr),
    };
    config
}

#[tokio::test]
async fn orders_route_to_the_account_for_their_side() {
    let (addr, log) = start_fake_broker().await;
    let client = AlpacaClient::new(broker_config(addr)).unwrap();

    let buy = client
        .dispatch(&OrderRequest::market("SPY", 4, Direction::Buy))
        .await
        .unwrap();
    assert!(buy.is_success());
    assert_eq!(buy.body["id"], "buyer-order");

    let sell = client
        .dispatch(&OrderRequest::market("SPY", 2, Direction::Sell))
        .await
        .unwrap();
    assert_eq!(sell.status, 200);
    assert_eq!(sell.body["id"], "seller-order");

    let captured = log.lock().unwrap().clone();
    assert_eq!(captured.len(), 2);

    assert_eq!(captured[0].account, "buyer");
    assert_eq!(captured[0].key_id.as_deref(), Some("buy-key"));
    assert_eq!(captured[0].secret_key.as_deref(), Some("buy-secret"));
    assert_eq!(
        captured[0].body,
        json!({
            "symbol": "SPY",
            "qty": 4,
            "side": "buy",
            "type": "market",
            "time_in_force": "gtc"
        })
    );

    assert_eq!(captured[1].account, "seller");
    assert_eq!(captured[1].key_id.as_deref(), Some("sell-key"));
    assert_eq!(captured[1].body["side"], "sell");
    assert_eq!(captured[1].body["qty"], 2);
}

#[tokio::test]
async fn broker_rejection_is_a_response_not_an_error() {
    let (addr, _log) = start_fake_broker().await;
    let client = AlpacaClient::new(broker_config(addr)).unwrap();

    let resp = client
        .dispatch(&OrderRequest::market("HALT", 1, Direction::Buy))
        .await
        .unwrap();
    assert_eq!(resp.status, 422);
    assert!(!resp.is_success());
    assert_eq!(resp.body["message"], "asset HALT is not tradable");
}

#[tokio::test]
async fn dry_run_skips_the_broker() {
    let (addr, log) = start_fake_broker().await;
    let mut config = broker_config(addr);
    config.dry_run = true;
    let client = AlpacaClient::new(config).unwrap();
    assert!(client.is_dry_run());

    let resp = client
        .dispatch(&OrderRequest::market("SPY", 9, Direction::Sell))
        .await
        .unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["order"]["side"], "sell");
    assert!(log.lock().unwrap().is_empty());
}
