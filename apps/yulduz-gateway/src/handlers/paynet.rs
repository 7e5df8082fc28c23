use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::ledger::Ledger;
use crate::rpc::{
    self, now_timestamp, RpcRequest, RpcResponse, AMOUNT_MISMATCH, DUPLICATE_TRANSACTION,
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, NOT_FOUND,
};
use crate::AppState;
use yulduz_db::models::{Order, ORDER_TYPE_STARS};
use yulduz_db::repositories::LedgerError;

pub async fn paynet_handler(
    State(state): State<AppState>,
    payload: Result<Json<RpcRequest>, JsonRejection>,
) -> Json<RpcResponse> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!("Rejected malformed provider request: {}", rejection);
            return Json(RpcResponse::err(
                Value::Null,
                INVALID_REQUEST,
                "Noto‘g‘ri so‘rov",
            ));
        }
    };
    Json(dispatch(state.ledger.as_ref(), req).await)
}

/// Routes one provider request to its method handler. Every failure mode
/// maps to an envelope or domain error; nothing escapes as a panic or a
/// non-JSON-RPC body.
pub async fn dispatch(ledger: &dyn Ledger, req: RpcRequest) -> RpcResponse {
    let id = req.id.clone();
    let method = req.method.as_deref().unwrap_or("").trim();
    if method.is_empty() {
        return RpcResponse::err(id, INVALID_REQUEST, "Metod ko‘rsatilmagan");
    }

    match method {
        "GetInformation" => get_information(ledger, id, req.params).await,
        "PerformTransaction" => perform_transaction(ledger, id, req.params).await,
        "CheckTransaction" => check_transaction(ledger, id, req.params).await,
        "GetStatement" => get_statement(ledger, id, req.params).await,
        _ => RpcResponse::err(id, METHOD_NOT_FOUND, "So‘ralgan metod topilmadi"),
    }
}

#[derive(Debug, Default, Deserialize)]
struct Fields {
    #[serde(default)]
    order_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct InformationParams {
    #[serde(default)]
    fields: Option<Fields>,
}

#[derive(Debug, Default, Deserialize)]
struct PerformParams {
    #[serde(default, rename = "transactionId")]
    transaction_id: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    fields: Option<Fields>,
}

#[derive(Debug, Default, Deserialize)]
struct CheckParams {
    #[serde(default, rename = "transactionId")]
    transaction_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatementParams {
    #[serde(default, rename = "dateFrom")]
    date_from: Option<String>,
    #[serde(default, rename = "dateTo")]
    date_to: Option<String>,
}

fn parse_params<T: for<'de> Deserialize<'de> + Default>(params: &Value) -> Option<T> {
    if params.is_null() {
        return Some(T::default());
    }
    serde_json::from_value(params.clone()).ok()
}

fn invalid_params(id: Value) -> RpcResponse {
    RpcResponse::err(id, INVALID_PARAMS, "Majburiy parametrlar yo‘q")
}

fn internal_error(id: Value) -> RpcResponse {
    RpcResponse::err(id, INTERNAL_ERROR, "Tizim xatosi")
}

fn order_kind(order: &Order) -> &'static str {
    if order.order_type == ORDER_TYPE_STARS {
        "Stars"
    } else {
        "Premium"
    }
}

/// Amounts cross the wire in minor units (tiyin); the ledger stores so'm.
fn to_minor_units(amount: i64) -> i64 {
    amount * 100
}

async fn get_information(ledger: &dyn Ledger, id: Value, params: Value) -> RpcResponse {
    let Some(order_id) = parse_params::<InformationParams>(&params)
        .and_then(|p| p.fields)
        .and_then(|f| f.order_id)
    else {
        return invalid_params(id);
    };

    let order = match ledger.find_by_order_id(&order_id).await {
        Ok(order) => order,
        Err(e) => {
            error!("GetInformation lookup failed for {}: {:#}", order_id, e);
            return internal_error(id);
        }
    };
    match order {
        None => RpcResponse::err(id, NOT_FOUND, "Buyurtma topilmadi"),
        Some(order) if order.paid => {
            RpcResponse::err(id, NOT_FOUND, "Buyurtma allaqachon to‘langan")
        }
        Some(order) => RpcResponse::ok(
            id,
            json!({
                "status": "0",
                "timestamp": now_timestamp(),
                "fields": {
                    "order_id": order.order_id,
                    "amount": to_minor_units(order.amount),
                    "type": order_kind(&order),
                },
            }),
        ),
    }
}

async fn perform_transaction(ledger: &dyn Ledger, id: Value, params: Value) -> RpcResponse {
    let Some(params) = parse_params::<PerformParams>(&params) else {
        return invalid_params(id);
    };
    let (Some(tx_id), Some(amount), Some(order_id)) = (
        params.transaction_id,
        params.amount,
        params.fields.and_then(|f| f.order_id),
    ) else {
        return invalid_params(id);
    };

    let order = match ledger.find_by_order_id(&order_id).await {
        Ok(Some(order)) => order,
        Ok(None) => return RpcResponse::err(id, NOT_FOUND, "Buyurtma topilmadi"),
        Err(e) => {
            error!("PerformTransaction lookup failed for {}: {:#}", order_id, e);
            return internal_error(id);
        }
    };
    if amount != to_minor_units(order.amount) {
        return RpcResponse::err(id, AMOUNT_MISMATCH, "To‘lov summasi noto‘g‘ri");
    }

    match ledger.attach_transaction(&order_id, &tx_id).await {
        Ok(order) => RpcResponse::ok(
            id,
            json!({
                "timestamp": now_timestamp(),
                "providerTrnId": order.id,
                "fields": {
                    "order_id": order.order_id,
                    "amount": amount,
                    "type": order_kind(&order),
                    "message": "To‘lov muvaffaqiyatli amalga oshirildi",
                },
            }),
        ),
        Err(LedgerError::DuplicateTransaction(_)) => {
            RpcResponse::err(id, DUPLICATE_TRANSACTION, "Bunday to‘lov mavjud")
        }
        Err(LedgerError::NotFound) => RpcResponse::err(id, NOT_FOUND, "Buyurtma topilmadi"),
        Err(LedgerError::NotPending(_)) => {
            RpcResponse::err(id, NOT_FOUND, "Buyurtma allaqachon to‘langan")
        }
        Err(LedgerError::Db(e)) => {
            error!("PerformTransaction failed for {}: {:#}", order_id, e);
            internal_error(id)
        }
    }
}

async fn check_transaction(ledger: &dyn Ledger, id: Value, params: Value) -> RpcResponse {
    let Some(tx_id) = parse_params::<CheckParams>(&params).and_then(|p| p.transaction_id) else {
        return invalid_params(id);
    };

    match ledger.find_by_transaction_id(&tx_id).await {
        Ok(Some(order)) => RpcResponse::ok(
            id,
            json!({
                "transactionState": if order.paid { 1 } else { 2 },
                "timestamp": now_timestamp(),
                "providerTrnId": order.id,
            }),
        ),
        Ok(None) => RpcResponse::err(id, NOT_FOUND, "Tranzaksiya topilmadi"),
        Err(e) => {
            error!("CheckTransaction lookup failed for {}: {:#}", tx_id, e);
            internal_error(id)
        }
    }
}

async fn get_statement(ledger: &dyn Ledger, id: Value, params: Value) -> RpcResponse {
    let Some(params) = parse_params::<StatementParams>(&params) else {
        return invalid_params(id);
    };
    let (Some(date_from), Some(date_to)) = (params.date_from, params.date_to) else {
        return invalid_params(id);
    };
    let (Ok(from), Ok(to)) = (
        NaiveDateTime::parse_from_str(&date_from, rpc::TIMESTAMP_FORMAT),
        NaiveDateTime::parse_from_str(&date_to, rpc::TIMESTAMP_FORMAT),
    ) else {
        return invalid_params(id);
    };

    let orders = match ledger.statement(from.and_utc(), to.and_utc()).await {
        Ok(orders) => orders,
        Err(e) => {
            error!("GetStatement failed: {:#}", e);
            return internal_error(id);
        }
    };

    let statements: Vec<Value> = orders
        .iter()
        .map(|order| {
            json!({
                "transactionId": order.transaction_id,
                "amount": to_minor_units(order.amount),
                "providerTrnId": order.id,
                "timestamp": order.created_at.format(rpc::TIMESTAMP_FORMAT).to_string(),
            })
        })
        .collect();
    RpcResponse::ok(id, json!({ "statements": statements }))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::ledger::testing::MemoryLedger;

    fn pending_order(id: i64, order_id: &str, amount: i64) -> Order {
        Order {
            id,
            user_id: 1,
            amount,
            order_type: ORDER_TYPE_STARS.to_string(),
            stars_count: Some(100),
            months: None,
            recipient: "@ali".to_string(),
            transaction_id: None,
            paid: false,
            order_id: order_id.to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap(),
        }
    }

    fn request(method: &str, params: Value) -> RpcRequest {
        RpcRequest {
            id: json!(7),
            jsonrpc: Some("2.0".to_string()),
            method: Some(method.to_string()),
            params,
        }
    }

    fn error_code(resp: &RpcResponse) -> i64 {
        resp.error.as_ref().expect("expected an error").code
    }

    #[tokio::test]
    async fn unknown_method_is_rejected() {
        let ledger = MemoryLedger::default();
        let resp = dispatch(&ledger, request("DeleteEverything", Value::Null)).await;
        assert_eq!(error_code(&resp), METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_method_is_an_invalid_request() {
        let ledger = MemoryLedger::default();
        let resp = dispatch(&ledger, request("  ", Value::Null)).await;
        assert_eq!(error_code(&resp), INVALID_REQUEST);

        let no_method = RpcRequest {
            id: json!(1),
            jsonrpc: Some("2.0".to_string()),
            method: None,
            params: Value::Null,
        };
        let resp = dispatch(&ledger, no_method).await;
        assert_eq!(error_code(&resp), INVALID_REQUEST);
    }

    #[tokio::test]
    async fn get_information_requires_an_order_id() {
        let ledger = MemoryLedger::default();
        let resp = dispatch(&ledger, request("GetInformation", json!({}))).await;
        assert_eq!(error_code(&resp), INVALID_PARAMS);

        let resp = dispatch(
            &ledger,
            request("GetInformation", json!({"fields": {}})),
        )
        .await;
        assert_eq!(error_code(&resp), INVALID_PARAMS);
    }

    #[tokio::test]
    async fn get_information_reports_the_pending_amount_in_minor_units() {
        let ledger = MemoryLedger::with_orders(vec![pending_order(1, "00042", 240_000)]);
        let resp = dispatch(
            &ledger,
            request("GetInformation", json!({"fields": {"order_id": "00042"}})),
        )
        .await;
        let result = resp.result.expect("expected a result");
        assert_eq!(result["fields"]["amount"], json!(24_000_000));
        assert_eq!(result["fields"]["order_id"], json!("00042"));
    }

    #[tokio::test]
    async fn get_information_rejects_unknown_and_completed_orders() {
        let mut paid = pending_order(1, "00042", 240_000);
        paid.paid = true;
        paid.transaction_id = Some("tx-1".to_string());
        let ledger = MemoryLedger::with_orders(vec![paid]);

        let resp = dispatch(
            &ledger,
            request("GetInformation", json!({"fields": {"order_id": "99999"}})),
        )
        .await;
        assert_eq!(error_code(&resp), NOT_FOUND);

        let resp = dispatch(
            &ledger,
            request("GetInformation", json!({"fields": {"order_id": "00042"}})),
        )
        .await;
        assert_eq!(error_code(&resp), NOT_FOUND);
    }

    #[tokio::test]
    async fn perform_transaction_completes_a_pending_order() {
        let ledger = MemoryLedger::with_orders(vec![pending_order(5, "00042", 240_000)]);
        let params = json!({
            "transactionId": "tx-1",
            "amount": 24_000_000,
            "fields": {"order_id": "00042"},
        });

        let resp = dispatch(&ledger, request("PerformTransaction", params.clone())).await;
        let result = resp.result.expect("expected a result");
        assert_eq!(result["providerTrnId"], json!(5));

        let order = ledger.find_by_order_id("00042").await.unwrap().unwrap();
        assert!(order.paid);
        assert_eq!(order.transaction_id.as_deref(), Some("tx-1"));

        // Provider retry with the identical payload succeeds without change.
        let resp = dispatch(&ledger, request("PerformTransaction", params)).await;
        assert!(resp.result.is_some());
    }

    #[tokio::test]
    async fn perform_transaction_rejects_amount_mismatch() {
        let ledger = MemoryLedger::with_orders(vec![pending_order(1, "00042", 240_000)]);
        let resp = dispatch(
            &ledger,
            request(
                "PerformTransaction",
                json!({
                    "transactionId": "tx-1",
                    "amount": 240_000, // major units sent where minor expected
                    "fields": {"order_id": "00042"},
                }),
            ),
        )
        .await;
        assert_eq!(error_code(&resp), AMOUNT_MISMATCH);

        let order = ledger.find_by_order_id("00042").await.unwrap().unwrap();
        assert!(!order.paid);
    }

    #[tokio::test]
    async fn perform_transaction_rejects_a_transaction_already_on_another_order() {
        let ledger = MemoryLedger::with_orders(vec![
            pending_order(1, "00001", 100_000),
            pending_order(2, "00002", 100_000),
        ]);
        let perform = |order_id: &str| {
            request(
                "PerformTransaction",
                json!({
                    "transactionId": "tx-1",
                    "amount": 10_000_000,
                    "fields": {"order_id": order_id},
                }),
            )
        };

        let resp = dispatch(&ledger, perform("00001")).await;
        assert!(resp.result.is_some());

        let resp = dispatch(&ledger, perform("00002")).await;
        assert_eq!(error_code(&resp), DUPLICATE_TRANSACTION);
        let untouched = ledger.find_by_order_id("00002").await.unwrap().unwrap();
        assert!(!untouched.paid);
    }

    #[tokio::test]
    async fn perform_transaction_rejects_unknown_orders_and_missing_params() {
        let ledger = MemoryLedger::default();
        let resp = dispatch(
            &ledger,
            request(
                "PerformTransaction",
                json!({
                    "transactionId": "tx-1",
                    "amount": 100,
                    "fields": {"order_id": "00042"},
                }),
            ),
        )
        .await;
        assert_eq!(error_code(&resp), NOT_FOUND);

        let resp = dispatch(
            &ledger,
            request("PerformTransaction", json!({"amount": 100})),
        )
        .await;
        assert_eq!(error_code(&resp), INVALID_PARAMS);
    }

    #[tokio::test]
    async fn check_transaction_reports_state() {
        let ledger = MemoryLedger::with_orders(vec![pending_order(9, "00042", 240_000)]);
        ledger.attach_transaction("00042", "tx-9").await.unwrap();

        let resp = dispatch(
            &ledger,
            request("CheckTransaction", json!({"transactionId": "tx-9"})),
        )
        .await;
        let result = resp.result.expect("expected a result");
        assert_eq!(result["transactionState"], json!(1));
        assert_eq!(result["providerTrnId"], json!(9));

        let resp = dispatch(
            &ledger,
            request("CheckTransaction", json!({"transactionId": "tx-404"})),
        )
        .await;
        assert_eq!(error_code(&resp), NOT_FOUND);
    }

    #[tokio::test]
    async fn statement_returns_completed_orders_within_the_window() {
        let mut inside = pending_order(1, "00001", 100_000);
        inside.paid = true;
        inside.transaction_id = Some("tx-1".to_string());
        inside.created_at = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();

        let mut outside = inside.clone();
        outside.id = 2;
        outside.order_id = "00002".to_string();
        outside.transaction_id = Some("tx-2".to_string());
        outside.created_at = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();

        let unpaid = pending_order(3, "00003", 100_000);

        let ledger = MemoryLedger::with_orders(vec![inside, outside, unpaid]);
        let resp = dispatch(
            &ledger,
            request(
                "GetStatement",
                json!({
                    "dateFrom": "2025-03-01 00:00:00",
                    "dateTo": "2025-04-01 00:00:00",
                }),
            ),
        )
        .await;

        let result = resp.result.expect("expected a result");
        let statements = result["statements"].as_array().unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0]["transactionId"], json!("tx-1"));
        assert_eq!(statements[0]["amount"], json!(10_000_000));
        assert_eq!(statements[0]["timestamp"], json!("2025-03-10 12:00:00"));
    }

    #[tokio::test]
    async fn statement_rejects_malformed_dates() {
        let ledger = MemoryLedger::default();
        let resp = dispatch(
            &ledger,
            request(
                "GetStatement",
                json!({"dateFrom": "2025-03-01", "dateTo": "not a date"}),
            ),
        )
        .await;
        assert_eq!(error_code(&resp), INVALID_PARAMS);
    }
}
