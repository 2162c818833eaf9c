//! Huobi 커넥터 통합 테스트 (mockito 서버 사용).

use mockito::{Matcher, Server};
use rust_decimal_macros::dec;
use serde_json::json;
use trader_core::{BalanceBucket, BorrowState, OpenOrder, OrderState, Side, Symbol};
use trader_exchange::{ExchangeError, HuobiClient, HuobiConfig, MarginExchange};

fn client(server: &Server) -> HuobiClient {
    let config = HuobiConfig::new("test-access-key", "test-secret-key").with_base_url(server.url());
    HuobiClient::new(config).unwrap()
}

fn btc_usdt() -> Symbol {
    Symbol::new("btc", "usdt")
}

fn signed() -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("AccessKeyId".into(), "test-access-key".into()),
        Matcher::UrlEncoded("SignatureMethod".into(), "HmacSHA256".into()),
        Matcher::UrlEncoded("SignatureVersion".into(), "2".into()),
        Matcher::Regex("Timestamp=".into()),
        Matcher::Regex("Signature=".into()),
    ])
}

#[tokio::test]
async fn test_get_ticker_from_merged_detail() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/market/detail/merged")
        .match_query(Matcher::UrlEncoded("symbol".into(), "btcusdt".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "ok",
                "ch": "market.btcusdt.detail.merged",
                "ts": 1_550_000_000_000u64,
                "tick": {
                    "open": 20000,
                    "close": 21000,
                    "high": 21500,
                    "low": 19800,
                    "amount": 1234.5,
                    "bid": [20999.5, 0.3],
                    "ask": [21000.5, 1.2]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let ticker = client(&server).get_ticker(&btc_usdt()).await.unwrap();

    assert_eq!(ticker.last, dec!(21000));
    assert_eq!(ticker.bid, dec!(20999.5));
    assert_eq!(ticker.ask, dec!(21000.5));
    assert_eq!(ticker.change_24h_percent, dec!(5));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_symbol_spec_combines_precision_and_limits() {
    let mut server = Server::new_async().await;
    let symbols = server
        .mock("GET", "/v1/common/symbols")
        .with_status(200)
        .with_body(
            json!({
                "status": "ok",
                "data": [
                    {
                        "base-currency": "eth",
                        "quote-currency": "usdt",
                        "price-precision": 2,
                        "amount-precision": 4,
                        "value-precision": 8,
                        "symbol-partition": "main"
                    },
                    {
                        "base-currency": "btc",
                        "quote-currency": "usdt",
                        "price-precision": 2,
                        "amount-precision": 6,
                        "value-precision": 8,
                        "symbol-partition": "main"
                    }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let limits = server
        .mock("GET", "/v1/common/exchange")
        .match_query(Matcher::UrlEncoded("symbol".into(), "btcusdt".into()))
        .with_status(200)
        .with_body(
            json!({
                "status": "ok",
                "data": {
                    "symbol": "btcusdt",
                    "buy-market-must-greater-than": 1,
                    "buy-market-must-less-than": 1000000,
                    "sell-market-must-greater-than": 0.0001,
                    "sell-market-must-less-than": 100
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let spec = client(&server).get_symbol_spec(&btc_usdt()).await.unwrap();

    assert_eq!(spec.amount_precision, 6);
    assert_eq!(spec.value_precision, 8);
    assert_eq!(spec.limits.buy_min, dec!(1));
    assert_eq!(spec.limits.sell_min, dec!(0.0001));
    assert_eq!(spec.limits.sell_max, dec!(100));
    symbols.assert_async().await;
    limits.assert_async().await;
}

#[tokio::test]
async fn test_get_symbol_spec_unsupported_symbol() {
    let mut server = Server::new_async().await;
    let _symbols = server
        .mock("GET", "/v1/common/symbols")
        .with_status(200)
        .with_body(r#"{"status":"ok","data":[]}"#)
        .create_async()
        .await;

    let err = client(&server)
        .get_symbol_spec(&Symbol::new("abc", "def"))
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::SymbolNotFound(_)));
}

#[tokio::test]
async fn test_get_account_carry_is_signed_and_decoded() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/margin/accounts/balance")
        .match_query(Matcher::AllOf(vec![
            signed(),
            Matcher::UrlEncoded("symbol".into(), "btcusdt".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "status": "ok",
                "data": [{
                    "id": 5_263_185,
                    "type": "margin",
                    "state": "working",
                    "symbol": "btcusdt",
                    "fl-price": "0",
                    "fl-type": "safe",
                    "risk-rate": "10",
                    "list": [
                        {"currency": "btc", "type": "trade", "balance": "0.02"},
                        {"currency": "btc", "type": "loan", "balance": "-0.001"},
                        {"currency": "usdt", "type": "loan-available", "balance": "150.5"}
                    ]
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let entries = client(&server).get_account_carry(&btc_usdt()).await.unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].bucket, BalanceBucket::Trade);
    assert_eq!(entries[0].amount, dec!(0.02));
    assert_eq!(entries[1].amount, dec!(-0.001));
    assert_eq!(entries[2].currency, "usdt");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_malformed_number_is_parse_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/margin/accounts/balance")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "status": "ok",
                "data": [{
                    "id": 1,
                    "list": [{"currency": "btc", "type": "trade", "balance": "lots"}]
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = client(&server)
        .get_account_carry(&btc_usdt())
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::ParseError(_)));
}

#[tokio::test]
async fn test_venue_error_preserves_code() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/margin/loan-orders")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "status": "error",
                "err-code": "dw-loan-frozen",
                "err-msg": "loan is frozen"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = client(&server)
        .get_borrow_orders(&btc_usdt(), Some(BorrowState::Accrual))
        .await
        .unwrap_err();

    assert_eq!(err.venue_code(), Some("dw-loan-frozen"));
    assert!(err.to_string().contains("loan is frozen"));
}

#[tokio::test]
async fn test_get_borrow_orders_filters_by_state() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/margin/loan-orders")
        .match_query(Matcher::AllOf(vec![
            signed(),
            Matcher::UrlEncoded("symbol".into(), "btcusdt".into()),
            Matcher::UrlEncoded("states".into(), "accrual".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "status": "ok",
                "data": [{
                    "id": 1001,
                    "currency": "usdt",
                    "state": "accrual",
                    "loan-amount": "100.000",
                    "loan-balance": "100.000",
                    "interest-amount": "0.02",
                    "interest-balance": "0.02",
                    "interest-rate": "0.0002"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let orders = client(&server)
        .get_borrow_orders(&btc_usdt(), Some(BorrowState::Accrual))
        .await
        .unwrap();

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, "1001");
    assert_eq!(orders[0].outstanding(), dec!(100.02));
    assert_eq!(orders[0].state, BorrowState::Accrual);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_place_market_buy_uses_margin_account() {
    let mut server = Server::new_async().await;
    let _account = server
        .mock("GET", "/v1/margin/accounts/balance")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"status":"ok","data":[{"id":5263185,"list":[]}]}"#)
        .create_async()
        .await;
    let place = server
        .mock("POST", "/v1/order/orders/place")
        .match_query(signed())
        .match_body(Matcher::Json(json!({
            "account-id": "5263185",
            "amount": "49.5",
            "source": "margin-api",
            "symbol": "btcusdt",
            "type": "buy-market"
        })))
        .with_status(200)
        .with_body(r#"{"status":"ok","data":"59378"}"#)
        .create_async()
        .await;

    let id = client(&server)
        .place_market_order(&btc_usdt(), Side::Buy, dec!(49.500))
        .await
        .unwrap();

    assert_eq!(id, "59378");
    place.assert_async().await;
}

#[tokio::test]
async fn test_cancel_all_uses_given_orders_without_relisting() {
    let mut server = Server::new_async().await;
    let relist = server
        .mock("GET", "/v1/order/orders")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let ok = server
        .mock("POST", "/v1/order/orders/11/submitcancel")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"status":"ok","data":"11"}"#)
        .create_async()
        .await;
    let failed = server
        .mock("POST", "/v1/order/orders/12/submitcancel")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"status":"error","err-code":"order-orderstate-error","err-msg":"order state error"}"#,
        )
        .create_async()
        .await;

    let open = vec![
        OpenOrder {
            id: "11".to_string(),
            state: OrderState::Submitted,
        },
        OpenOrder {
            id: "12".to_string(),
            state: OrderState::PartialFilled,
        },
    ];
    let err = client(&server)
        .cancel_all_orders(&btc_usdt(), &open)
        .await
        .unwrap_err();

    match err {
        ExchangeError::Aggregate(failures) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].0, "12");
        }
        other => panic!("unexpected error: {other}"),
    }
    ok.assert_async().await;
    failed.assert_async().await;
    relist.assert_async().await;
}

#[tokio::test]
async fn test_get_open_orders_decodes_states() {
    let mut server = Server::new_async().await;
    let _open = server
        .mock("GET", "/v1/order/orders")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"status":"ok","data":[{"id":11,"state":"pre-submitted"}]}"#)
        .create_async()
        .await;

    let orders = client(&server)
        .get_open_orders(&btc_usdt(), &OrderState::OPEN)
        .await
        .unwrap();

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].state, OrderState::PreSubmitted);
}

#[tokio::test]
async fn test_borrow_and_repay() {
    let mut server = Server::new_async().await;
    let borrow = server
        .mock("POST", "/v1/margin/orders")
        .match_query(signed())
        .match_body(Matcher::Json(json!({
            "amount": "10",
            "currency": "usdt",
            "symbol": "btcusdt"
        })))
        .with_status(200)
        .with_body(r#"{"status":"ok","data":1001}"#)
        .create_async()
        .await;
    let repay = server
        .mock("POST", "/v1/margin/orders/1001/repay")
        .match_query(signed())
        .match_body(Matcher::Json(json!({"amount": "10.0002"})))
        .with_status(200)
        .with_body(r#"{"status":"ok","data":1001}"#)
        .create_async()
        .await;

    let client = client(&server);
    let id = client.borrow(&btc_usdt(), "usdt", dec!(10.000)).await.unwrap();
    assert_eq!(id, "1001");
    client.repay(&id, dec!(10.0002)).await.unwrap();

    borrow.assert_async().await;
    repay.assert_async().await;
}

#[tokio::test]
async fn test_get_order_detail_accepts_legacy_field_names() {
    let mut server = Server::new_async().await;
    let _detail = server
        .mock("GET", "/v1/order/orders/59378")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "status": "ok",
                "data": {
                    "id": 59378,
                    "symbol": "btcusdt",
                    "type": "sell-market",
                    "state": "filled",
                    "field-amount": "0.019",
                    "field-cash-amount": "570.0",
                    "field-fees": "1.14"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let detail = client(&server).get_order_detail("59378").await.unwrap();

    assert_eq!(detail.state, OrderState::Filled);
    assert_eq!(detail.filled_amount, dec!(0.019));
    assert_eq!(detail.filled_cash_amount, dec!(570));
    assert_eq!(detail.filled_fees, dec!(1.14));
}
