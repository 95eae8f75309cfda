use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use uex_trader::domain::{
    confirm_trade_target, search_trade_routes, FetchError, Operation, RecordSource, Scope,
    SearchPolicy, SearchProgress, TradeDeclaration, TradeRoute, TradeTargetError,
};
use uex_trader::infra::{UexClient, UexClientError};

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "status": "ok", "data": data }))
}

fn client(server: &MockServer) -> UexClient {
    UexClient::with_base_url(&server.uri()).unwrap()
}

fn stanton_terminals() -> serde_json::Value {
    json!([
        {
            "id": 100, "name": "Admin - Port Olisar", "id_star_system": 68, "id_planet": 4,
            "type": "commodity", "is_available": 1, "space_station_name": "Port Olisar", "mcs": 32
        },
        {
            "id": 101, "name": "TDD - Lorville", "id_star_system": 68, "id_planet": 6,
            "type": "commodity", "is_available": 1, "city_name": "Lorville", "mcs": 16
        },
        {
            "id": 102, "name": "Refinery", "id_star_system": 68, "id_planet": 4,
            "type": "refinery", "is_available": 1
        },
        {
            "id": 103, "name": "Closed", "id_star_system": 68, "id_planet": 4,
            "type": "commodity", "is_available": 0
        }
    ])
}

#[tokio::test]
async fn terminals_are_filtered_to_available_commodity_terminals() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/terminals"))
        .and(query_param("id_star_system", "68"))
        .respond_with(ok(stanton_terminals()))
        .mount(&server)
        .await;

    let terminals = client(&server)
        .list_terminals(Some(68), None, None)
        .await
        .unwrap();

    let ids: Vec<_> = terminals.iter().map(|terminal| terminal.id).collect();
    assert_eq!(ids, vec![100, 101]);
    assert!(terminals[0].is_space_station_terminal);
    assert!(terminals[1].is_city_terminal);
    assert_eq!(terminals[1].max_container_size, Some(16));
}

#[tokio::test]
async fn repeated_queries_are_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/star_systems"))
        .respond_with(ok(json!([{ "id": 68, "name": "Stanton", "is_available": 1 }])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let first = client.list_systems().await.unwrap();
    let second = client.list_systems().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0].name, "Stanton");
}

#[tokio::test]
async fn zero_ttl_always_goes_to_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/star_systems"))
        .respond_with(ok(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server).with_ttl(Duration::ZERO);
    client.list_systems().await.unwrap();
    client.list_systems().await.unwrap();
}

#[tokio::test]
async fn cleared_cache_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/planets"))
        .and(query_param("id_star_system", "68"))
        .respond_with(ok(json!([
            { "id": 4, "name": "microTech", "id_star_system": 68, "is_available": 1 },
            { "id": 5, "name": "Delamar", "id_star_system": 68, "is_available": 0 }
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let planets = client.list_planets(Some(68), None).await.unwrap();
    assert_eq!(planets.len(), 1);
    client.clear_cache().await;
    client.list_planets(Some(68), None).await.unwrap();
}

#[tokio::test]
async fn http_failure_becomes_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/star_systems"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let error = client(&server).list_systems().await.unwrap_err();
    assert_eq!(
        error,
        FetchError::Status {
            endpoint: "star_systems".into(),
            status: 503
        }
    );
}

#[tokio::test]
async fn failed_envelope_becomes_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/commodities_prices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "requests_limit_reached",
            "data": null,
            "message": "too many requests"
        })))
        .mount(&server)
        .await;

    let error = client(&server).list_buy_offers(1).await.unwrap_err();
    assert_eq!(error, FetchError::Api("too many requests".into()));
}

#[tokio::test]
async fn garbage_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/commodities_prices"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let error = client(&server)
        .list_sell_offers_for_commodity(1)
        .await
        .unwrap_err();
    assert!(matches!(error, FetchError::Malformed(_)));
}

#[tokio::test]
async fn unusable_rows_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/commodities_prices"))
        .and(query_param("id_commodity", "1"))
        .respond_with(ok(json!([
            {
                "id_commodity": 1, "commodity_name": "Gold", "id_terminal": 101,
                "terminal_name": "TDD - Lorville", "price_sell": 15, "scu_sell_stock": 300
            },
            {
                "id_commodity": 1, "commodity_name": "Gold", "id_terminal": 102,
                "terminal_name": "Refinery", "price_sell": "N/A"
            },
            {
                "id_commodity": 1, "commodity_name": "Gold", "id_terminal": null,
                "price_sell": 18
            }
        ])))
        .mount(&server)
        .await;

    let offers = client(&server)
        .list_sell_offers_for_commodity(1)
        .await
        .unwrap();
    let terminals: Vec<_> = offers.iter().map(|offer| offer.terminal_id).collect();
    assert_eq!(terminals, vec![101]);
}

#[tokio::test]
async fn data_that_is_not_a_list_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/star_systems"))
        .respond_with(ok(json!({ "id": 68 })))
        .mount(&server)
        .await;

    let error = client(&server).list_systems().await.unwrap_err();
    assert!(matches!(error, FetchError::Malformed(_)));
}

#[tokio::test]
async fn routes_are_requested_per_origin_planet() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/commodities_routes"))
        .and(query_param("id_planet_origin", "4"))
        .and(query_param("id_planet_destination", "6"))
        .respond_with(ok(json!([{
            "id_commodity": 5, "commodity_name": "Laranite",
            "id_terminal_origin": 100, "origin_terminal_name": "Admin - Port Olisar",
            "id_planet_origin": 4,
            "id_terminal_destination": 101, "destination_terminal_name": "TDD - Lorville",
            "id_planet_destination": 6,
            "price_origin": 25, "price_destination": "31.5",
            "scu_origin": 64, "scu_destination": 500
        }])))
        .mount(&server)
        .await;

    let routes = client(&server).list_routes(4, Some(6)).await.unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].buy.terminal_id, 100);
    assert_eq!(routes[0].sell.sell_price, Some(31.5));
}

async fn mount_gold_market(server: &MockServer, extra_sell_rows: Vec<serde_json::Value>) {
    Mock::given(method("GET"))
        .and(path("/terminals"))
        .and(query_param("id_star_system", "68"))
        .respond_with(ok(stanton_terminals()))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/commodities_prices"))
        .and(query_param("id_terminal", "100"))
        .respond_with(ok(json!([{
            "id_commodity": 1, "commodity_name": "Gold", "id_terminal": 100,
            "terminal_name": "Admin - Port Olisar", "price_buy": 10, "price_sell": 0,
            "scu_buy": 500
        }])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/commodities_prices"))
        .and(query_param("id_terminal", "101"))
        .respond_with(ok(json!([{
            "id_commodity": 1, "commodity_name": "Gold", "id_terminal": 101,
            "terminal_name": "TDD - Lorville", "price_buy": 0, "price_sell": 15,
            "scu_sell_stock": 300, "scu_sell_users": 50
        }])))
        .mount(server)
        .await;
    let mut sell_rows = vec![
        json!({
            "id_commodity": 1, "commodity_name": "Gold", "id_terminal": 100,
            "terminal_name": "Admin - Port Olisar", "price_buy": 10, "price_sell": 0,
            "scu_buy": 500
        }),
        json!({
            "id_commodity": 1, "commodity_name": "Gold", "id_terminal": 101,
            "terminal_name": "TDD - Lorville", "price_buy": 0, "price_sell": 15,
            "scu_sell_stock": 300, "scu_sell_users": 50
        }),
    ];
    sell_rows.extend(extra_sell_rows);
    Mock::given(method("GET"))
        .and(path("/commodities_prices"))
        .and(query_param("id_commodity", "1"))
        .respond_with(ok(serde_json::Value::Array(sell_rows)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn search_runs_against_the_api() {
    let server = MockServer::start().await;
    mount_gold_market(&server, Vec::new()).await;

    let client = client(&server);
    let policy = SearchPolicy {
        max_investment: Some(2000.0),
        destination: Scope::system(68),
        ..SearchPolicy::from_departure(Scope::system(68))
    };
    let outcome = search_trade_routes(
        &client,
        &policy,
        &mut |_: &SearchProgress, _: &[TradeRoute]| {},
    )
    .await
    .unwrap();

    assert_eq!(outcome.routes.len(), 1);
    let route = &outcome.routes[0];
    assert_eq!(route.departure_terminal_id, 100);
    assert_eq!(route.arrival_terminal_id, 101);
    assert_eq!(route.quantity_scu, 200);
    assert_eq!(route.total_margin, 1000.0);
    assert_eq!(route.profit_pct, 50);
    assert_eq!(route.departure_system_id, Some(68));
    assert_eq!(route.arrival_max_container_size, Some(16));
}

#[tokio::test]
async fn search_survives_an_unusable_sell_row() {
    let server = MockServer::start().await;
    mount_gold_market(
        &server,
        vec![
            json!({
                "id_commodity": 1, "commodity_name": "Gold", "id_terminal": 101,
                "terminal_name": "TDD - Lorville", "price_sell": "N/A"
            }),
            json!({ "id_commodity": 1, "id_terminal": null, "price_sell": 40 }),
        ],
    )
    .await;

    let policy = SearchPolicy {
        max_investment: Some(2000.0),
        destination: Scope::system(68),
        ..SearchPolicy::from_departure(Scope::system(68))
    };
    let outcome = search_trade_routes(
        &client(&server),
        &policy,
        &mut |_: &SearchProgress, _: &[TradeRoute]| {},
    )
    .await
    .unwrap();

    assert_eq!(outcome.routes.len(), 1);
    assert_eq!(outcome.routes[0].arrival_terminal_id, 101);
    assert_eq!(outcome.routes[0].total_margin, 1000.0);
}

#[tokio::test]
async fn trade_target_is_checked_against_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/terminals"))
        .and(query_param("id", "101"))
        .respond_with(ok(stanton_terminals()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/commodities_prices"))
        .and(query_param("id_terminal", "101"))
        .respond_with(ok(json!([{
            "id_commodity": 1, "commodity_name": "Gold", "id_terminal": 101,
            "terminal_name": "TDD - Lorville", "price_sell": 15
        }])))
        .mount(&server)
        .await;

    let client = client(&server);
    let gold = TradeDeclaration::new(101, 1, Operation::Sell, 10, 15.0).unwrap();
    let (terminal, offer) = confirm_trade_target(&client, &gold).await.unwrap();
    assert_eq!(terminal.name, "TDD - Lorville");
    assert_eq!(offer.commodity_name, "Gold");

    let unknown = TradeDeclaration::new(101, 7, Operation::Sell, 10, 15.0).unwrap();
    assert!(matches!(
        confirm_trade_target(&client, &unknown).await,
        Err(TradeTargetError::UnknownCommodity { commodity_id: 7, .. })
    ));
}

#[tokio::test]
async fn trade_is_posted_with_secret_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user_trades_add/"))
        .and(header("secret_key", "s3cret"))
        .and(body_json(json!({
            "id_terminal": 101,
            "id_commodity": 1,
            "operation": "sell",
            "scu": 200,
            "price": 15.0
        })))
        .respond_with(ok(json!({ "id_user_trade": 4242 })))
        .expect(1)
        .mount(&server)
        .await;

    let declaration = TradeDeclaration::new(101, 1, Operation::Sell, 200, 15.0).unwrap();
    let trade_id = client(&server)
        .submit_trade(&declaration, "s3cret")
        .await
        .unwrap();
    assert_eq!(trade_id, 4242);
}

#[tokio::test]
async fn refused_secret_key_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user_trades_add/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let declaration = TradeDeclaration::new(101, 1, Operation::Buy, 1, 10.0).unwrap();
    let result = client(&server).submit_trade(&declaration, "wrong").await;
    assert!(matches!(result, Err(UexClientError::Unauthorized)));
}

#[tokio::test]
async fn missing_secret_key_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let declaration = TradeDeclaration::new(101, 1, Operation::Buy, 1, 10.0).unwrap();
    let result = client(&server).submit_trade(&declaration, "  ").await;
    assert!(matches!(result, Err(UexClientError::MissingSecretKey)));
}
