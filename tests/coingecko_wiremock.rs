mod support;

use std::sync::Arc;

use anyhow::Result;
use cryptofolio::market_data::providers::CoinGeckoMarketSource;
use cryptofolio::market_data::{FeedError, MarketDataService, MarketDataSource};
use support::{coingecko_markets_body, d};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn coingecko_fetch_markets_hits_mock_server() -> Result<()> {
    let server = MockServer::start().await;
    let source = CoinGeckoMarketSource::new().with_base_url(server.uri());

    let body = coingecko_markets_body(&[
        ("bitcoin", "btc", "Bitcoin", Some(64000.5)),
        ("ethereum", "eth", "Ethereum", Some(3100.0)),
    ]);

    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .and(query_param("vs_currency", "usd"))
        .and(query_param("order", "market_cap_desc"))
        .and(query_param("per_page", "2"))
        .and(query_param("page", "1"))
        .and(query_param("sparkline", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let assets = source.fetch_markets(2).await?;
    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0].id, "bitcoin");
    assert_eq!(assets[0].symbol, "btc");
    assert_eq!(assets[0].current_price, d("64000.5"));
    assert_eq!(assets[0].market_cap_rank, Some(1));
    assert_eq!(assets[1].image, "https://assets.example/ethereum.png");
    assert_eq!(assets[1].price_change_percentage_24h, Some(d("-2.25")));

    Ok(())
}

#[tokio::test]
async fn coingecko_uses_configured_quote_currency() -> Result<()> {
    let server = MockServer::start().await;
    let source = CoinGeckoMarketSource::new()
        .with_base_url(format!("{}/", server.uri()))
        .with_quote_currency("EUR");

    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .and(query_param("vs_currency", "eur"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    assert!(source.fetch_markets(50).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn coingecko_drops_entries_without_price() -> Result<()> {
    let server = MockServer::start().await;
    let source = CoinGeckoMarketSource::new().with_base_url(server.uri());

    let body = coingecko_markets_body(&[
        ("bitcoin", "btc", "Bitcoin", Some(64000.0)),
        ("delisted", "dls", "Delisted", None),
    ]);
    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let assets = source.fetch_markets(50).await?;
    let ids: Vec<&str> = assets.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["bitcoin"]);

    Ok(())
}

#[tokio::test]
async fn coingecko_reports_http_status() -> Result<()> {
    let server = MockServer::start().await;
    let source = CoinGeckoMarketSource::new().with_base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let err = source.fetch_markets(50).await.unwrap_err();
    match err {
        FeedError::Status { status, body, .. } => {
            assert_eq!(status.as_u16(), 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn coingecko_reports_undecodable_body() -> Result<()> {
    let server = MockServer::start().await;
    let source = CoinGeckoMarketSource::new().with_base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"status":"oops"}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let err = source.fetch_markets(50).await.unwrap_err();
    assert!(matches!(err, FeedError::Decode { .. }), "got {err:?}");

    Ok(())
}

#[tokio::test]
async fn service_keeps_snapshot_when_feed_fails() -> Result<()> {
    let server = MockServer::start().await;
    let source = CoinGeckoMarketSource::new().with_base_url(server.uri());
    let service = MarketDataService::new(Arc::new(source));

    let body = coingecko_markets_body(&[("bitcoin", "btc", "Bitcoin", Some(64000.0))]);
    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let first = service.refresh().await?;
    assert_eq!(first.price_of("bitcoin"), Some(d("64000")));

    assert!(service.refresh().await.is_err());
    let current = service.snapshot().expect("snapshot retained");
    assert_eq!(current.fetched_at, first.fetched_at);
    assert_eq!(current.price_of("bitcoin"), Some(d("64000")));

    Ok(())
}
