//! Daily crypto prices from Alpha Vantage

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};

use super::{fetch_json, show};
use crate::registry::{BuiltinTool, HandlerError, ParamSpec, ToolArgs, ToolContext, ToolSpec};

const SERIES_KEY: &str = "Time Series (Digital Currency Daily)";

/// `get_crypto_data(symbol, date, market)` → `{"open", "high", "low"}`
#[derive(Debug, Clone, Copy, Default)]
pub struct CryptoDataTool;

#[async_trait]
impl BuiltinTool for CryptoDataTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_crypto_data",
            "Retrieves the Open, High, and Low prices of a cryptocurrency for a specific date.",
        )
        .param(ParamSpec::string("symbol", "Cryptocurrency symbol, e.g. BTC or ETH"))
        .param(ParamSpec::string("date", "Date in YYYY-MM-DD format"))
        .param(ParamSpec::string("market", "Quote market, e.g. USD").with_default("US"))
    }

    async fn run(&self, args: ToolArgs, ctx: &ToolContext) -> Result<Value, HandlerError> {
        let key = ctx.credential("alphavantage", &ctx.config().credentials.alphavantage)?;
        let symbol = args.get_str("symbol")?.trim().to_uppercase();
        let date = args.get_str("date")?.trim();
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| HandlerError::invalid("date", format!("expected YYYY-MM-DD ({})", e)))?;

        let body = fetch_json(
            ctx.http().get(&ctx.config().endpoints.alphavantage).query(&[
                ("function", "DIGITAL_CURRENCY_DAILY"),
                ("symbol", symbol.as_str()),
                ("market", args.get_str("market")?),
                ("apikey", key),
            ]),
            "Alpha Vantage",
        )
        .await?;

        daily_prices(&body, date)
    }
}

fn daily_prices(body: &Value, date: &str) -> Result<Value, HandlerError> {
    // Alpha Vantage reports errors and rate limits with a 200 status
    for key in ["Error Message", "Note", "Information"] {
        if let Some(message) = body.get(key) {
            return Err(HandlerError::upstream(show(message)));
        }
    }

    let day = body
        .get(SERIES_KEY)
        .ok_or_else(|| HandlerError::upstream(format!("unexpected response: missing '{}'", SERIES_KEY)))?
        .get(date)
        .ok_or_else(|| HandlerError::failed(format!("No data available for {}", date)))?;

    let price = |key: &str| day.get(key).map(show).unwrap_or_else(|| "unknown".to_string());
    Ok(json!({
        "open": price("1. open"),
        "high": price("2. high"),
        "low": price("3. low"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, Endpoints, ToolConfig};
    use crate::logging::NoOpLogger;
    use mockito::Matcher;
    use std::sync::Arc;

    fn series() -> Value {
        json!({
            "Meta Data": {"2. Digital Currency Code": "BTC"},
            SERIES_KEY: {
                "2024-03-01": {
                    "1. open": "61130.98",
                    "2. high": "63114.23",
                    "3. low": "60777.00",
                    "4. close": "62387.90"
                }
            }
        })
    }

    #[test]
    fn test_daily_prices() {
        let out = daily_prices(&series(), "2024-03-01").unwrap();
        assert_eq!(
            out,
            json!({"open": "61130.98", "high": "63114.23", "low": "60777.00"})
        );
    }

    #[test]
    fn test_daily_prices_missing_date() {
        let err = daily_prices(&series(), "1999-01-01").unwrap_err();
        assert_eq!(err.to_string(), "No data available for 1999-01-01");
    }

    #[test]
    fn test_daily_prices_api_error() {
        let err = daily_prices(&json!({"Error Message": "Invalid API call"}), "2024-03-01")
            .unwrap_err();
        assert!(matches!(err, HandlerError::Upstream(_)));
        assert!(err.to_string().contains("Invalid API call"));
    }

    #[tokio::test]
    async fn test_bad_date_rejected_before_request() {
        let ctx = ToolContext::new(
            ToolConfig::new(
                Endpoints::default(),
                Credentials {
                    alphavantage: Some("demo".to_string()),
                    ..Default::default()
                },
            ),
            Arc::new(NoOpLogger),
        );
        let args = CryptoDataTool
            .spec()
            .validate(&json!({"symbol": "BTC", "date": "March 1st"}))
            .unwrap();
        let err = CryptoDataTool.run(args, &ctx).await.unwrap_err();
        assert!(matches!(err, HandlerError::InvalidParameter { .. }));
    }

    #[tokio::test]
    async fn test_get_crypto_data() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("function".into(), "DIGITAL_CURRENCY_DAILY".into()),
                Matcher::UrlEncoded("symbol".into(), "BTC".into()),
                Matcher::UrlEncoded("apikey".into(), "demo".into()),
            ]))
            .with_status(200)
            .with_body(series().to_string())
            .create_async()
            .await;

        let ctx = ToolContext::new(
            ToolConfig::new(
                Endpoints::all_at(&server.url()),
                Credentials {
                    alphavantage: Some("demo".to_string()),
                    ..Default::default()
                },
            ),
            Arc::new(NoOpLogger),
        );
        let args = CryptoDataTool
            .spec()
            .validate(&json!({"symbol": "btc", "date": "2024-03-01"}))
            .unwrap();
        let out = CryptoDataTool.run(args, &ctx).await.unwrap();

        mock.assert_async().await;
        assert_eq!(out["high"], "63114.23");
    }
}
