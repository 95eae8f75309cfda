//! Thin asynchronous client for the UEX API v2.
//!
//! - Implements [`RecordSource`] on top of the public read endpoints.
//! - Keeps raw responses in a [`ResponseCache`] for a few minutes.
//! - Submits buy/sell declarations to `user_trades_add`.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{
    CommodityId, CommodityOffer, FetchError, Planet, PlanetId, RecordSource, StarSystem,
    SystemId, Terminal, TerminalId, TradeCandidate, TradeDeclaration,
};
use crate::infra::cache::{CacheKey, ResponseCache};

pub const DEFAULT_BASE_URL: &str = "https://api.uexcorp.uk/2.0/";
const USER_AGENT: &str = concat!("uex-trader/", env!("CARGO_PKG_VERSION"));
const TRADE_ENDPOINT: &str = "user_trades_add/";

#[derive(Debug, Error)]
pub enum UexClientError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("api error: {0}")]
    Api(String),
    #[error("a secret key is required to submit trades")]
    MissingSecretKey,
    #[error("the secret key was refused")]
    Unauthorized,
}

impl From<UexClientError> for FetchError {
    fn from(error: UexClientError) -> Self {
        match error {
            UexClientError::Http(error) if error.is_decode() => Self::Malformed(error.to_string()),
            UexClientError::Http(error) => Self::Transport(error.to_string()),
            UexClientError::InvalidUrl(error) => Self::Transport(error.to_string()),
            UexClientError::Status { endpoint, status } => Self::Status { endpoint, status },
            UexClientError::Decode(error) => Self::Malformed(error.to_string()),
            UexClientError::Api(message) => Self::Api(message),
            other @ (UexClientError::MissingSecretKey | UexClientError::Unauthorized) => {
                Self::Api(other.to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    status: Option<String>,
    data: Option<T>,
    message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    fn into_data(self) -> Result<T, UexClientError> {
        let ApiEnvelope {
            status,
            data,
            message,
        } = self;

        match status {
            Some(status) if !status.eq_ignore_ascii_case("ok") => {
                Err(UexClientError::Api(message.unwrap_or(status)))
            }
            _ => data.ok_or_else(|| {
                UexClientError::Api(message.unwrap_or_else(|| "response missing data".into()))
            }),
        }
    }
}

#[derive(Clone)]
pub struct UexClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
    cache: Arc<ResponseCache>,
}

impl UexClient {
    pub fn new() -> Result<Self, UexClientError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base: &str) -> Result<Self, UexClientError> {
        // `Url::join` drops the last segment unless the base ends with a slash.
        let base_url = if base.ends_with('/') {
            Url::parse(base)?
        } else {
            Url::parse(&format!("{base}/"))?
        };
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url,
            api_key: None,
            cache: Arc::new(ResponseCache::default()),
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache = Arc::new(ResponseCache::new(ttl));
        self
    }

    /// Bearer token sent with read requests. Blank keys are ignored.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Report a trade and return the id UEX assigned to it.
    pub async fn submit_trade(
        &self,
        declaration: &TradeDeclaration,
        secret_key: &str,
    ) -> Result<i64, UexClientError> {
        if secret_key.trim().is_empty() {
            return Err(UexClientError::MissingSecretKey);
        }

        let url = self.url(TRADE_ENDPOINT)?;
        info!(
            terminal = declaration.terminal_id,
            commodity = declaration.commodity_id,
            operation = declaration.operation.label(),
            scu = declaration.scu,
            "Submitting trade"
        );
        let response = self
            .http
            .post(url)
            .header("secret_key", secret_key)
            .json(declaration)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            return Err(UexClientError::Unauthorized);
        }
        if !status.is_success() {
            return Err(UexClientError::Status {
                endpoint: TRADE_ENDPOINT.trim_end_matches('/').to_string(),
                status: status.as_u16(),
            });
        }

        let envelope: ApiEnvelope<TradeReceiptDto> = serde_json::from_slice(&response.bytes().await?)?;
        let receipt = envelope.into_data()?;
        info!(trade = receipt.id_user_trade, "Trade recorded");
        Ok(receipt.id_user_trade)
    }

    /// Decode every row of `endpoint` that parses. Rows with missing or
    /// unusable required fields are skipped; only a bad envelope is an error.
    async fn fetch_records<T>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, UexClientError>
    where
        T: DeserializeOwned,
    {
        let rows: Vec<Value> = serde_json::from_value(self.fetch_raw(endpoint, params).await?)?;
        let total = rows.len();
        let records: Vec<T> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(record) => Some(record),
                Err(error) => {
                    debug!(endpoint, %error, "Skipping unusable UEX record");
                    None
                }
            })
            .collect();
        if records.len() < total {
            debug!(endpoint, skipped = total - records.len(), "Dropped malformed records");
        }
        Ok(records)
    }

    async fn fetch_raw(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value, UexClientError> {
        let key = CacheKey::new(endpoint, params);
        if let Some(raw) = self.cache.get(&key).await {
            debug!(endpoint, "Serving cached UEX response");
            return Ok(raw);
        }

        let mut url = self.url(endpoint)?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in params {
                pairs.append_pair(name, value);
            }
        }
        debug!(%url, "Requesting UEX data");

        let mut request = self.http.get(url);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UexClientError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let envelope: ApiEnvelope<Value> = serde_json::from_slice(&response.bytes().await?)?;
        let raw = envelope.into_data()?;
        self.cache.insert(key, raw.clone()).await;
        Ok(raw)
    }

    fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}

#[async_trait]
impl RecordSource for UexClient {
    async fn list_systems(&self) -> Result<Vec<StarSystem>, FetchError> {
        let rows: Vec<StarSystemDto> = self.fetch_records("star_systems", &[]).await?;
        Ok(rows
            .into_iter()
            .map(StarSystem::from)
            .filter(|system| system.is_available)
            .collect())
    }

    async fn list_planets(
        &self,
        system_id: Option<SystemId>,
        planet_id: Option<PlanetId>,
    ) -> Result<Vec<Planet>, FetchError> {
        let mut params = Vec::new();
        push_param(&mut params, "id_star_system", system_id);
        push_param(&mut params, "id_planet", planet_id);
        let rows: Vec<PlanetDto> = self.fetch_records("planets", &params).await?;
        Ok(rows
            .into_iter()
            .map(Planet::from)
            .filter(|planet| planet.is_available)
            .filter(|planet| planet_id.map_or(true, |id| planet.id == id))
            .collect())
    }

    async fn list_terminals(
        &self,
        system_id: Option<SystemId>,
        planet_id: Option<PlanetId>,
        terminal_id: Option<TerminalId>,
    ) -> Result<Vec<Terminal>, FetchError> {
        let mut params = Vec::new();
        push_param(&mut params, "id_star_system", system_id);
        push_param(&mut params, "id_planet", planet_id);
        push_param(&mut params, "id", terminal_id);
        let rows: Vec<TerminalDto> = self.fetch_records("terminals", &params).await?;
        let terminals: Vec<Terminal> = rows
            .into_iter()
            .map(Terminal::from)
            .filter(|terminal| terminal.is_available && terminal.is_commodity())
            .collect();
        debug!(count = terminals.len(), "Loaded commodity terminals");
        Ok(terminals)
    }

    async fn list_buy_offers(
        &self,
        terminal_id: TerminalId,
    ) -> Result<Vec<CommodityOffer>, FetchError> {
        let rows: Vec<CommodityPriceDto> = self
            .fetch_records("commodities_prices", &[("id_terminal", terminal_id.to_string())])
            .await?;
        Ok(available_offers(rows))
    }

    async fn list_sell_offers_for_commodity(
        &self,
        commodity_id: CommodityId,
    ) -> Result<Vec<CommodityOffer>, FetchError> {
        let rows: Vec<CommodityPriceDto> = self
            .fetch_records("commodities_prices", &[("id_commodity", commodity_id.to_string())])
            .await?;
        Ok(available_offers(rows))
    }

    async fn list_routes(
        &self,
        origin_planet_id: PlanetId,
        destination_planet_id: Option<PlanetId>,
    ) -> Result<Vec<TradeCandidate>, FetchError> {
        let mut params = vec![("id_planet_origin", origin_planet_id.to_string())];
        push_param(&mut params, "id_planet_destination", destination_planet_id);
        let rows: Vec<CommodityRouteDto> = self.fetch_records("commodities_routes", &params).await?;
        Ok(rows.into_iter().map(TradeCandidate::from).collect())
    }
}

fn push_param(params: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<i32>) {
    if let Some(value) = value {
        params.push((name, value.to_string()));
    }
}

fn available_offers(rows: Vec<CommodityPriceDto>) -> Vec<CommodityOffer> {
    rows.into_iter()
        .map(CommodityOffer::from)
        .filter(|offer| offer.is_available)
        .collect()
}

#[derive(Debug, Deserialize)]
struct StarSystemDto {
    #[serde(deserialize_with = "id_from_json")]
    id: i32,
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "yes", deserialize_with = "flag_from_json")]
    is_available: bool,
}

impl From<StarSystemDto> for StarSystem {
    fn from(dto: StarSystemDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name.unwrap_or_else(|| "Unknown".to_string()),
            is_available: dto.is_available,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlanetDto {
    #[serde(deserialize_with = "id_from_json")]
    id: i32,
    #[serde(default)]
    name: Option<String>,
    #[serde(deserialize_with = "id_from_json")]
    id_star_system: i32,
    #[serde(default = "yes", deserialize_with = "flag_from_json")]
    is_available: bool,
}

impl From<PlanetDto> for Planet {
    fn from(dto: PlanetDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name.unwrap_or_else(|| "Unknown".to_string()),
            system_id: dto.id_star_system,
            is_available: dto.is_available,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TerminalDto {
    #[serde(deserialize_with = "id_from_json")]
    id: i32,
    #[serde(default)]
    name: Option<String>,
    #[serde(deserialize_with = "id_from_json")]
    id_star_system: i32,
    #[serde(default, deserialize_with = "opt_id_from_json")]
    id_planet: Option<i32>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default = "yes", deserialize_with = "flag_from_json")]
    is_available: bool,
    #[serde(default)]
    city_name: Option<String>,
    #[serde(default)]
    space_station_name: Option<String>,
    #[serde(default, deserialize_with = "opt_number_from_json")]
    mcs: Option<f64>,
}

impl From<TerminalDto> for Terminal {
    fn from(dto: TerminalDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name.unwrap_or_else(|| "Unknown".to_string()),
            system_id: dto.id_star_system,
            planet_id: dto.id_planet.filter(|id| *id > 0),
            kind: dto.kind.unwrap_or_default(),
            is_available: dto.is_available,
            is_city_terminal: is_named(&dto.city_name),
            is_space_station_terminal: is_named(&dto.space_station_name),
            max_container_size: dto.mcs.filter(|mcs| *mcs > 0.0).map(|mcs| mcs as u32),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommodityPriceDto {
    #[serde(deserialize_with = "id_from_json")]
    id_commodity: i32,
    #[serde(default)]
    commodity_name: Option<String>,
    #[serde(deserialize_with = "id_from_json")]
    id_terminal: i32,
    #[serde(default)]
    terminal_name: Option<String>,
    #[serde(default, deserialize_with = "opt_id_from_json")]
    id_star_system: Option<i32>,
    #[serde(default, deserialize_with = "opt_id_from_json")]
    id_planet: Option<i32>,
    #[serde(default = "yes", deserialize_with = "flag_from_json")]
    is_available: bool,
    #[serde(default, deserialize_with = "opt_number_from_json")]
    price_buy: Option<f64>,
    #[serde(default, deserialize_with = "opt_number_from_json")]
    price_sell: Option<f64>,
    #[serde(default, deserialize_with = "scu_from_json")]
    scu_buy: i64,
    #[serde(default, deserialize_with = "scu_from_json")]
    scu_sell_stock: i64,
    #[serde(default, deserialize_with = "scu_from_json")]
    scu_sell_users: i64,
    #[serde(default)]
    city_name: Option<String>,
    #[serde(default)]
    space_station_name: Option<String>,
}

impl From<CommodityPriceDto> for CommodityOffer {
    fn from(dto: CommodityPriceDto) -> Self {
        Self {
            commodity_id: dto.id_commodity,
            commodity_name: dto.commodity_name.unwrap_or_else(|| "Unknown".to_string()),
            terminal_id: dto.id_terminal,
            terminal_name: dto
                .terminal_name
                .unwrap_or_else(|| "Unknown terminal".to_string()),
            system_id: dto.id_star_system.filter(|id| *id > 0),
            planet_id: dto.id_planet.filter(|id| *id > 0),
            is_available: dto.is_available,
            buy_price: dto.price_buy,
            sell_price: dto.price_sell,
            buy_stock_scu: dto.scu_buy,
            sell_stock_scu: dto.scu_sell_stock,
            sell_reserved_scu: dto.scu_sell_users,
            is_city_terminal: is_named(&dto.city_name),
            is_space_station_terminal: is_named(&dto.space_station_name),
        }
    }
}

/// One row of `commodities_routes`: origin and destination already joined.
#[derive(Debug, Deserialize)]
struct CommodityRouteDto {
    #[serde(deserialize_with = "id_from_json")]
    id_commodity: i32,
    #[serde(default)]
    commodity_name: Option<String>,
    #[serde(deserialize_with = "id_from_json")]
    id_terminal_origin: i32,
    #[serde(default)]
    origin_terminal_name: Option<String>,
    #[serde(default, deserialize_with = "opt_id_from_json")]
    id_star_system_origin: Option<i32>,
    #[serde(default, deserialize_with = "opt_id_from_json")]
    id_planet_origin: Option<i32>,
    #[serde(deserialize_with = "id_from_json")]
    id_terminal_destination: i32,
    #[serde(default)]
    destination_terminal_name: Option<String>,
    #[serde(default, deserialize_with = "opt_id_from_json")]
    id_star_system_destination: Option<i32>,
    #[serde(default, deserialize_with = "opt_id_from_json")]
    id_planet_destination: Option<i32>,
    #[serde(default, deserialize_with = "opt_number_from_json")]
    price_origin: Option<f64>,
    #[serde(default, deserialize_with = "opt_number_from_json")]
    price_destination: Option<f64>,
    #[serde(default, deserialize_with = "scu_from_json")]
    scu_origin: i64,
    #[serde(default, deserialize_with = "scu_from_json")]
    scu_destination: i64,
}

impl From<CommodityRouteDto> for TradeCandidate {
    fn from(dto: CommodityRouteDto) -> Self {
        let commodity_name = dto.commodity_name.unwrap_or_else(|| "Unknown".to_string());
        let leg = |terminal_id, terminal_name: Option<String>, system_id, planet_id| CommodityOffer {
            commodity_id: dto.id_commodity,
            commodity_name: commodity_name.clone(),
            terminal_id,
            terminal_name: terminal_name.unwrap_or_else(|| "Unknown terminal".to_string()),
            system_id,
            planet_id,
            is_available: true,
            buy_price: None,
            sell_price: None,
            buy_stock_scu: 0,
            sell_stock_scu: 0,
            sell_reserved_scu: 0,
            is_city_terminal: false,
            is_space_station_terminal: false,
        };

        let mut buy = leg(
            dto.id_terminal_origin,
            dto.origin_terminal_name,
            dto.id_star_system_origin,
            dto.id_planet_origin,
        );
        buy.buy_price = dto.price_origin;
        buy.buy_stock_scu = dto.scu_origin;

        let mut sell = leg(
            dto.id_terminal_destination,
            dto.destination_terminal_name,
            dto.id_star_system_destination,
            dto.id_planet_destination,
        );
        sell.sell_price = dto.price_destination;
        sell.sell_stock_scu = dto.scu_destination;

        TradeCandidate::new(buy, sell)
    }
}

#[derive(Debug, Deserialize)]
struct TradeReceiptDto {
    #[serde(deserialize_with = "trade_id_from_json")]
    id_user_trade: i64,
}

fn is_named(name: &Option<String>) -> bool {
    name.as_deref().is_some_and(|name| !name.trim().is_empty())
}

fn yes() -> bool {
    true
}

/// UEX mixes numbers, numeric strings, booleans and nulls for the same field.
fn opt_number_from_json<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct LenientNumber;

    impl<'de> serde::de::Visitor<'de> for LenientNumber {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a number, numeric string, boolean or null")
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(if value { 1.0 } else { 0.0 }))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value as f64))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value as f64))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            let value = value.trim();
            if value.is_empty() {
                return Ok(None);
            }
            value
                .parse::<f64>()
                .map(Some)
                .map_err(|_| E::invalid_value(serde::de::Unexpected::Str(value), &self))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(LenientNumber)
}

fn opt_id_from_json<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(opt_number_from_json(deserializer)?.map(|value| value as i32))
}

fn id_from_json<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    opt_id_from_json(deserializer)?.ok_or_else(|| serde::de::Error::custom("missing id"))
}

fn trade_id_from_json<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    opt_number_from_json(deserializer)?
        .map(|value| value as i64)
        .ok_or_else(|| serde::de::Error::custom("missing trade id"))
}

fn scu_from_json<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(opt_number_from_json(deserializer)?.map_or(0, |value| value as i64))
}

fn flag_from_json<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(opt_number_from_json(deserializer)?.is_some_and(|value| value != 0.0))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_without_status_is_accepted() {
        let envelope: ApiEnvelope<Value> = serde_json::from_value(json!({ "data": [1, 2] })).unwrap();
        assert_eq!(envelope.into_data().unwrap(), json!([1, 2]));
    }

    #[test]
    fn trade_receipt_envelope_decodes() {
        let envelope: ApiEnvelope<TradeReceiptDto> =
            serde_json::from_value(json!({ "status": "ok", "data": { "id_user_trade": "77" } }))
                .unwrap();
        assert_eq!(envelope.into_data().unwrap().id_user_trade, 77);

        let empty: ApiEnvelope<TradeReceiptDto> =
            serde_json::from_value(json!({ "status": "ok" })).unwrap();
        assert!(matches!(empty.into_data(), Err(UexClientError::Api(_))));
    }

    #[test]
    fn envelope_error_status_carries_message() {
        let envelope: ApiEnvelope<Value> = serde_json::from_value(json!({
            "status": "missing_parameter",
            "data": null,
            "message": "id_terminal required"
        }))
        .unwrap();
        assert!(matches!(
            envelope.into_data(),
            Err(UexClientError::Api(message)) if message == "id_terminal required"
        ));
    }

    #[test]
    fn terminal_flags_come_from_location_names() {
        let dto: TerminalDto = serde_json::from_value(json!({
            "id": "42",
            "name": "Admin - Port Tressler",
            "id_star_system": 68,
            "id_planet": 0,
            "type": "commodity",
            "is_available": 1,
            "city_name": "",
            "space_station_name": "Port Tressler",
            "mcs": 32
        }))
        .unwrap();
        let terminal = Terminal::from(dto);
        assert_eq!(terminal.id, 42);
        assert_eq!(terminal.planet_id, None);
        assert!(terminal.is_commodity());
        assert!(!terminal.is_city_terminal);
        assert!(terminal.is_space_station_terminal);
        assert_eq!(terminal.max_container_size, Some(32));
    }

    #[test]
    fn price_rows_tolerate_strings_and_nulls() {
        let dto: CommodityPriceDto = serde_json::from_value(json!({
            "id_commodity": 1,
            "commodity_name": "Gold",
            "id_terminal": "7",
            "terminal_name": "TDD",
            "id_star_system": 68,
            "id_planet": null,
            "price_buy": "0",
            "price_sell": 15.5,
            "scu_buy": null,
            "scu_sell_stock": "300",
            "scu_sell_users": 50.0,
            "city_name": "Lorville"
        }))
        .unwrap();
        let offer = CommodityOffer::from(dto);
        assert_eq!(offer.terminal_id, 7);
        assert_eq!(offer.planet_id, None);
        assert!(!offer.is_buyable());
        assert_eq!(offer.sell_price, Some(15.5));
        assert_eq!(offer.buy_stock_scu, 0);
        assert_eq!(offer.available_demand_scu(), 250);
        assert!(offer.is_city_terminal);
        assert!(offer.is_available);
    }

    #[test]
    fn route_rows_become_candidates() {
        let dto: CommodityRouteDto = serde_json::from_value(json!({
            "id_commodity": 3,
            "commodity_name": "Laranite",
            "id_terminal_origin": 10,
            "origin_terminal_name": "Origin",
            "id_planet_origin": 4,
            "id_terminal_destination": 11,
            "destination_terminal_name": "Destination",
            "id_planet_destination": 5,
            "price_origin": 25,
            "price_destination": 31,
            "scu_origin": 64,
            "scu_destination": 500
        }))
        .unwrap();
        let candidate = TradeCandidate::from(dto);
        assert_eq!(candidate.commodity_id(), 3);
        assert_eq!(candidate.buy.buy_price, Some(25.0));
        assert_eq!(candidate.buy.planet_id, Some(4));
        assert_eq!(candidate.sell.sell_price, Some(31.0));
        assert_eq!(candidate.sell.available_demand_scu(), 500);
    }

    #[test]
    fn client_errors_map_onto_fetch_errors() {
        let status = UexClientError::Status {
            endpoint: "terminals".into(),
            status: 503,
        };
        assert_eq!(
            FetchError::from(status),
            FetchError::Status {
                endpoint: "terminals".into(),
                status: 503
            }
        );
        assert_eq!(
            FetchError::from(UexClientError::Api("nope".into())),
            FetchError::Api("nope".into())
        );
        let decode = serde_json::from_str::<Value>("{").unwrap_err();
        assert!(matches!(
            FetchError::from(UexClientError::Decode(decode)),
            FetchError::Malformed(_)
        ));
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = UexClient::with_base_url("https://api.uexcorp.uk/2.0").unwrap();
        assert_eq!(
            client.url("terminals").unwrap().as_str(),
            "https://api.uexcorp.uk/2.0/terminals"
        );
    }
}
