use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub symbol: String,
    pub timestamp_ms: i64,
    pub price: f64,
    pub size: f64,
}

impl Tick {
    /// Builds a tick from the raw ingestion fields, normalizing the symbol to
    /// lower case and rejecting values the store must never hold.
    pub fn from_raw(timestamp: &str, symbol: &str, price: f64, size: f64) -> Result<Self, String> {
        let symbol = symbol.trim().to_lowercase();
        if symbol.is_empty() {
            return Err("symbol is empty".to_string());
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(format!("price must be finite and > 0 (got {price})"));
        }
        if !size.is_finite() || size < 0.0 {
            return Err(format!("size must be finite and >= 0 (got {size})"));
        }
        Ok(Self {
            symbol,
            timestamp_ms: parse_timestamp_ms(timestamp)?,
            price,
            size,
        })
    }
}

/// Tick as posted by a market-data collector: `{"symbol", "ts", "price", "size"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTick {
    pub symbol: String,
    pub ts: String,
    pub price: f64,
    pub size: f64,
}

impl RawTick {
    pub fn validate(&self) -> Result<Tick, String> {
        Tick::from_raw(&self.ts, &self.symbol, self.price, self.size)
    }
}

pub fn parse_timestamp_ms(value: &str) -> Result<i64, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("empty timestamp".to_string());
    }
    if let Ok(epoch_ms) = trimmed.parse::<i64>() {
        return Ok(epoch_ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive).timestamp_millis());
        }
    }

    Err(format!("unsupported timestamp format: {value}"))
}

pub fn format_timestamp_ms(timestamp_ms: i64) -> String {
    match Utc.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => timestamp_ms.to_string(),
    }
}
