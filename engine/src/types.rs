use alloy::primitives::{utils::format_units, Address, U256};
use chrono::{DateTime, NaiveDate};
use serde::Serialize;

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Raw (undecimaled) holding of one component inside a token set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub component: Address,
    pub raw_units: U256,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenMeta {
    pub address: Address,
    pub decimals: u8,
    /// Key the price source echoes back, the canonical address text.
    pub symbol: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PricePoint {
    pub token: Address,
    pub price: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValuationSample {
    pub date: NaiveDate,
    pub price: f64,
}

/// Start of the UTC calendar day containing `timestamp`.
pub fn utc_day(timestamp: u64) -> Option<NaiveDate> {
    let day_start = timestamp - timestamp % SECONDS_PER_DAY;
    let secs = i64::try_from(day_start).ok()?;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

/// `raw / 10^decimals`, formatted as an exact decimal string before the float
/// conversion so the scale never drifts from the declared decimals.
pub fn scale_units(raw: U256, decimals: u8) -> Option<f64> {
    format_units(raw, decimals).ok()?.parse::<f64>().ok()
}

/// Sum of holding size times unit price over all components.
pub fn weighted_value<I>(components: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    components
        .into_iter()
        .map(|(amount, price)| amount * price)
        .sum()
}
