//! Client for the price-history endpoint (`POST {base}/history`) of the swap API.

use alloy::primitives::Address;
use reqwest::Client;
use serde::{Deserialize, Serialize, Serializer};
use setchart_common::address::canonical;
use url::Url;

use crate::Reqwest;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuyToken {
    #[serde(serialize_with = "serialize_canonical")]
    pub token_address: Address,
    pub decimals: u8,
    pub symbol: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub buy_tokens: Vec<BuyToken>,
    pub start_block: u64,
    pub precision: bool,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub symbol: String,
    #[serde(default)]
    pub token_address: Option<String>,
    pub prices: Vec<f64>,
}

fn serialize_canonical<S: Serializer>(address: &Address, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&canonical(address))
}

pub struct PriceHistoryApi {
    base_url: Url,
    client: Client,
}

impl PriceHistoryApi {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }

    pub fn history_url(&self) -> String {
        format!("{}/history", self.base_url.as_str().trim_end_matches('/'))
    }

    pub async fn history(&self, request: &HistoryRequest) -> crate::Result<Vec<HistoryEntry>> {
        tracing::debug!(
            start_block = request.start_block,
            tokens = request.buy_tokens.len(),
            precision = request.precision,
            "requesting price history"
        );

        Reqwest::post(&self.client, self.history_url())?
            .json_body(request)
            .receive_json::<Vec<HistoryEntry>>()
            .await
    }
}
