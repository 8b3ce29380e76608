use anyhow::{Context, Result};
use log::debug;
use serde_json::Value;

use crate::settings::FrameSettings;

use super::PriceError;

pub const VS_CURRENCY: &str = "usd";

#[derive(Clone)]
pub struct PriceClient {
    http: reqwest::Client,
    api_url: String,
    contract_address: String,
}

impl PriceClient {
    pub fn new(settings: &FrameSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("failed to build price HTTP client")?;

        Ok(Self {
            http,
            api_url: settings.api_url.clone(),
            contract_address: settings.contract_address.clone(),
        })
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    /// One lookup of the contract's USD price.
    pub async fn fetch_price(&self) -> Result<f64, PriceError> {
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("contract_addresses", self.contract_address.as_str()),
                ("vs_currencies", VS_CURRENCY),
            ])
            .send()
            .await
            .map_err(PriceError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PriceError::Status(status));
        }

        let bytes = response.bytes().await.map_err(PriceError::Transport)?;
        let body: Value = serde_json::from_slice(&bytes).map_err(PriceError::Decode)?;
        let price = extract_usd(&body, &self.contract_address)?;
        debug!("fetched price {price} for {}", self.contract_address);
        Ok(price)
    }
}

/// Reads `body[<lower-cased contract>].usd`. Missing, zero, NaN and
/// non-numeric values are all rejected.
pub fn extract_usd(body: &Value, contract_address: &str) -> Result<f64, PriceError> {
    body.get(contract_address.to_lowercase())
        .and_then(|entry| entry.get(VS_CURRENCY))
        .and_then(Value::as_f64)
        .filter(|price| *price != 0.0 && !price.is_nan())
        .ok_or(PriceError::InvalidData)
}
