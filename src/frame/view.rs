use log::info;
use serde::Serialize;

use crate::{price::PriceReading, sdk::SafeAreaInsets};

use super::FrameState;

pub const INIT_TIMEOUT_MESSAGE: &str = "Initialization timed out";

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Padding {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Padding {
    pub fn from_insets(insets: Option<&SafeAreaInsets>) -> Self {
        let side = |value: Option<f64>| value.filter(|v| v.is_finite()).unwrap_or(0.0).max(0.0);
        match insets {
            Some(insets) => Self {
                top: side(insets.top),
                bottom: side(insets.bottom),
                left: side(insets.left),
                right: side(insets.right),
            },
            None => Self::default(),
        }
    }
}

/// What the price card shows. An error hides both the skeleton and the
/// stale price. A known price stays up while the next poll runs.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PriceCard {
    Skeleton,
    Error { message: String },
    Price { value: f64 },
    Empty,
}

impl PriceCard {
    pub fn from_reading(reading: &PriceReading) -> Self {
        if let Some(message) = &reading.error {
            return PriceCard::Error {
                message: message.clone(),
            };
        }
        match (reading.loading, reading.value) {
            (_, Some(value)) => PriceCard::Price { value },
            (true, None) => PriceCard::Skeleton,
            (false, None) => PriceCard::Empty,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadyView {
    pub title: String,
    pub padding: Padding,
    pub added: bool,
    pub add_frame_result: Option<String>,
    pub contract_address: String,
    pub price: PriceReading,
    pub card: PriceCard,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum FrameView {
    Loading,
    TimedOut { message: String },
    Ready(ReadyView),
}

impl FrameView {
    pub fn build(state: &FrameState, price: PriceReading, title: &str, contract: &str) -> Self {
        use super::LifecycleStatus::*;

        match state.status {
            Uninitialized | Initializing => FrameView::Loading,
            TimedOut => FrameView::TimedOut {
                message: INIT_TIMEOUT_MESSAGE.to_string(),
            },
            Ready => FrameView::Ready(ReadyView {
                title: title.to_string(),
                padding: Padding::from_insets(
                    state
                        .context
                        .as_ref()
                        .and_then(|context| context.client.safe_area_insets.as_ref()),
                ),
                added: state.added,
                add_frame_result: state.add_frame_result.clone(),
                contract_address: contract.to_string(),
                card: PriceCard::from_reading(&price),
                price,
            }),
        }
    }
}

/// The rendering side. Called with the view state locked, so an
/// implementation must not call back into the controller.
pub trait Presenter: Send + Sync {
    fn present(&self, view: &FrameView);
}

/// Writes each view to the log as JSON.
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn present(&self, view: &FrameView) {
        match serde_json::to_string(view) {
            Ok(json) => info!("view: {json}"),
            Err(err) => info!("view: {view:?} (serialize failed: {err})"),
        }
    }
}
