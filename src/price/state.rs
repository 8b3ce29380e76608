use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::utils::lock;

/// What the price card renders from.
///
/// A failed poll keeps the last good `value` and only sets `error`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceReading {
    pub value: Option<f64>,
    pub loading: bool,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PriceReading {
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn succeed(&mut self, value: f64, at: DateTime<Utc>) {
        self.value = Some(value);
        self.error = None;
        self.updated_at = Some(at);
    }

    pub fn fail(&mut self, message: String) {
        self.error = Some(message);
    }

    pub fn finish(&mut self) {
        self.loading = false;
    }
}

#[derive(Default)]
struct CellInner {
    reading: PriceReading,
    disposed: bool,
}

/// Shared slot for the latest reading. Writes stop once disposed.
#[derive(Clone, Default)]
pub struct PriceCell {
    inner: Arc<Mutex<CellInner>>,
}

impl PriceCell {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CellInner> {
        lock(&self.inner)
    }

    pub fn snapshot(&self) -> PriceReading {
        self.lock().reading.clone()
    }

    /// Applies `apply` and returns the new reading, or `None` when the cell
    /// has been disposed and nothing was written.
    pub fn update(&self, apply: impl FnOnce(&mut PriceReading)) -> Option<PriceReading> {
        let mut inner = self.lock();
        if inner.disposed {
            return None;
        }
        apply(&mut inner.reading);
        Some(inner.reading.clone())
    }

    pub fn dispose(&self) {
        self.lock().disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }
}
