pub mod client;
pub mod controller;
pub mod error;
pub mod loop_worker;
pub mod state;

pub use client::PriceClient;
pub use controller::PricePoller;
pub use error::PriceError;
pub use loop_worker::{PollOutcome, PollWorker, ReadingListener};
pub use state::{PriceCell, PriceReading};
