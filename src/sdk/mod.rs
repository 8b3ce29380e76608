pub mod headless;
pub mod types;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use headless::{AddFrameBehavior, HeadlessSdk};
pub use types::{
    AddFrameRejectedReason, ClientContext, EventKind, FrameEvent, NotificationDetails,
    ReadyOptions, SafeAreaInsets, SessionContext, UserContext,
};

pub type EventHandler = Arc<dyn Fn(&FrameEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddFrameError {
    #[error("{0}")]
    RejectedByUser(String),
    #[error("{0}")]
    InvalidDomainManifest(String),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SdkError {
    #[error("host did not acknowledge ready: {0}")]
    Ready(String),
}

/// Result of one registration attempt, kept for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddFrameOutcome {
    Added,
    RejectedByUser(String),
    InvalidManifest(String),
    Other(String),
}

impl AddFrameOutcome {
    pub fn describe(&self) -> String {
        match self {
            AddFrameOutcome::Added => "Added".to_string(),
            AddFrameOutcome::RejectedByUser(message)
            | AddFrameOutcome::InvalidManifest(message) => format!("Not added: {message}"),
            AddFrameOutcome::Other(message) => format!("Error: {message}"),
        }
    }
}

impl From<Result<(), AddFrameError>> for AddFrameOutcome {
    fn from(result: Result<(), AddFrameError>) -> Self {
        match result {
            Ok(()) => AddFrameOutcome::Added,
            Err(AddFrameError::RejectedByUser(message)) => AddFrameOutcome::RejectedByUser(message),
            Err(AddFrameError::InvalidDomainManifest(message)) => {
                AddFrameOutcome::InvalidManifest(message)
            }
            Err(AddFrameError::Other(message)) => AddFrameOutcome::Other(message),
        }
    }
}

/// The host runtime's embedding SDK as seen by a single view.
#[async_trait]
pub trait FrameSdk: Send + Sync {
    /// Resolves to the session context, or `None` when the host has none.
    async fn context(&self) -> Option<SessionContext>;

    async fn add_frame(&self) -> Result<(), AddFrameError>;

    async fn ready(&self, options: ReadyOptions) -> Result<(), SdkError>;

    fn on(&self, kind: EventKind, handler: EventHandler) -> ListenerId;

    fn off(&self, id: ListenerId);

    /// Drops every listener in one step.
    fn remove_all_listeners(&self);
}
