use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub fid: u64,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub pfp_url: Option<String>,
}

/// Layout padding supplied by the host. Any side may be missing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SafeAreaInsets {
    #[serde(default)]
    pub top: Option<f64>,
    #[serde(default)]
    pub bottom: Option<f64>,
    #[serde(default)]
    pub left: Option<f64>,
    #[serde(default)]
    pub right: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDetails {
    pub url: String,
    pub token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientContext {
    #[serde(default)]
    pub client_fid: u64,
    pub added: bool,
    #[serde(default)]
    pub safe_area_insets: Option<SafeAreaInsets>,
    #[serde(default)]
    pub notification_details: Option<NotificationDetails>,
}

/// Snapshot of the user's session as delivered by the host.
///
/// Replaced wholesale on every fetch, never patched in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    #[serde(default)]
    pub user: UserContext,
    pub client: ClientContext,
}

impl SessionContext {
    pub fn with_added(added: bool) -> Self {
        Self {
            client: ClientContext {
                added,
                ..ClientContext::default()
            },
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadyOptions {
    pub disable_native_gestures: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AddFrameRejectedReason {
    InvalidDomainManifest,
    RejectedByUser,
}

impl AddFrameRejectedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddFrameRejectedReason::InvalidDomainManifest => "invalid_domain_manifest",
            AddFrameRejectedReason::RejectedByUser => "rejected_by_user",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    FrameAdded,
    FrameAddRejected,
    FrameRemoved,
    NotificationsEnabled,
    NotificationsDisabled,
    PrimaryButtonClicked,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::FrameAdded,
        EventKind::FrameAddRejected,
        EventKind::FrameRemoved,
        EventKind::NotificationsEnabled,
        EventKind::NotificationsDisabled,
        EventKind::PrimaryButtonClicked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::FrameAdded => "frameAdded",
            EventKind::FrameAddRejected => "frameAddRejected",
            EventKind::FrameRemoved => "frameRemoved",
            EventKind::NotificationsEnabled => "notificationsEnabled",
            EventKind::NotificationsDisabled => "notificationsDisabled",
            EventKind::PrimaryButtonClicked => "primaryButtonClicked",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    FrameAdded {
        notification_details: Option<NotificationDetails>,
    },
    FrameAddRejected {
        reason: AddFrameRejectedReason,
    },
    FrameRemoved,
    NotificationsEnabled {
        notification_details: NotificationDetails,
    },
    NotificationsDisabled,
    PrimaryButtonClicked,
}

impl FrameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            FrameEvent::FrameAdded { .. } => EventKind::FrameAdded,
            FrameEvent::FrameAddRejected { .. } => EventKind::FrameAddRejected,
            FrameEvent::FrameRemoved => EventKind::FrameRemoved,
            FrameEvent::NotificationsEnabled { .. } => EventKind::NotificationsEnabled,
            FrameEvent::NotificationsDisabled => EventKind::NotificationsDisabled,
            FrameEvent::PrimaryButtonClicked => EventKind::PrimaryButtonClicked,
        }
    }
}
