use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, MutexGuard,
};

use async_trait::async_trait;
use log::{debug, info};

use crate::utils::lock;

use super::{
    AddFrameError, AddFrameRejectedReason, EventHandler, EventKind, FrameEvent, FrameSdk,
    ListenerId, ReadyOptions, SdkError, SessionContext,
};

/// How the in-process host answers a registration request.
#[derive(Debug, Clone)]
pub enum AddFrameBehavior {
    Accept,
    Reject(AddFrameError),
}

enum ContextSource {
    Resolved(Option<SessionContext>),
    Pending,
}

struct Listener {
    id: ListenerId,
    kind: EventKind,
    handler: EventHandler,
}

struct HostState {
    context: ContextSource,
    add_frame: AddFrameBehavior,
    listeners: Vec<Listener>,
    ready_options: Option<ReadyOptions>,
}

/// In-process host used when the view runs outside a real client.
///
/// Dispatches events in subscription order. Handlers are invoked without
/// holding the listener lock, so a handler may subscribe or unsubscribe.
#[derive(Clone)]
pub struct HeadlessSdk {
    state: Arc<Mutex<HostState>>,
    ready_calls: Arc<AtomicUsize>,
    add_frame_calls: Arc<AtomicUsize>,
}

impl HeadlessSdk {
    pub fn new(context: Option<SessionContext>) -> Self {
        Self::with_source(ContextSource::Resolved(context))
    }

    /// A host whose context never resolves.
    pub fn pending() -> Self {
        Self::with_source(ContextSource::Pending)
    }

    fn with_source(context: ContextSource) -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState {
                context,
                add_frame: AddFrameBehavior::Accept,
                listeners: Vec::new(),
                ready_options: None,
            })),
            ready_calls: Arc::new(AtomicUsize::new(0)),
            add_frame_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_add_frame(self, behavior: AddFrameBehavior) -> Self {
        self.lock().add_frame = behavior;
        self
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        lock(&self.state)
    }

    /// Delivers `event` to every listener registered for its kind and
    /// returns how many handlers ran.
    pub fn emit(&self, event: FrameEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<EventHandler> = self
            .lock()
            .listeners
            .iter()
            .filter(|listener| listener.kind == kind)
            .map(|listener| Arc::clone(&listener.handler))
            .collect();

        debug!("host emitting {} to {} listener(s)", kind.as_str(), handlers.len());
        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn listener_count_for(&self, kind: EventKind) -> usize {
        self.lock()
            .listeners
            .iter()
            .filter(|listener| listener.kind == kind)
            .count()
    }

    pub fn ready_calls(&self) -> usize {
        self.ready_calls.load(Ordering::SeqCst)
    }

    pub fn add_frame_calls(&self) -> usize {
        self.add_frame_calls.load(Ordering::SeqCst)
    }

    pub fn last_ready_options(&self) -> Option<ReadyOptions> {
        self.lock().ready_options
    }
}

#[async_trait]
impl FrameSdk for HeadlessSdk {
    async fn context(&self) -> Option<SessionContext> {
        let resolved = match &self.lock().context {
            ContextSource::Resolved(context) => Some(context.clone()),
            ContextSource::Pending => None,
        };

        match resolved {
            Some(context) => context,
            None => std::future::pending().await,
        }
    }

    async fn add_frame(&self) -> Result<(), AddFrameError> {
        self.add_frame_calls.fetch_add(1, Ordering::SeqCst);

        let behavior = {
            let mut state = self.lock();
            let behavior = state.add_frame.clone();
            if let (AddFrameBehavior::Accept, ContextSource::Resolved(Some(context))) =
                (&behavior, &mut state.context)
            {
                context.client.added = true;
            }
            behavior
        };

        match behavior {
            AddFrameBehavior::Accept => {
                info!("host registered frame");
                self.emit(FrameEvent::FrameAdded {
                    notification_details: None,
                });
                Ok(())
            }
            AddFrameBehavior::Reject(err) => {
                let reason = match &err {
                    AddFrameError::RejectedByUser(_) => Some(AddFrameRejectedReason::RejectedByUser),
                    AddFrameError::InvalidDomainManifest(_) => {
                        Some(AddFrameRejectedReason::InvalidDomainManifest)
                    }
                    AddFrameError::Other(_) => None,
                };
                if let Some(reason) = reason {
                    self.emit(FrameEvent::FrameAddRejected { reason });
                }
                Err(err)
            }
        }
    }

    async fn ready(&self, options: ReadyOptions) -> Result<(), SdkError> {
        self.ready_calls.fetch_add(1, Ordering::SeqCst);
        self.lock().ready_options = Some(options);
        Ok(())
    }

    fn on(&self, kind: EventKind, handler: EventHandler) -> ListenerId {
        let id = ListenerId::new();
        self.lock().listeners.push(Listener { id, kind, handler });
        id
    }

    fn off(&self, id: ListenerId) {
        self.lock().listeners.retain(|listener| listener.id != id);
    }

    fn remove_all_listeners(&self) {
        self.lock().listeners.clear();
    }
}
