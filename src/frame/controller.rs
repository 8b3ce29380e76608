use std::sync::{Arc, Mutex, MutexGuard, Weak};

use anyhow::{bail, Result};
use chrono::Utc;
use log::debug;
use tokio::{
    sync::{watch, Mutex as AsyncMutex},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    price::{PollOutcome, PollWorker, PriceCell, PriceClient, PricePoller, PriceReading, ReadingListener},
    providers::{ProviderDetail, ProviderStore, ProviderSubscription},
    sdk::{
        AddFrameOutcome, EventHandler, EventKind, FrameEvent, FrameSdk, ReadyOptions,
        SessionContext,
    },
    settings::FrameSettings,
    utils::lock,
};

use super::{FrameState, FrameView, LifecycleStatus, Presenter};
use crate::{log_error, log_info, log_warn};

const ENABLE_LOGS: bool = true;

pub type ProviderObserver = Arc<dyn Fn(&[ProviderDetail]) + Send + Sync>;

struct ControllerInner {
    settings: FrameSettings,
    sdk: Arc<dyn FrameSdk>,
    presenter: Arc<dyn Presenter>,
    providers: Option<Arc<dyn ProviderStore>>,
    provider_observer: Option<ProviderObserver>,
    state: Mutex<FrameState>,
    status_tx: watch::Sender<LifecycleStatus>,
    price: PriceCell,
    poller: AsyncMutex<PricePoller>,
    refresher: PollWorker,
    provider_subscription: Mutex<Option<ProviderSubscription>>,
    load_task: Mutex<Option<JoinHandle<()>>>,
}

pub struct FrameControllerBuilder {
    settings: FrameSettings,
    sdk: Arc<dyn FrameSdk>,
    presenter: Arc<dyn Presenter>,
    providers: Option<Arc<dyn ProviderStore>>,
    provider_observer: Option<ProviderObserver>,
}

impl FrameControllerBuilder {
    pub fn providers(mut self, store: Arc<dyn ProviderStore>) -> Self {
        self.providers = Some(store);
        self
    }

    pub fn provider_observer(mut self, observer: ProviderObserver) -> Self {
        self.provider_observer = Some(observer);
        self
    }

    pub fn build(self) -> Result<FrameController> {
        self.settings.validate()?;
        let client = PriceClient::new(&self.settings)?;
        let interval = self.settings.poll_interval();
        let (status_tx, _) = watch::channel(LifecycleStatus::Uninitialized);

        let inner = Arc::new_cyclic(|weak: &Weak<ControllerInner>| {
            let weak = weak.clone();
            let listener: ReadingListener = Arc::new(move |_: &PriceReading| {
                if let Some(inner) = weak.upgrade() {
                    inner.render();
                }
            });
            let poller = PricePoller::new(client, interval, Some(listener));
            let refresher = poller.worker();

            ControllerInner {
                settings: self.settings,
                sdk: self.sdk,
                presenter: self.presenter,
                providers: self.providers,
                provider_observer: self.provider_observer,
                state: Mutex::new(FrameState::new()),
                status_tx,
                price: refresher.cell().clone(),
                poller: AsyncMutex::new(poller),
                refresher,
                provider_subscription: Mutex::new(None),
                load_task: Mutex::new(None),
            }
        });

        Ok(FrameController { inner })
    }
}

/// Owns one view's lifecycle: SDK initialization, registration, host
/// events and the price poller. Single use: once unmounted it stays down.
#[derive(Clone)]
pub struct FrameController {
    inner: Arc<ControllerInner>,
}

impl FrameController {
    pub fn builder(
        settings: FrameSettings,
        sdk: Arc<dyn FrameSdk>,
        presenter: Arc<dyn Presenter>,
    ) -> FrameControllerBuilder {
        FrameControllerBuilder {
            settings,
            sdk,
            presenter,
            providers: None,
            provider_observer: None,
        }
    }

    pub fn new(
        settings: FrameSettings,
        sdk: Arc<dyn FrameSdk>,
        presenter: Arc<dyn Presenter>,
    ) -> Result<Self> {
        Self::builder(settings, sdk, presenter).build()
    }

    /// Starts initialization and the poller. Returns `false` when the view
    /// was already mounted and nothing new was started.
    pub async fn mount(&self) -> Result<bool> {
        let started = {
            let mut state = self.inner.lock_state();
            if state.disposed {
                bail!("frame view {} is unmounted and cannot mount again", state.view_id);
            }
            state.begin_loading(Utc::now())
        };

        if !started {
            debug!("frame already loading; ignoring repeated mount");
            return Ok(false);
        }

        log_info!("Calling load");
        self.inner.status_tx.send_replace(LifecycleStatus::Initializing);
        self.inner.render();

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { inner.load().await });
        *lock(&self.inner.load_task) = Some(handle);

        self.inner.poller.lock().await.start()?;
        Ok(true)
    }

    /// Releases every host subscription and stops the poller. Safe to call
    /// more than once.
    pub async fn unmount(&self) -> Result<()> {
        let view_id = {
            let mut state = self.inner.lock_state();
            if state.disposed {
                return Ok(());
            }
            state.dispose();
            state.view_id
        };

        log_info!("unmounting frame view {view_id}");
        self.inner.sdk.remove_all_listeners();
        lock(&self.inner.provider_subscription).take();
        if let Some(handle) = lock(&self.inner.load_task).take() {
            handle.abort();
        }

        self.inner.poller.lock().await.stop().await
    }

    /// Asks the host to register the frame and records the outcome.
    pub async fn add_frame(&self) -> AddFrameOutcome {
        self.inner.register().await
    }

    /// One poll outside the timer; dropped if a poll is already running.
    pub async fn refresh_price(&self) -> PollOutcome {
        if !self.inner.is_alive() {
            return PollOutcome::Discarded;
        }
        self.inner.refresher.poll_once().await
    }

    pub fn subscribe_status(&self) -> watch::Receiver<LifecycleStatus> {
        self.inner.status_tx.subscribe()
    }

    pub fn status(&self) -> LifecycleStatus {
        self.inner.lock_state().status
    }

    pub fn is_added(&self) -> bool {
        self.inner.lock_state().added
    }

    pub fn context(&self) -> Option<SessionContext> {
        self.inner.lock_state().context.clone()
    }

    pub fn add_frame_result(&self) -> Option<String> {
        self.inner.lock_state().add_frame_result.clone()
    }

    pub fn price_reading(&self) -> PriceReading {
        self.inner.price.snapshot()
    }

    pub fn view_id(&self) -> Uuid {
        self.inner.lock_state().view_id
    }

    pub fn view(&self) -> FrameView {
        let state = self.inner.lock_state();
        self.inner.build_view(&state)
    }

    pub fn settings(&self) -> &FrameSettings {
        &self.inner.settings
    }
}

impl ControllerInner {
    fn lock_state(&self) -> MutexGuard<'_, FrameState> {
        lock(&self.state)
    }

    fn is_alive(&self) -> bool {
        !self.lock_state().disposed
    }

    fn build_view(&self, state: &FrameState) -> FrameView {
        FrameView::build(
            state,
            self.price.snapshot(),
            &self.settings.title,
            &self.settings.contract_address,
        )
    }

    /// Presents while holding the state lock, so nothing reaches the
    /// presenter before mount or once `disposed` is set.
    fn render(&self) {
        let state = self.lock_state();
        if state.disposed || state.status == LifecycleStatus::Uninitialized {
            return;
        }
        self.presenter.present(&self.build_view(&state));
    }

    /// Applies `change` unless the view is gone, then re-renders.
    fn update(&self, change: impl FnOnce(&mut FrameState)) -> bool {
        let mut state = self.lock_state();
        if state.disposed {
            return false;
        }

        let before = state.status;
        change(&mut state);
        if state.status != before {
            self.status_tx.send_replace(state.status);
        }
        self.presenter.present(&self.build_view(&state));
        true
    }

    async fn load(self: Arc<Self>) {
        let context = match self.settings.context_timeout() {
            Some(limit) => match tokio::time::timeout(limit, self.sdk.context()).await {
                Ok(context) => context,
                Err(_) => {
                    log_warn!("frame context did not resolve within {limit:?}");
                    self.update(FrameState::mark_timed_out);
                    return;
                }
            },
            None => self.sdk.context().await,
        };

        let Some(context) = context else {
            log_info!("host returned no frame context; staying in Initializing");
            return;
        };

        self.finish_loading(context);
    }

    fn finish_loading(self: &Arc<Self>, context: SessionContext) {
        let needs_registration = !context.client.added;
        if !self.update(|state| state.apply_context(context)) {
            log_info!("frame unmounted before its context arrived");
            return;
        }

        if needs_registration {
            let inner = Arc::clone(self);
            tokio::spawn(async move {
                inner.register().await;
            });
        }

        self.subscribe_events();

        log_info!("Calling ready");
        let sdk = Arc::clone(&self.sdk);
        tokio::spawn(async move {
            match sdk.ready(ReadyOptions::default()).await {
                Ok(()) => debug!("host acknowledged ready"),
                Err(err) => log_error!("ready signal failed: {err}"),
            }
        });

        if let Some(subscription) = self.discover_providers() {
            *lock(&self.provider_subscription) = Some(subscription);
        }

        // Unmount may have run while subscriptions were going in.
        if !self.update(FrameState::mark_ready) {
            log_warn!("frame unmounted during load; releasing late subscriptions");
            self.sdk.remove_all_listeners();
            lock(&self.provider_subscription).take();
        }
    }

    fn subscribe_events(self: &Arc<Self>) {
        for kind in EventKind::ALL {
            let weak = Arc::downgrade(self);
            let handler: EventHandler = Arc::new(move |event: &FrameEvent| {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_event(event);
                }
            });
            let id = self.sdk.on(kind, handler);
            debug!("subscribed to {} ({id})", kind.as_str());
        }
    }

    fn handle_event(&self, event: &FrameEvent) {
        if !self.is_alive() {
            return;
        }

        match event {
            FrameEvent::FrameAdded {
                notification_details,
            } => {
                log_info!(
                    "frameAdded (notifications: {})",
                    notification_details.is_some()
                );
                self.update(|state| state.set_added(true));
            }
            FrameEvent::FrameAddRejected { reason } => {
                log_info!("frameAddRejected {}", reason.as_str());
            }
            FrameEvent::FrameRemoved => {
                log_info!("frameRemoved");
                self.update(|state| state.set_added(false));
            }
            FrameEvent::NotificationsEnabled {
                notification_details,
            } => {
                log_info!("notificationsEnabled {}", notification_details.url);
            }
            FrameEvent::NotificationsDisabled => log_info!("notificationsDisabled"),
            FrameEvent::PrimaryButtonClicked => log_info!("primaryButtonClicked"),
        }
    }

    async fn register(&self) -> AddFrameOutcome {
        let outcome = AddFrameOutcome::from(self.sdk.add_frame().await);
        match &outcome {
            AddFrameOutcome::Added => log_info!("frame registration accepted"),
            other => log_warn!("frame registration did not complete: {}", other.describe()),
        }

        if !self.update(|state| state.record_add_frame(&outcome)) {
            debug!("dropping registration result; view unmounted");
        }
        outcome
    }

    fn discover_providers(&self) -> Option<ProviderSubscription> {
        let store = self.providers.as_ref()?;
        log_info!("discovering wallet providers ({} known)", store.providers().len());

        let observer = self.provider_observer.clone();
        Some(store.subscribe(Arc::new(move |providers: &[ProviderDetail]| {
            let names: Vec<&str> = providers
                .iter()
                .map(|provider| provider.info.name.as_str())
                .collect();
            log_info!("provider details: {names:?}");
            if let Some(observer) = &observer {
                observer(providers);
            }
        })))
    }
}
