pub mod controller;
pub mod state;
pub mod view;

pub use controller::{FrameController, FrameControllerBuilder, ProviderObserver};
pub use state::{FrameState, LifecycleStatus};
pub use view::{FrameView, LogPresenter, Padding, PriceCard, Presenter, ReadyView};
