//! Keeps a set of interactive annotation overlays in sync with an image
//! viewer: maps pixel rectangles into viewer space, reconciles the live
//! overlays against annotation snapshots, and rescales the accept/reject
//! controls as the viewer zooms.

pub mod affordance;
pub mod config;
pub mod driver;
pub mod frame;
pub mod headless;
pub mod mapper;
pub mod overlay;
pub mod registry;
pub mod scale;
pub mod source;
pub mod viewer;

pub use affordance::{AcknowledgeFn, AffordanceKind, Control, ControlAffordanceProvider};
pub use config::{ConfigError, OverlayConfig};
pub use driver::OverlayDriver;
pub use frame::{FrameScheduler, FrameToken, ManualFrameScheduler};
pub use headless::HeadlessViewer;
pub use overlay::{OverlayElement, OverlayHandle};
pub use registry::{OverlayError, OverlayRegistry, ReconcileReport};
pub use scale::{ScaleConfig, ScaleSynchronizer, scale_factor};
pub use source::{Acknowledgement, AnnotationStore, SourceError, parse_annotations};
pub use viewer::{SubscriptionId, ViewerAdapter, ViewerError, ViewerEventKind};
