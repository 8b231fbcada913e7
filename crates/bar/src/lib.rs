//! Core of a modal status bar.
//!
//! Modules hold the latest output of independent producers. The [`Bar`]
//! renders every module into one line in a fixed layout whenever anything
//! changes. Related modules are grouped into modes that show a compact
//! summary while collapsed and their detail modules while expanded; at most
//! one mode is expanded at a time, driven by click actions.

pub mod aggregator;
pub mod budget;
pub mod click;
pub mod error;
pub mod modal;
pub mod module;
pub mod output;

pub use aggregator::{Bar, BarBuilder, Line, Placed, RenderSink, SegmentId, Source};
pub use budget::{Budget, ELLIPSIS, Side, truncate, width};
pub use click::{ClickAction, ClickDispatcher, ClickEvent, Launch};
pub use error::{ModalError, SetupError};
pub use modal::{ModalController, ModeKey, ModeSpec, Presentation, Visible};
pub use module::{IntoOutput, ModuleId, ModuleSlot, Producer, once, poll, push, tick};
pub use output::{Button, Color, Output, Segment};
