//! Alert fan-out.
//!
//! - [`AlertSink`]: one delivery target for fired alerts
//! - [`Dispatcher`]: runs every sink in order, isolating failures
//! - [`ConsoleSink`], [`JsonlSink`], [`StoreSink`]: the built-in targets

pub mod console;
pub mod dispatcher;
pub mod jsonl;
pub mod traits;
pub mod writeback;

pub use console::ConsoleSink;
pub use dispatcher::Dispatcher;
pub use jsonl::JsonlSink;
pub use traits::{AlertSink, DispatchResult, NotifyError};
pub use writeback::{alert_to_point, StoreSink, ALERTS_MEASUREMENT};
