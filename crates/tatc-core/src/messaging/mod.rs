//! Outbound chat delivery.

pub mod port;
pub mod throttled;

pub use port::ChatSink;
pub use throttled::{ThrottleConfig, ThrottledSink};
