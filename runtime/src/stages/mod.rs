//! The four decorators wrapped around every registered handler.
//!
//! Each stage implements [`Handler`](mediator_core::Handler) for the same
//! request type as the chain it wraps. Stages hold no per-request state and
//! are shared by every concurrent dispatch of their request type.

pub mod logging;
pub mod metrics;
pub mod transaction;
pub mod validation;

pub use logging::LoggingStage;
pub use metrics::MetricsStage;
pub use transaction::TransactionStage;
pub use validation::{ValidationStage, collect_failures};
