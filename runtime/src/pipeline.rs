//! Fixed decorator order and chain assembly.
//!
//! [`PIPELINE_ORDER`] lists stages from outermost to innermost. [`assemble`]
//! folds them around a handler, innermost first, producing the single chain
//! a request type is dispatched through for the life of the mediator.

use crate::stages::{LoggingStage, MetricsStage, TransactionStage, ValidationStage};
use mediator_core::{Handler, LogContext, MetricsSink, PersistenceContext, Request, Validator};
use std::fmt;
use std::sync::Arc;

/// One decorator in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Unit of work around everything below it
    Transaction,
    /// Field-level request validation
    Validation,
    /// Elapsed-time recording
    Metrics,
    /// Scoped log property
    Logging,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transaction => write!(f, "transaction"),
            Self::Validation => write!(f, "validation"),
            Self::Metrics => write!(f, "metrics"),
            Self::Logging => write!(f, "logging"),
        }
    }
}

/// Outermost first. The first stage to see a request is the last to see its result.
pub const PIPELINE_ORDER: [Stage; 4] = [
    Stage::Transaction,
    Stage::Validation,
    Stage::Metrics,
    Stage::Logging,
];

/// Shared services threaded into the stages that need them.
#[derive(Clone)]
pub struct PipelineServices {
    /// Receives one timing record per dispatch
    pub metrics: Arc<dyn MetricsSink>,
    /// Source of the scoped request-type log property
    pub log: Arc<dyn LogContext>,
    /// Key the request type is pushed under
    pub log_property: Arc<str>,
}

impl fmt::Debug for PipelineServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineServices")
            .field("log_property", &self.log_property)
            .finish_non_exhaustive()
    }
}

/// Wrap `handler` in every stage of [`PIPELINE_ORDER`].
#[must_use]
pub fn assemble<R, C>(
    handler: Arc<dyn Handler<R, C>>,
    validators: Vec<Arc<dyn Validator<R>>>,
    services: &PipelineServices,
) -> Arc<dyn Handler<R, C>>
where
    R: Request,
    C: PersistenceContext + 'static,
{
    let mut validators = Some(validators);

    PIPELINE_ORDER.iter().rev().fold(
        handler,
        |inner, stage| -> Arc<dyn Handler<R, C>> {
            match stage {
                Stage::Logging => Arc::new(LoggingStage::new(
                    inner,
                    Arc::clone(&services.log),
                    Arc::clone(&services.log_property),
                )),
                Stage::Metrics => Arc::new(MetricsStage::new(inner, Arc::clone(&services.metrics))),
                Stage::Validation => Arc::new(ValidationStage::new(
                    inner,
                    validators.take().unwrap_or_default(),
                )),
                Stage::Transaction => Arc::new(TransactionStage::new(inner)),
            }
        },
    )
}
