//! Startup registration of handlers and validators.
//!
//! Registration is explicit: the composition root names every handler and
//! validator. [`MediatorBuilder::build`] checks the registrations, folds the
//! fixed stage order around each handler and hands back an immutable
//! [`Mediator`]. Nothing is discovered or wrapped after that point.

use crate::config::MediatorConfig;
use crate::log_context::TracingLogContext;
use crate::mediator::{Chain, Mediator};
use crate::metrics::PrometheusMetricsSink;
use crate::pipeline::{self, PipelineServices};
use mediator_core::{
    DispatchError, Handler, LogContext, MetricsSink, PersistenceContext, Request, Validator,
};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

type ErasedList = Box<dyn Any + Send + Sync>;
type ValidatorLists = HashMap<TypeId, ErasedList>;
type Assembler = Box<dyn FnOnce(&mut ValidatorLists, &PipelineServices) -> ErasedList + Send>;

struct PendingHandler {
    type_id: TypeId,
    request_type: &'static str,
    assemble: Assembler,
}

struct PendingValidators {
    request_type: &'static str,
    count: usize,
    list: ErasedList,
}

/// Collects registrations and assembles the [`Mediator`].
///
/// # Example
///
/// ```ignore
/// let mediator = Mediator::<SchoolContext>::builder()
///     .handler::<CreateStudent, _>(CreateStudentHandler)
///     .validator::<CreateStudent, _>(create_student::validate)
///     .build()?;
/// ```
pub struct MediatorBuilder<C> {
    config: MediatorConfig,
    handlers: Vec<PendingHandler>,
    validators: HashMap<TypeId, PendingValidators>,
    metrics: Option<Arc<dyn MetricsSink>>,
    log: Option<Arc<dyn LogContext>>,
    _context: PhantomData<fn(&C)>,
}

impl<C: PersistenceContext + 'static> MediatorBuilder<C> {
    /// Create a builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MediatorConfig::default())
    }

    /// Create a builder with the given configuration
    #[must_use]
    pub fn with_config(config: MediatorConfig) -> Self {
        Self {
            config,
            handlers: Vec::new(),
            validators: HashMap::new(),
            metrics: None,
            log: None,
            _context: PhantomData,
        }
    }

    /// Register the handler for request type `R`.
    ///
    /// Registering a second handler for the same type is reported by
    /// [`build`](Self::build) as [`DispatchError::AmbiguousHandler`].
    #[must_use]
    pub fn handler<R, H>(mut self, handler: H) -> Self
    where
        R: Request,
        H: Handler<R, C> + 'static,
    {
        let handler: Arc<dyn Handler<R, C>> = Arc::new(handler);
        self.handlers.push(PendingHandler {
            type_id: TypeId::of::<R>(),
            request_type: R::type_name(),
            assemble: Box::new(move |validators: &mut ValidatorLists, services: &PipelineServices| -> ErasedList {
                let validators = validators
                    .remove(&TypeId::of::<R>())
                    .and_then(|list| list.downcast::<Vec<Arc<dyn Validator<R>>>>().ok())
                    .map(|list| *list)
                    .unwrap_or_default();
                Box::new(pipeline::assemble(handler, validators, services))
            }),
        });
        self
    }

    /// Add a validator for request type `R`.
    ///
    /// Any number of validators may guard one request type. All of them run on
    /// every dispatch, in registration order.
    #[must_use]
    pub fn validator<R, V>(mut self, validator: V) -> Self
    where
        R: Request,
        V: Validator<R> + 'static,
    {
        let entry = self
            .validators
            .entry(TypeId::of::<R>())
            .or_insert_with(|| PendingValidators {
                request_type: R::type_name(),
                count: 0,
                list: Box::new(Vec::<Arc<dyn Validator<R>>>::new()),
            });
        if let Some(list) = entry.list.downcast_mut::<Vec<Arc<dyn Validator<R>>>>() {
            list.push(Arc::new(validator));
            entry.count += 1;
        }
        self
    }

    /// Report dispatch timings to `sink` instead of Prometheus
    #[must_use]
    pub fn metrics_sink(mut self, sink: impl MetricsSink + 'static) -> Self {
        self.metrics = Some(Arc::new(sink));
        self
    }

    /// Push the request type property on `log` instead of a `tracing` span
    #[must_use]
    pub fn log_context(mut self, log: impl LogContext + 'static) -> Self {
        self.log = Some(Arc::new(log));
        self
    }

    /// Check the registrations and assemble one chain per request type.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::AmbiguousHandler`] if a request type has more than one handler
    /// - [`DispatchError::HandlerNotFound`] if validators were added for a request
    ///   type that has no handler
    ///
    /// When several request types are misconfigured the one reported is the
    /// first by name, so the error is stable across runs.
    pub fn build(self) -> Result<Mediator<C>, DispatchError> {
        let mut counts: HashMap<TypeId, (&'static str, usize)> = HashMap::new();
        for pending in &self.handlers {
            counts.entry(pending.type_id).or_insert((pending.request_type, 0)).1 += 1;
        }

        if let Some(&(request_type, count)) = counts
            .values()
            .filter(|(_, count)| *count > 1)
            .min_by_key(|(request_type, _)| *request_type)
        {
            return Err(DispatchError::AmbiguousHandler {
                request_type,
                count,
            });
        }

        if let Some(request_type) = self
            .validators
            .iter()
            .filter(|(type_id, _)| !counts.contains_key(*type_id))
            .map(|(_, pending)| pending.request_type)
            .min()
        {
            return Err(DispatchError::HandlerNotFound { request_type });
        }

        let validator_total: usize = self.validators.values().map(|pending| pending.count).sum();
        let services = PipelineServices {
            metrics: self.metrics.unwrap_or_else(|| {
                Arc::new(PrometheusMetricsSink::new(self.config.slow_request_threshold()))
            }),
            log: self.log.unwrap_or_else(|| Arc::new(TracingLogContext::new())),
            log_property: Arc::from(self.config.request_type_property.as_str()),
        };

        let mut validators: ValidatorLists = self
            .validators
            .into_iter()
            .map(|(type_id, pending)| (type_id, pending.list))
            .collect();

        let mut chains = HashMap::with_capacity(self.handlers.len());
        for pending in self.handlers {
            let handler = (pending.assemble)(&mut validators, &services);
            chains.insert(
                pending.type_id,
                Chain {
                    request_type: pending.request_type,
                    handler,
                },
            );
        }

        tracing::info!(
            handlers = chains.len(),
            validators = validator_total,
            "Mediator pipeline assembled"
        );

        Ok(Mediator::from_parts(chains, self.config))
    }
}

impl<C: PersistenceContext + 'static> Default for MediatorBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}
