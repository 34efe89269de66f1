//! University enrollment service.
//!
//! A small student registry served over HTTP. Every request is dispatched
//! through the mediator, so each one runs in its own transaction, is
//! validated before the handler sees it, and is timed and logged.
//!
//! # Wiring
//!
//! ```ignore
//! let store = SchoolStore::new();
//! let mediator = Arc::new(mediator_builder(MediatorConfig::from_env()?).build()?);
//! ensure_routed(&mediator)?;
//!
//! let state = AppState::new(mediator, move || store.context());
//! let app = build_router(api::routes(), state);
//! ```

pub mod api;
pub mod features;
pub mod school;

use features::students::{
    CreateStudent, CreateStudentHandler, EnrollmentDateRules, ListStudents, ListStudentsHandler,
    StudentDetails, StudentDetailsHandler, student_name_rules,
};
use mediator_core::DispatchError;
use mediator_runtime::{Mediator, MediatorBuilder, MediatorConfig};
use school::SchoolContext;

/// Register every handler and validator of the service.
#[must_use]
pub fn mediator_builder(config: MediatorConfig) -> MediatorBuilder<SchoolContext> {
    MediatorBuilder::with_config(config)
        .handler::<CreateStudent, _>(CreateStudentHandler)
        .validator::<CreateStudent, _>(student_name_rules)
        .validator::<CreateStudent, _>(EnrollmentDateRules::new())
        .handler::<ListStudents, _>(ListStudentsHandler)
        .handler::<StudentDetails, _>(StudentDetailsHandler)
}

/// Fail fast if a request type served by [`api::routes`] has no handler.
///
/// # Errors
///
/// Returns [`DispatchError::HandlerNotFound`] naming the first missing type.
pub fn ensure_routed(mediator: &Mediator<SchoolContext>) -> Result<(), DispatchError> {
    mediator.ensure_handler::<CreateStudent>()?;
    mediator.ensure_handler::<ListStudents>()?;
    mediator.ensure_handler::<StudentDetails>()
}
