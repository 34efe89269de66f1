//! Request/response pairing.
//!
//! A request is identified by its concrete Rust type. The response type is an
//! associated type, so every request type has exactly one response type.

/// A request value routed through the mediator.
///
/// Requests are plain data. They are moved into the decorated chain and
/// consumed by the handler; nothing in the pipeline mutates them.
///
/// # Example
///
/// ```
/// use mediator_core::Request;
///
/// struct GetStudent {
///     id: u64,
/// }
///
/// struct StudentDetails {
///     name: String,
/// }
///
/// impl Request for GetStudent {
///     type Response = StudentDetails;
/// }
///
/// assert!(GetStudent::type_name().ends_with("GetStudent"));
/// ```
pub trait Request: Send + 'static {
    /// The response produced by a successful dispatch of this request
    type Response: Send + 'static;

    /// Fully qualified type name, used as the request identity in logs and metrics
    #[must_use]
    fn type_name() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}
