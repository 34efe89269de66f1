//! Request types, validators and handlers, one module per feature.

pub mod students;
