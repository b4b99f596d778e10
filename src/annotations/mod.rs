//! Annotation input: data model, JSON wire format and filtering.

pub mod filter;
pub mod json;
pub mod model;
