//! Endpoint handlers, one module per resource.

pub mod files;
pub mod folders;
pub mod health;
