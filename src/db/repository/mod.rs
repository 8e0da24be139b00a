//! Repository layer: entity-scoped database operations.

mod destination;

pub use destination::*;
