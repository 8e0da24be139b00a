pub mod destination;
pub mod task;
pub mod outcome;

pub use destination::*;
pub use task::*;
pub use outcome::*;
