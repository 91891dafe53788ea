pub mod classifier;
pub mod executor;
pub mod rules;
pub mod runner;

pub use classifier::*;
pub use executor::*;
pub use rules::*;
