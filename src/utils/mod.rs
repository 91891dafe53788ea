pub mod advisor;
pub mod file_operations;

pub use advisor::*;
pub use file_operations::*;
