pub mod list;
pub mod poll;
pub mod run;

pub use list::*;
pub use poll::*;
pub use run::*;
