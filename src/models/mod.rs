pub mod issue;
pub mod issue_status;
pub mod outcome;
pub mod suite;
pub mod test_case;
pub mod verdict;

pub use issue::*;
pub use issue_status::*;
pub use outcome::*;
pub use suite::*;
pub use test_case::*;
pub use verdict::*;
