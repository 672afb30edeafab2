pub mod assemble;
pub mod types;
pub mod warnings;

pub use assemble::*;
pub use types::*;
pub use warnings::*;
