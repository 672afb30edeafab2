pub mod joins;
pub mod selection;
pub mod state;
pub mod status;
pub mod transform;

pub use joins::*;
pub use selection::*;
pub use state::*;
pub use status::*;
pub use transform::*;
