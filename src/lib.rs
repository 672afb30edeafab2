pub mod api;
pub mod builder;
pub mod catalog;
pub mod cli;
pub mod plan;
pub mod steps;
pub mod view;

pub use builder::BuilderState;
pub use catalog::Catalog;
pub use cli::{Cli, Commands};
pub use steps::{can_advance, Step};
pub use view::{assemble_view, compute_warnings, ViewDefinition};
