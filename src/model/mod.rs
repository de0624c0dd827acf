pub mod config;
pub mod filter;
pub mod project;
pub mod state;
pub mod task;
pub mod timestamp;

pub use config::*;
pub use filter::*;
pub use project::*;
pub use state::*;
pub use task::*;
