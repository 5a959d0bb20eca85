pub mod actions;
pub mod imports;
pub mod overview;
pub mod project;
pub mod util;

pub use actions::*;
pub use imports::*;
pub use overview::*;
pub use project::*;
pub use util::*;
