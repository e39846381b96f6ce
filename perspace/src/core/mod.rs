mod config;
mod focus;
mod locator;
mod mapper;
mod monitor;
mod persist;
mod placement;
mod shortcuts;
mod window;
mod workspace;

pub mod engine;

pub use config::*;
pub use engine::*;
pub use focus::*;
pub use locator::*;
pub use mapper::*;
pub use monitor::*;
pub use persist::*;
pub use placement::*;
pub use shortcuts::*;
pub use window::*;
pub use workspace::*;
