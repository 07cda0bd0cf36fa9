pub mod config;
pub mod driver;
pub mod error;
pub mod ingress;
pub mod kernel;
pub mod playback;
pub mod services;

pub use config::{MatchPolicy, SyncConfig};
pub use driver::Driver;
pub use kernel::reactor::Reactor;
