//! Pure, single-threaded synchronization kernel.
//!
//! Nothing in here awaits I/O or reads wall-clock time. External occurrences
//! arrive as [`event::Event`]s, outward actions leave as
//! [`effect::SideEffect`]s.

pub mod audio;
pub mod cancel;
pub mod effect;
pub mod event;
pub mod gate;
pub mod reactor;
pub mod segment;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod time;
pub mod timeline;
