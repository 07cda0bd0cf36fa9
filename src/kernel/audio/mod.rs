pub mod coordinator;

pub use coordinator::{AudioCoordinator, ClipHandle, ClipId, PlaybackGates};
