//! Capabilities the kernel consumes but does not own: the video's playback
//! clock, the audio output, and the caption display.

pub mod audio;
pub mod caption;
pub mod clock;

pub use audio::{AudioSink, CommandAudioSink, NullAudioSink, PlayerConfig};
pub use caption::{CaptionDisplay, StdoutCaptions};
pub use clock::{PlaybackClock, WallClock};
