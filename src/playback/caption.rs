use std::io::Write;

/// Where resolved caption text goes. `None` blanks the display.
pub trait CaptionDisplay {
    fn show(&mut self, text: Option<&str>);
}

/// Writes each caption change as one line on stdout.
#[derive(Debug, Default)]
pub struct StdoutCaptions;

impl CaptionDisplay for StdoutCaptions {
    fn show(&mut self, text: Option<&str>) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "[caption] {}", text.unwrap_or(""));
    }
}
