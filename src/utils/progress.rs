/// Progress bars shared by the long-running passes
use indicatif::{ProgressBar, ProgressStyle};

pub fn create_progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░")
}

/// A bar with the standard style, or a hidden one when `visible` is false.
pub fn create_progress_bar(len: u64, message: &str, visible: bool) -> ProgressBar {
    let pb = if visible {
        ProgressBar::new(len)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(create_progress_style());
    pb.set_message(message.to_string());
    pb
}
