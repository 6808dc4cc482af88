//! Extraction progress on stderr

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Create a progress bar for page extraction, hidden when `quiet`.
pub fn extraction_bar(quiet: bool) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
    if quiet {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Progress callback updating `pb` with `(completed, total)`.
pub fn callback(pb: &ProgressBar) -> impl Fn(usize, usize) + Send + Sync + 'static {
    let pb = pb.clone();
    move |completed, total| {
        pb.set_length(total as u64);
        pb.set_position(completed as u64);
    }
}
