use indicatif::{ProgressBar as IndicatifProgressBar, ProgressDrawTarget, ProgressStyle};

/// Shard progress bar for index builds
pub struct ProgressBar {
    pb: IndicatifProgressBar,
}

impl ProgressBar {
    /// Hidden bars keep the same API under --quiet
    pub fn new(quiet: bool) -> Self {
        let pb = IndicatifProgressBar::new(0);
        if quiet {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:.cyan}/{len:.cyan} shards | ETA: {eta}",
        ) {
            pb.set_style(style.progress_chars("█▓▒░ "));
        }
        Self { pb }
    }

    /// Callback for the index builder
    pub fn callback(&self) -> impl Fn(usize, usize) + Send + Sync + 'static {
        let pb = self.pb.clone();
        move |done, total| {
            if pb.length() != Some(total as u64) {
                pb.set_length(total as u64);
            }
            pb.set_position(done as u64);
            if done == total {
                pb.finish_and_clear();
            }
        }
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}
