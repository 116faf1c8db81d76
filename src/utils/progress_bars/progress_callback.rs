// src/utils/progress_bars/progress_callback.rs
use indicatif::ProgressBar;
use std::sync::Arc;

/// Called with `(completed, total)` after each unit of work.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Mirrors completed/total onto an indicatif bar.
pub fn progress_bar_callback(pb: ProgressBar) -> ProgressCallback {
    Arc::new(move |completed: usize, total: usize| {
        if pb.length() != Some(total as u64) {
            pb.set_length(total as u64);
        }
        pb.set_position(completed as u64);
        if completed >= total {
            pb.finish_with_message(format!("Fitted {} trees", total));
        }
    })
}
