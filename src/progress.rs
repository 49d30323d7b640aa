//! Progress bars for running downloads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use remote_file::{RemoteFile, Status};

const POLL_INTERVAL: Duration = Duration::from_millis(120);

/// Spawns the progress UI when requested.
/// Returns (handle, stop) so the caller can signal stop and join the handle.
/// When `enabled` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    enabled: bool,
    files: Vec<Arc<RemoteFile>>,
) -> (Option<JoinHandle<()>>, Arc<AtomicBool>) {
    if !enabled {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    let handle = thread::Builder::new()
        .name("remote-file-progress".to_string())
        .spawn(move || render_until_stopped(&files, &stop_flag))
        .ok();
    (handle, stop)
}

fn render_until_stopped(files: &[Arc<RemoteFile>], stop: &AtomicBool) {
    let multi = MultiProgress::new();
    let bars: Vec<ProgressBar> = files
        .iter()
        .map(|file| {
            let bar = multi.add(ProgressBar::new_spinner());
            bar.set_style(spinner_style());
            bar.set_message(label(file));
            bar
        })
        .collect();

    loop {
        // Read the flag before drawing so the last frame reflects final state.
        let stopping = stop.load(Ordering::SeqCst);
        for (file, bar) in files.iter().zip(&bars) {
            update_bar(file, bar);
        }
        if stopping {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn update_bar(file: &RemoteFile, bar: &ProgressBar) {
    if bar.is_finished() {
        return;
    }
    match file.status() {
        Status::Unknown => {}
        Status::Loading => {
            if let Some(total) = file.bytes_total()
                && bar.length() != Some(total)
            {
                bar.set_style(bar_style());
                bar.set_length(total);
            }
            bar.set_position(file.bytes_read());
            bar.tick();
        }
        Status::Loaded => {
            bar.set_position(file.bytes_read());
            bar.finish_with_message(format!("{} done", label(file)));
        }
        Status::Error => {
            bar.abandon_with_message(format!("{} failed", label(file)));
        }
    }
}

fn label(file: &RemoteFile) -> String {
    file.file_path()
        .file_name()
        .map_or_else(|| file.url().to_string(), |name| name.to_string_lossy().into_owned())
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner} {msg} {bytes}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:30} [{bar:30}] {bytes}/{total_bytes} ({percent}%)")
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}
