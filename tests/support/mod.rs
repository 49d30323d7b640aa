#![allow(dead_code)]

pub mod raw_server;
pub mod socket_guard;

use std::sync::Arc;
use std::thread;

use remote_file::RemoteFile;

/// Runs `start()` on a plain thread, the way a pool worker would.
///
/// `start()` drives its own runtime and must not run on a tokio worker.
pub fn start_on_worker_thread(file: &Arc<RemoteFile>) {
    let file = Arc::clone(file);
    thread::spawn(move || file.start())
        .join()
        .expect("download thread panicked");
}
