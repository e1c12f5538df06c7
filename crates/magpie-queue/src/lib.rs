//! Async offload queue for media file I/O.
//!
//! Jobs are fire-and-forget: `submit_*` returns immediately, the worker
//! executes out-of-band, and no result flows back to the caller. The
//! request that submitted a job has usually already committed its
//! database mutation; a failed job leaves an eventual-consistency gap
//! between metadata and disk, which is accepted.

use std::path::PathBuf;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

/// Work shipped to the offload worker. Both kinds are idempotent at the
/// filesystem level: writes overwrite, deletes tolerate missing paths.
#[derive(Debug)]
pub enum Job {
    Write { bytes: Vec<u8>, path: PathBuf },
    Delete { paths: Vec<PathBuf> },
}

/// Cheap, cloneable submit handle.
#[derive(Clone)]
pub struct OffloadQueue {
    tx: UnboundedSender<Job>,
}

impl OffloadQueue {
    /// Create a queue and the receiver to hand to [`run_worker`].
    ///
    /// Returning the receiver separately lets tests inspect submitted
    /// jobs without a running worker.
    pub fn channel() -> (Self, UnboundedReceiver<Job>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn submit_write(&self, bytes: Vec<u8>, path: PathBuf) {
        self.submit(Job::Write { bytes, path });
    }

    pub fn submit_delete(&self, paths: Vec<PathBuf>) {
        self.submit(Job::Delete { paths });
    }

    fn submit(&self, job: Job) {
        // A closed channel means the worker is gone; the caller never
        // waits on job completion, so this is logged and dropped.
        if self.tx.send(job).is_err() {
            warn!("Offload worker is gone, dropping job");
        }
    }
}

/// Worker loop: drains the queue until every submit handle is dropped.
///
/// Job failures are logged and never reported back to the submitter.
pub async fn run_worker(mut rx: UnboundedReceiver<Job>) {
    while let Some(job) = rx.recv().await {
        match job {
            Job::Write { bytes, path } => {
                if let Err(e) = write_file(&bytes, &path).await {
                    warn!("Offload write to {} failed: {}", path.display(), e);
                }
            }
            Job::Delete { paths } => {
                for path in &paths {
                    if let Err(e) = delete_file(path).await {
                        warn!("Offload delete of {} failed: {}", path.display(), e);
                    }
                }
            }
        }
    }
    debug!("Offload queue closed, worker exiting");
}

async fn write_file(bytes: &[u8], path: &PathBuf) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

async fn delete_file(path: &PathBuf) -> anyhow::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!("Deleted {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{} already gone", path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("magpie-queue-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[tokio::test]
    async fn test_write_then_delete() {
        let path = temp_path("a.png");
        let (queue, rx) = OffloadQueue::channel();

        queue.submit_write(vec![1, 2, 3], path.clone());
        queue.submit_delete(vec![path.clone()]);
        drop(queue);

        run_worker(rx).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_write_lands_on_disk() {
        let path = temp_path("b.jpg");
        let (queue, rx) = OffloadQueue::channel();

        queue.submit_write(b"jpegdata".to_vec(), path.clone());
        drop(queue);

        run_worker(rx).await;
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"jpegdata");
    }

    #[tokio::test]
    async fn test_delete_missing_path_is_not_an_error() {
        let path = temp_path("never-written.png");
        let (queue, rx) = OffloadQueue::channel();

        queue.submit_delete(vec![path]);
        drop(queue);

        // Worker must drain without panicking or retry loops.
        run_worker(rx).await;
    }
}
