use super::batch::{Batch, BatchProcessor};
use crate::error::{AnnotateError, Result};
use crate::types::AnnotatedVariant;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::error;

type BatchResult = Result<Vec<AnnotatedVariant>>;

struct Job {
    batch: Batch,
    reply: Sender<BatchResult>,
}

/// The eventual result of one submitted batch.
pub struct PendingBatch {
    index: usize,
    len: usize,
    rx: Receiver<BatchResult>,
}

impl PendingBatch {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Block until the batch has been processed.
    pub fn wait(self) -> BatchResult {
        let index = self.index;
        self.rx
            .recv()
            .unwrap_or(Err(AnnotateError::WorkerLost { batch: index }))
    }
}

/// Fixed set of worker threads pulling batches off a shared channel.
pub struct WorkerPool {
    handles: Vec<thread::JoinHandle<()>>,
    tx: Option<Sender<Job>>,
}

impl WorkerPool {
    pub fn new<P: BatchProcessor + ?Sized + 'static>(processor: Arc<P>, num_threads: usize) -> Result<Self> {
        let (tx, rx) = bounded::<Job>(num_threads);
        let mut handles = Vec::with_capacity(num_threads);

        for idx in 0..num_threads {
            let rx = rx.clone();
            let worker_processor = Arc::clone(&processor);
            let handle = thread::Builder::new()
                .name(format!("annotate-worker-{}", idx))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        let result = worker_processor.process(&job.batch);
                        // Receiver is gone if the run already aborted
                        let _ = job.reply.send(result);
                    }
                })?;
            handles.push(handle);
        }

        Ok(WorkerPool {
            handles,
            tx: Some(tx),
        })
    }

    /// Queue a batch and return the handle its result will arrive on.
    pub fn submit(&self, batch: Batch) -> Result<PendingBatch> {
        let index = batch.index;
        let len = batch.len();
        let (reply, rx) = bounded(1);

        self.tx
            .as_ref()
            .ok_or(AnnotateError::WorkerLost { batch: index })?
            .send(Job { batch, reply })
            .map_err(|_| AnnotateError::WorkerLost { batch: index })?;

        Ok(PendingBatch { index, len, rx })
    }

    /// Close the queue and wait for every worker to exit.
    pub fn finish(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.tx.take());
        for (idx, handle) in self.handles.drain(..).enumerate() {
            if handle.join().is_err() {
                error!(worker = idx, "annotation worker panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
