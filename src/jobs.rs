//! Background work for decoding textures and parsing models.
//!
//! Jobs run off the UI thread and hand their results back through a channel.
//! The owner drains completions with [`JobQueue::drain`] once per frame, so all
//! state changes still happen on the main thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Where jobs execute.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, job: Job);
}

/// Fixed pool of named worker threads pulling from one shared queue.
///
/// Dropping the dispatcher closes the queue. Workers finish the job in hand
/// and exit on their own; nothing waits for them.
pub struct ThreadDispatch {
    sender: flume::Sender<Job>,
}

impl ThreadDispatch {
    pub fn new(threads: usize) -> std::io::Result<Self> {
        let (sender, receiver) = flume::unbounded::<Job>();
        let threads = threads.max(1);
        for index in 0..threads {
            let receiver = receiver.clone();
            std::thread::Builder::new()
                .name(format!("shadelab-loader-{index}"))
                .spawn(move || {
                    for job in receiver.iter() {
                        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                            log::error!("loader job panicked");
                        }
                    }
                })?;
        }
        log::debug!("started {} loader thread(s)", threads);
        Ok(Self { sender })
    }
}

impl Dispatch for ThreadDispatch {
    fn dispatch(&self, job: Job) {
        if self.sender.send(job).is_err() {
            log::warn!("loader threads have exited; dropping job");
        }
    }
}

/// Runs each job immediately on the calling thread. Completions still queue up
/// until drained, which keeps ordering deterministic in tests.
#[derive(Debug, Default)]
pub struct InlineDispatch {
    dispatched: AtomicUsize,
}

impl InlineDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }
}

impl Dispatch for InlineDispatch {
    fn dispatch(&self, job: Job) {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
        job();
    }
}

/// Typed results of jobs spawned through one dispatcher.
pub struct JobQueue<T> {
    dispatch: Arc<dyn Dispatch>,
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Send + 'static> JobQueue<T> {
    pub fn new(dispatch: Arc<dyn Dispatch>) -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            dispatch,
            sender,
            receiver,
        }
    }

    /// Queues `work`. If it panics, `recover` produces the result instead, so
    /// every spawn yields exactly one completion.
    pub fn spawn<F, R>(&self, work: F, recover: R)
    where
        F: FnOnce() -> T + Send + 'static,
        R: FnOnce() -> T + Send + 'static,
    {
        let sender = self.sender.clone();
        self.dispatch.dispatch(Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|_| recover());
            // the queue may be gone if the viewer shut down mid-load
            let _ = sender.send(result);
        }));
    }

    /// Completed results, oldest first. Never blocks.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn inline_results_wait_for_drain() {
        let dispatch = Arc::new(InlineDispatch::new());
        let queue: JobQueue<u32> = JobQueue::new(dispatch.clone());
        queue.spawn(|| 1, || 0);
        queue.spawn(|| 2, || 0);
        assert_eq!(dispatch.dispatched(), 2);
        assert_eq!(queue.drain(), vec![1, 2]);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn thread_dispatch_delivers_results() {
        let dispatch: Arc<dyn Dispatch> = Arc::new(ThreadDispatch::new(2).unwrap());
        let queue: JobQueue<usize> = JobQueue::new(dispatch);
        for i in 0..8 {
            queue.spawn(move || i * 10, || usize::MAX);
        }

        let mut results = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(5);
        while results.len() < 8 && Instant::now() < deadline {
            results.extend(queue.drain());
            std::thread::sleep(Duration::from_millis(1));
        }
        results.sort_unstable();
        assert_eq!(results, (0..8).map(|i| i * 10).collect::<Vec<_>>());
    }

    #[test]
    fn panicking_job_still_completes() {
        let queue: JobQueue<Result<u32, String>> = JobQueue::new(Arc::new(InlineDispatch::new()));
        queue.spawn(|| panic!("parser blew up"), || Err("crashed".to_string()));
        queue.spawn(|| Ok(3), || Err("crashed".to_string()));
        assert_eq!(queue.drain(), vec![Err("crashed".to_string()), Ok(3)]);
    }

    #[test]
    fn worker_survives_a_panicking_job() {
        let dispatch = ThreadDispatch::new(1).unwrap();
        dispatch.dispatch(Box::new(|| panic!("raw job")));
        let queue: JobQueue<u32> = JobQueue::new(Arc::new(dispatch));
        queue.spawn(|| 42, || 0);

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut results = Vec::new();
        while results.is_empty() && Instant::now() < deadline {
            results.extend(queue.drain());
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(results, vec![42]);
    }
}
