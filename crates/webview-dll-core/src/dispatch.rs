//! FIFO queue of dispatch jobs, filled from any thread and drained on the
//! loop thread.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use webview_dll_common::Handle;

use crate::callbacks::HandleCallback;

/// One pending dispatch. Consumed exactly once.
#[derive(Clone)]
pub struct DispatchJob {
    pub handle: Handle,
    pub callback: Arc<dyn HandleCallback>,
}

impl DispatchJob {
    pub fn run(self) {
        self.callback.invoke(self.handle);
    }
}

#[derive(Clone, Default)]
pub struct DispatchQueue {
    jobs: Arc<Mutex<VecDeque<DispatchJob>>>,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, job: DispatchJob) {
        self.lock().push_back(job);
    }

    /// Pop the oldest job. The lock is released before the caller runs it.
    pub fn pop(&self) -> Option<DispatchJob> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<DispatchJob>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_job(handle: u64, log: &Arc<Mutex<Vec<u64>>>, tag: u64) -> DispatchJob {
        let log = Arc::clone(log);
        DispatchJob {
            handle: Handle::from_raw(handle),
            callback: Arc::new(move |h: Handle| log.lock().unwrap().push(h.as_raw() * 100 + tag)),
        }
    }

    #[test]
    fn jobs_come_out_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let queue = DispatchQueue::new();
        queue.push(recording_job(1, &log, 1));
        queue.push(recording_job(2, &log, 2));
        queue.push(recording_job(1, &log, 3));
        assert_eq!(queue.len(), 3);

        while let Some(job) = queue.pop() {
            job.run();
        }
        assert!(queue.is_empty());
        assert_eq!(*log.lock().unwrap(), vec![101, 202, 103]);
    }

    #[test]
    fn job_may_enqueue_more_work() {
        let queue = DispatchQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let inner_queue = queue.clone();
        let inner_log = Arc::clone(&log);
        queue.push(DispatchJob {
            handle: Handle::from_raw(1),
            callback: Arc::new(move |h: Handle| {
                inner_queue.push(recording_job(h.as_raw(), &inner_log, 9));
            }),
        });

        while let Some(job) = queue.pop() {
            job.run();
        }
        assert_eq!(*log.lock().unwrap(), vec![109]);
    }

    #[test]
    fn clones_share_one_queue() {
        let queue = DispatchQueue::new();
        let other = queue.clone();
        other.push(DispatchJob {
            handle: Handle::from_raw(4),
            callback: Arc::new(|_h: Handle| {}),
        });
        assert_eq!(queue.len(), 1);
    }
}
