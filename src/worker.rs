//! Background job runner used for image decoding and saves.
//!
//! Jobs go in through `submit`, results come back through `drain`, which never
//! blocks. The inline backend runs the handler during `submit` but still hands
//! the result out through `drain`, so callers see the same ordering either way.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

type Handler<J, R> = Box<dyn FnMut(J) -> R + Send>;

enum Backend<J, R> {
    Thread {
        tx: Option<mpsc::Sender<J>>,
        rx: mpsc::Receiver<R>,
        handle: Option<thread::JoinHandle<()>>,
    },
    Inline {
        handler: Handler<J, R>,
        done: VecDeque<R>,
    },
}

/// Where a worker runs its jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    #[default]
    Threaded,
    /// Synchronously inside `submit`; used by tests and headless tools.
    Inline,
}

pub struct Worker<J, R> {
    name: String,
    backend: Backend<J, R>,
    in_flight: usize,
}

impl<J: Send + 'static, R: Send + 'static> Worker<J, R> {
    /// Run jobs on a dedicated named thread.
    pub fn spawn<F>(name: &str, mut handler: F) -> std::io::Result<Self>
    where
        F: FnMut(J) -> R + Send + 'static,
    {
        let (tx, job_rx) = mpsc::channel::<J>();
        let (result_tx, rx) = mpsc::channel::<R>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    if result_tx.send(handler(job)).is_err() {
                        break;
                    }
                }
            })?;
        log::debug!("Spawned {} worker", name);
        Ok(Self {
            name: name.to_string(),
            backend: Backend::Thread {
                tx: Some(tx),
                rx,
                handle: Some(handle),
            },
            in_flight: 0,
        })
    }

    pub fn start<F>(name: &str, execution: Execution, handler: F) -> std::io::Result<Self>
    where
        F: FnMut(J) -> R + Send + 'static,
    {
        match execution {
            Execution::Threaded => Self::spawn(name, handler),
            Execution::Inline => Ok(Self::inline(name, handler)),
        }
    }

    /// Run each job synchronously inside `submit`.
    pub fn inline<F>(name: &str, handler: F) -> Self
    where
        F: FnMut(J) -> R + Send + 'static,
    {
        Self {
            name: name.to_string(),
            backend: Backend::Inline {
                handler: Box::new(handler),
                done: VecDeque::new(),
            },
            in_flight: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hands the job back if the worker thread is gone.
    pub fn submit(&mut self, job: J) -> Result<(), J> {
        match &mut self.backend {
            Backend::Thread { tx, .. } => match tx {
                Some(tx) => tx.send(job).map_err(|err| err.0)?,
                None => return Err(job),
            },
            Backend::Inline { handler, done } => done.push_back(handler(job)),
        }
        self.in_flight += 1;
        Ok(())
    }

    pub fn drain(&mut self) -> Vec<R> {
        let mut results = Vec::new();
        match &mut self.backend {
            Backend::Thread { rx, .. } => {
                while let Ok(result) = rx.try_recv() {
                    results.push(result);
                }
            }
            Backend::Inline { done, .. } => results.extend(done.drain(..)),
        }
        self.in_flight = self.in_flight.saturating_sub(results.len());
        results
    }

    /// Block for at most `timeout` waiting for the next result.
    pub fn wait(&mut self, timeout: Duration) -> Option<R> {
        let result = match &mut self.backend {
            Backend::Thread { rx, .. } => rx.recv_timeout(timeout).ok(),
            Backend::Inline { done, .. } => done.pop_front(),
        };
        if result.is_some() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        result
    }

    /// Jobs submitted whose results have not been drained yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Stop accepting jobs, wait for queued ones to finish, and return every
    /// result not yet drained.
    pub fn finish(&mut self) -> Vec<R> {
        if let Backend::Thread { tx, handle, .. } = &mut self.backend {
            tx.take();
            if let Some(handle) = handle.take() {
                if handle.join().is_err() {
                    log::warn!("{} worker panicked", self.name);
                }
            }
        }
        self.drain()
    }
}

/// Run `f`, returning the panic message instead of unwinding. Handlers that
/// call into stores or fetchers go through this.
pub fn catch_panic<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl<J, R> Drop for Worker<J, R> {
    fn drop(&mut self) {
        if let Backend::Thread { tx, handle, .. } = &mut self.backend {
            tx.take();
            if let Some(handle) = handle.take() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn drain_until<J: Send + 'static, R: Send + 'static>(
        worker: &mut Worker<J, R>,
        count: usize,
    ) -> Vec<R> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut out = Vec::new();
        while out.len() < count && Instant::now() < deadline {
            out.extend(worker.drain());
            thread::sleep(Duration::from_millis(1));
        }
        out
    }

    #[test]
    fn inline_results_wait_for_drain() {
        let mut worker = Worker::inline("double", |value: u32| value * 2);
        worker.submit(3).unwrap();
        worker.submit(4).unwrap();
        assert_eq!(worker.in_flight(), 2);
        assert_eq!(worker.drain(), vec![6, 8]);
        assert_eq!(worker.in_flight(), 0);
        assert!(worker.drain().is_empty());
    }

    #[test]
    fn thread_worker_preserves_submission_order() {
        let mut worker = Worker::spawn("square", |value: u64| value * value).unwrap();
        for value in 1..=5 {
            worker.submit(value).unwrap();
        }
        let results = drain_until(&mut worker, 5);
        assert_eq!(results, vec![1, 4, 9, 16, 25]);
    }

    #[test]
    fn wait_blocks_for_a_result() {
        let mut worker = Worker::spawn("echo", |value: u8| value).unwrap();
        worker.submit(7).unwrap();
        assert_eq!(worker.wait(Duration::from_secs(5)), Some(7));
        assert_eq!(worker.in_flight(), 0);
        assert_eq!(worker.wait(Duration::from_millis(1)), None);
    }

    #[test]
    fn finish_joins_and_returns_pending_results() {
        let mut worker = Worker::spawn("slow", |value: u32| {
            thread::sleep(Duration::from_millis(5));
            value + 1
        })
        .unwrap();
        worker.submit(1).unwrap();
        worker.submit(2).unwrap();
        let results = worker.finish();
        assert_eq!(results, vec![2, 3]);
        assert_eq!(worker.in_flight(), 0);
        assert_eq!(worker.submit(9), Err(9));
    }

    #[test]
    fn panicking_job_leaves_the_thread_running() {
        let mut worker = Worker::spawn("fragile", |value: u32| {
            catch_panic(|| {
                if value == 0 {
                    panic!("zero is not allowed");
                }
                100 / value
            })
        })
        .unwrap();
        worker.submit(0).unwrap();
        worker.submit(4).unwrap();
        let results = drain_until(&mut worker, 2);
        assert_eq!(
            results,
            vec![Err("zero is not allowed".to_string()), Ok(25)]
        );
    }

    #[test]
    fn catch_panic_keeps_formatted_messages() {
        let result: Result<(), String> = catch_panic(|| panic!("bad id {}", 7));
        assert_eq!(result, Err("bad id 7".to_string()));
        assert_eq!(catch_panic(|| 5), Ok(5));
    }
}
