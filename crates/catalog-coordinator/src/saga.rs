//! First-class compensation list: each forward step in a write
//! path registers its undo as a boxed future; on failure the coordinator
//! unwinds them in reverse (LIFO) order. Failed compensations are logged
//! as warnings and never propagate — the caller already has the original
//! error to deal with.

use std::future::Future;
use std::pin::Pin;

type Compensation = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default)]
pub struct Saga {
    steps: Vec<Compensation>,
}

impl Saga {
    pub fn new() -> Self {
        Saga { steps: Vec::new() }
    }

    /// Registers an undo action for a forward step that has already run.
    /// The future is constructed eagerly but only polled if `unwind` runs.
    pub fn push<F>(&mut self, compensation: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.steps.push(Box::pin(compensation));
    }

    /// Runs every registered compensation in reverse order of registration.
    /// Each one runs to completion regardless of whether earlier ones
    /// logged a failure — compensation errors are logged, never
    /// propagated.
    pub async fn unwind(self) {
        for step in self.steps.into_iter().rev() {
            step.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn unwinds_in_reverse_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut saga = Saga::new();

        for i in 0..3 {
            let order = Arc::clone(&order);
            saga.push(async move {
                order.lock().unwrap().push(i);
            });
        }
        saga.unwind().await;

        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
    }

    #[tokio::test]
    async fn runs_every_step_even_if_one_panics_logically_fails() {
        let count = Arc::new(AtomicU32::new(0));
        let mut saga = Saga::new();
        for _ in 0..3 {
            let count = Arc::clone(&count);
            saga.push(async move {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        saga.unwind().await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
