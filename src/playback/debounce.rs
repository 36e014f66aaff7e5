use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Trailing-edge debouncer. Each `push` re-arms the quiet-window timer, so
/// the value alive when ticks stop arriving is the one flushed. Owning the
/// timer handle (instead of a free-floating closure timer) makes teardown
/// deterministic: `cancel` drops whatever is pending.
pub struct Debouncer {
    window: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            timer: Mutex::new(None),
        }
    }

    pub fn push<T, F, Fut>(&self, value: T, flush: F)
    where
        T: Send + 'static,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let mut guard = self.timer.lock().unwrap();
        if let Some(handle) = guard.take() {
            handle.abort();
        }
        let window = self.window;
        *guard = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            flush(value).await;
        }));
    }

    /// Drops any pending flush without running it.
    pub fn cancel(&self) {
        if let Some(handle) = self.timer.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tokio::time::{sleep, timeout};

    #[tokio::test]
    async fn a_burst_of_pushes_flushes_only_the_last_value() {
        let debouncer = Arc::new(Debouncer::new(Duration::from_millis(150)));
        let (tx, mut rx) = mpsc::unbounded_channel();

        for position in [0.0, 0.5, 1.0, 1.5, 2.0] {
            let tx = tx.clone();
            debouncer.push(position, move |value| async move {
                let _ = tx.send(value);
            });
            sleep(Duration::from_millis(30)).await;
        }

        let flushed = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("flush should fire after the quiet window")
            .unwrap();
        assert_eq!(flushed, 2.0);

        // Nothing else was scheduled.
        sleep(Duration::from_millis(250)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn cancel_drops_the_pending_flush() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let (tx, mut rx) = mpsc::unbounded_channel();

        debouncer.push(42u32, move |value| async move {
            let _ = tx.send(value);
        });
        debouncer.cancel();

        sleep(Duration::from_millis(250)).await;
        assert!(rx.try_recv().is_err());
    }
}
