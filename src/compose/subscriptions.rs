use tokio::task::{AbortHandle, JoinHandle};

/// Background work owned by one composition screen, released in one place.
///
/// Anything added after [`release`](Self::release) is aborted immediately,
/// so late registrations cannot outlive the screen.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    handles: Vec<AbortHandle>,
    released: bool,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track<T>(&mut self, handle: &JoinHandle<T>) {
        self.add(handle.abort_handle());
    }

    pub fn add(&mut self, handle: AbortHandle) {
        if self.released {
            handle.abort();
            return;
        }
        self.handles.retain(|h| !h.is_finished());
        self.handles.push(handle);
    }

    /// Abort everything still running. Returns how many tasks were aborted.
    pub fn release(&mut self) -> usize {
        self.released = true;
        let mut aborted = 0;
        for handle in self.handles.drain(..) {
            if !handle.is_finished() {
                handle.abort();
                aborted += 1;
            }
        }
        aborted
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Number of tracked tasks that have not finished.
    pub fn active(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_release_aborts_pending_tasks() {
        let mut subs = SubscriptionSet::new();
        let handle = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        subs.track(&handle);
        assert_eq!(subs.active(), 1);

        assert_eq!(subs.release(), 1);
        assert!(handle.await.unwrap_err().is_cancelled());
        assert!(subs.is_released());
    }

    #[tokio::test]
    async fn test_add_after_release_aborts_immediately() {
        let mut subs = SubscriptionSet::new();
        subs.release();

        let handle = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        subs.track(&handle);

        assert!(handle.await.unwrap_err().is_cancelled());
        assert_eq!(subs.active(), 0);
    }

    #[tokio::test]
    async fn test_finished_tasks_not_counted() {
        let mut subs = SubscriptionSet::new();
        let handle = tokio::spawn(async {});
        subs.track(&handle);
        handle.await.unwrap();

        assert_eq!(subs.active(), 0);
        assert_eq!(subs.release(), 0);
    }
}
