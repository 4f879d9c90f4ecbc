use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::api::WriteupApi;
use crate::models::Writeup;

/// Sink for transient user-visible notifications.
pub trait Notify: Send + Sync {
    fn notify(&self, message: &str);
}

/// Owned per-card favorite state with an optimistic toggle. The cell is not
/// reconciled with the query cache; a later refetch is the only path back to
/// server truth if they diverge.
pub struct FavoriteCell {
    id: String,
    is_favorite: AtomicBool,
    pending: AtomicBool,
}

impl FavoriteCell {
    pub fn new(item: &Writeup) -> Self {
        Self::with_state(item.id.clone(), item.is_favorite)
    }

    pub fn with_state(id: String, is_favorite: bool) -> Self {
        Self {
            id,
            is_favorite: AtomicBool::new(is_favorite),
            pending: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite.load(Ordering::Acquire)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Flip the flag optimistically, persist it, and revert with a single
    /// notification on failure. A toggle while a mutation is in flight is
    /// dropped, not queued. Returns the display state after the call settles.
    pub async fn toggle<A>(&self, api: &A, notifier: &dyn Notify) -> bool
    where
        A: WriteupApi + ?Sized,
    {
        if self
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return self.is_favorite();
        }
        let previous = self.is_favorite.load(Ordering::Acquire);
        let next = !previous;
        self.is_favorite.store(next, Ordering::Release);
        if let Err(e) = api.set_favorite(&self.id, next).await {
            warn!(id = %self.id, error = %e, "favorite mutation failed");
            self.is_favorite.store(previous, Ordering::Release);
            notifier.notify("Failed to save favorite");
        }
        self.pending.store(false, Ordering::Release);
        self.is_favorite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ApiResult};
    use crate::models::WriteupFilters;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify as Gate;

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl Notify for RecordingNotifier {
        fn notify(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    struct StubApi {
        fail: bool,
        calls: AtomicUsize,
        last_value: Mutex<Option<bool>>,
    }

    impl StubApi {
        fn ok() -> Self {
            Self {
                fail: false,
                calls: AtomicUsize::new(0),
                last_value: Mutex::new(None),
            }
        }
        fn failing() -> Self {
            Self {
                fail: true,
                calls: AtomicUsize::new(0),
                last_value: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl WriteupApi for StubApi {
        async fn fetch_writeups(&self, _filters: &WriteupFilters) -> ApiResult<Vec<Writeup>> {
            Ok(vec![])
        }
        async fn set_favorite(&self, _id: &str, value: bool) -> ApiResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_value.lock().unwrap() = Some(value);
            if self.fail {
                Err(ApiError::Status(500))
            } else {
                Ok(())
            }
        }
    }

    /// Holds every mutation open until released, so a second toggle can be
    /// issued while the first is in flight.
    struct GatedApi {
        entered: Gate,
        release: Gate,
        calls: AtomicUsize,
    }

    impl GatedApi {
        fn new() -> Self {
            Self {
                entered: Gate::new(),
                release: Gate::new(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl WriteupApi for GatedApi {
        async fn fetch_writeups(&self, _filters: &WriteupFilters) -> ApiResult<Vec<Writeup>> {
            Ok(vec![])
        }
        async fn set_favorite(&self, _id: &str, _value: bool) -> ApiResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn successful_toggle_keeps_optimistic_value() {
        let api = StubApi::ok();
        let notifier = RecordingNotifier::default();
        let cell = FavoriteCell::with_state("w1".into(), false);
        assert!(cell.toggle(&api, &notifier).await);
        assert!(cell.is_favorite());
        assert_eq!(*api.last_value.lock().unwrap(), Some(true));
        assert!(notifier.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_toggle_reverts_and_notifies_exactly_once() {
        let api = StubApi::failing();
        let notifier = RecordingNotifier::default();
        let cell = FavoriteCell::with_state("w1".into(), true);
        assert!(cell.toggle(&api, &notifier).await);
        assert!(cell.is_favorite(), "state reverts to pre-toggle value");
        let messages = notifier.messages.lock().unwrap();
        assert_eq!(messages.as_slice(), ["Failed to save favorite"]);
    }

    #[tokio::test]
    async fn failed_toggle_clears_the_pending_guard() {
        let api = StubApi::failing();
        let notifier = RecordingNotifier::default();
        let cell = FavoriteCell::with_state("w1".into(), false);
        cell.toggle(&api, &notifier).await;
        assert!(!cell.is_favorite());
        assert!(!cell.is_pending());
    }

    #[tokio::test]
    async fn toggle_while_pending_is_dropped() {
        let api = Arc::new(GatedApi::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let cell = Arc::new(FavoriteCell::with_state("w1".into(), false));

        let task = tokio::spawn({
            let api = api.clone();
            let notifier = notifier.clone();
            let cell = cell.clone();
            async move { cell.toggle(&*api, &*notifier).await }
        });

        api.entered.notified().await;
        assert!(cell.is_pending());
        // second toggle is a no-op while the first is in flight
        let state = cell.toggle(&*api, &*notifier).await;
        assert!(state, "optimistic value from the first toggle still shown");
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);

        api.release.notify_one();
        assert!(task.await.unwrap());
        assert!(!cell.is_pending());
    }
}
