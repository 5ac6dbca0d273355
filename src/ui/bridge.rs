// EventLoopBridge - marshals work between the tokio runtime and the Slint
// event loop.
//
// Two event loops coexist: Slint's single-threaded GUI loop and tokio's
// thread pool for HTTP and timers. Slint callbacks hand async work to tokio
// through `spawn_async`; finished tokio tasks push UI mutations back through
// `update_ui`, which queues them onto the GUI thread via
// `upgrade_in_event_loop`.

use slint::{ComponentHandle, Weak};
use std::future::Future;
use tokio::sync::mpsc;

type UiUpdate<T> = Box<dyn FnOnce(&T) + Send>;

/// Cloneable handle bridging tokio tasks and the Slint event loop.
///
/// The update channel is bounded at 100; if the GUI thread falls that far
/// behind, further updates are dropped rather than buffered without limit.
pub struct EventLoopBridge<T: ComponentHandle> {
    ui_weak: Weak<T>,
    tokio_handle: tokio::runtime::Handle,
    ui_update_tx: mpsc::Sender<UiUpdate<T>>,
}

// Manual Clone so T itself never needs to be Clone
impl<T: ComponentHandle> Clone for EventLoopBridge<T> {
    fn clone(&self) -> Self {
        Self {
            ui_weak: self.ui_weak.clone(),
            tokio_handle: self.tokio_handle.clone(),
            ui_update_tx: self.ui_update_tx.clone(),
        }
    }
}

impl<T: ComponentHandle + 'static> EventLoopBridge<T> {
    /// Create the bridge and start its handler thread.
    ///
    /// The handler thread drains the update channel and queues each closure
    /// onto the Slint event loop. It exits when the channel closes or the
    /// event loop is gone.
    pub fn new(ui: &T, tokio_handle: tokio::runtime::Handle) -> Self {
        let ui_weak = ui.as_weak();
        let (ui_update_tx, mut ui_update_rx) = mpsc::channel::<UiUpdate<T>>(100);

        let ui_weak_clone = ui_weak.clone();
        std::thread::spawn(move || {
            tracing::debug!("EventLoopBridge handler thread started");

            while let Some(update_fn) = ui_update_rx.blocking_recv() {
                let result = ui_weak_clone.upgrade_in_event_loop(move |ui| {
                    update_fn(&ui);
                });

                if let Err(e) = result {
                    tracing::warn!("Failed to queue UI update to event loop: {:?}", e);
                    break;
                }
            }

            tracing::debug!("EventLoopBridge handler thread terminated");
        });

        Self {
            ui_weak,
            tokio_handle,
            ui_update_tx,
        }
    }

    /// Schedule a UI mutation from any thread.
    ///
    /// The closure runs on the Slint event loop thread on its next iteration.
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        match self.ui_update_tx.try_send(Box::new(update)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("UI update channel full - dropping update");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("UI update handler thread has stopped");
            }
        }
    }

    /// Spawn an async task on tokio from a Slint callback.
    pub fn spawn_async<F, Fut>(&self, future_factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(async move {
            future_factory().await;
        });
    }

    /// Weak reference to the UI, for synchronous access from the GUI thread.
    pub fn ui_weak(&self) -> &Weak<T> {
        &self.ui_weak
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // A real Slint component needs a window system, so the bridge itself is
    // exercised manually; these cover the tokio side.

    #[test]
    fn test_async_spawn_runs_on_runtime() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = counter.clone();
        rt.spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        rt.shutdown_timeout(Duration::from_secs(1));
    }
}
