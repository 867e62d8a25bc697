//! Trailing-edge debouncer for search input.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Default quiescence window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(500);

/// Emits the latest input once it has been stable for a quiescence window.
///
/// Inputs are accepted without blocking. Subscribers see the stabilized value
/// through a [`watch::Receiver`] and are only notified when it changes.
#[derive(Debug)]
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    output: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Starts the debouncer task with `initial` as the stabilized value.
    #[must_use]
    pub fn spawn(window: Duration, initial: T) -> Self {
        let (input, rx) = mpsc::unbounded_channel();
        let (tx, output) = watch::channel(initial);
        let task = tokio::spawn(run(window, rx, tx));
        Self {
            input,
            output,
            task,
        }
    }

    /// Submits a new raw value, restarting the window.
    pub fn push(&self, value: T) {
        if self.input.send(value).is_err() {
            debug!("debouncer task has already stopped");
        }
    }

    /// Returns a receiver notified on every stabilized change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.clone()
    }

    /// Returns the current stabilized value.
    #[must_use]
    pub fn current(&self) -> T {
        self.output.borrow().clone()
    }

    /// Closes the input, flushes any pending value, and returns the final
    /// stabilized value.
    pub async fn finish(self) -> T {
        let Self {
            input,
            output,
            task,
        } = self;
        drop(input);
        if let Err(e) = task.await {
            debug!(error = %e, "debouncer task ended abnormally");
        }
        output.borrow().clone()
    }
}

async fn run<T: PartialEq>(
    window: Duration,
    mut input: mpsc::UnboundedReceiver<T>,
    output: watch::Sender<T>,
) {
    let mut pending: Option<T> = None;
    loop {
        if let Some(value) = pending.take() {
            tokio::select! {
                next = input.recv() => match next {
                    Some(newer) => pending = Some(newer),
                    None => {
                        emit(&output, value);
                        break;
                    }
                },
                () = tokio::time::sleep(window) => emit(&output, value),
            }
        } else {
            match input.recv().await {
                Some(value) => pending = Some(value),
                None => break,
            }
        }
    }
    trace!("debouncer input closed");
}

fn emit<T: PartialEq>(output: &watch::Sender<T>, value: T) {
    output.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}
