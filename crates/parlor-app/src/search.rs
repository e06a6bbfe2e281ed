use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Turns a stream of keystrokes into a settled search term.
///
/// Every call to [`DebouncedSearch::set_term`] restarts the quiet window; the
/// term is only published once input has been still for the whole window.
pub struct DebouncedSearch {
    input: watch::Sender<String>,
    output: watch::Receiver<String>,
    task: JoinHandle<()>,
}

impl DebouncedSearch {
    pub fn spawn(window: Duration) -> Self {
        let (input, mut input_rx) = watch::channel(String::new());
        let (output_tx, output) = watch::channel(String::new());

        let task = tokio::spawn(async move {
            while input_rx.changed().await.is_ok() {
                loop {
                    tokio::select! {
                        changed = input_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                        _ = sleep(window) => break,
                    }
                }
                let term = input_rx.borrow_and_update().clone();
                output_tx.send_if_modified(|current| {
                    if *current == term {
                        false
                    } else {
                        *current = term;
                        true
                    }
                });
            }
        });

        Self {
            input,
            output,
            task,
        }
    }

    pub fn set_term(&self, term: impl Into<String>) {
        self.input.send_replace(term.into());
    }

    /// The last settled term.
    pub fn term(&self) -> String {
        self.output.borrow().clone()
    }

    /// Watch settled terms as they change.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.output.clone()
    }
}

impl Drop for DebouncedSearch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn publishes_after_quiet_window() {
        let search = DebouncedSearch::spawn(WINDOW);
        let mut settled = search.subscribe();

        let started = Instant::now();
        search.set_term("al");

        sleep(Duration::from_millis(499)).await;
        assert_eq!(search.term(), "");

        settled.changed().await.unwrap();
        assert!(started.elapsed() >= WINDOW);
        assert_eq!(search.term(), "al");
    }

    #[tokio::test(start_paused = true)]
    async fn keystrokes_restart_the_window() {
        let search = DebouncedSearch::spawn(WINDOW);
        let mut settled = search.subscribe();
        let started = Instant::now();

        for term in ["a", "al", "ali"] {
            search.set_term(term);
            sleep(Duration::from_millis(300)).await;
        }
        assert_eq!(search.term(), "");

        settled.changed().await.unwrap();
        assert_eq!(*settled.borrow(), "ali");
        // last keystroke at 600ms, settled 500ms later
        assert!(started.elapsed() >= Duration::from_millis(1100));
    }
}
