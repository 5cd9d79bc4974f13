// Copyright 2025 Felix Engl
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Shutdown logic from https://github.com/tokio-rs/mini-redis/blob/master/src/server.rs

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A cloneable receiver of the process-wide shutdown signal.
///
/// Long-lived tasks hold one and either poll [`Self::is_shutdown`] at loop
/// boundaries or race [`Self::wait`] against their work. Each clone also
/// carries a completion sender; the [`GracefulShutdownBarrier`] resolves
/// once every clone has been dropped.
#[derive(Debug, Clone)]
pub struct Shutdown {
    token: CancellationToken,
    _completed: mpsc::Sender<()>,
}

impl Shutdown {
    /// Returns `true` once the shutdown signal has been sent.
    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when the shutdown signal is sent.
    pub async fn wait(&self) {
        self.token.cancelled().await
    }

    /// Sleeps for `duration`, waking early on shutdown. Returns `true`
    /// when shutdown interrupted the sleep.
    pub async fn sleep(&self, duration: std::time::Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            _ = self.token.cancelled() => true,
        }
    }
}

/// Sends the shutdown signal to every [`Shutdown`] receiver.
#[derive(Debug)]
pub struct ShutdownSignalSender {
    token: CancellationToken,
}

impl ShutdownSignalSender {
    pub fn cancel(&self) {
        self.token.cancel()
    }
}

/// Waits until every [`Shutdown`] clone has been dropped, i.e. every
/// task observing shutdown has reached its terminal state.
#[derive(Debug)]
pub struct GracefulShutdownBarrier {
    completed: mpsc::Receiver<()>,
}

impl GracefulShutdownBarrier {
    pub async fn wait(&mut self) {
        // Resolves with None once all senders are gone.
        let _ = self.completed.recv().await;
        log::info!("All tasks finished, shutting down.");
    }
}

/// Creates the tools for graceful shutdown handling.
pub fn graceful_shutdown() -> (ShutdownSignalSender, Shutdown, GracefulShutdownBarrier) {
    let token = CancellationToken::new();
    let (sender, receiver) = mpsc::channel(1);
    (
        ShutdownSignalSender {
            token: token.clone(),
        },
        Shutdown {
            token,
            _completed: sender,
        },
        GracefulShutdownBarrier {
            completed: receiver,
        },
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signal_reaches_all_clones() {
        let (sender, shutdown, _barrier) = graceful_shutdown();
        let clone = shutdown.clone();
        assert!(!clone.is_shutdown());
        sender.cancel();
        assert!(clone.is_shutdown());
        assert!(shutdown.is_shutdown());
    }

    #[tokio::test]
    async fn sleep_is_interrupted_by_shutdown() {
        let (sender, shutdown, _barrier) = graceful_shutdown();
        let handle = tokio::spawn(async move { shutdown.sleep(Duration::from_secs(600)).await });
        tokio::task::yield_now().await;
        sender.cancel();
        assert!(handle.await.unwrap());
    }

    #[tokio::test]
    async fn barrier_waits_for_last_receiver() {
        let (sender, shutdown, mut barrier) = graceful_shutdown();
        let task = tokio::spawn(async move {
            shutdown.wait().await;
            drop(shutdown);
        });
        sender.cancel();
        task.await.unwrap();
        barrier.wait().await;
    }
}
