//! Interrupt handling
//!
//! The session future is raced against these signals in `main`. Dropping
//! the session stops the spinner and discards any half-written cache file.
//!
//! While a confirmed command runs in the foreground the race is disarmed:
//! the terminal delivers Ctrl-C to the child too, and like a shell we wait
//! for the child to finish instead of orphaning it.

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Number of foreground commands currently running
static FOREGROUND: AtomicUsize = AtomicUsize::new(0);

/// Signal that cut the session short
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// SIGINT / Ctrl-C
    Int,
    /// SIGTERM
    Term,
}

impl Interrupt {
    /// Conventional shell exit status (128 + signal number)
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Int => 130,
            Self::Term => 143,
        }
    }
}

/// Marks a foreground command as running until dropped
#[derive(Debug)]
pub struct ForegroundGuard {
    _private: (),
}

impl ForegroundGuard {
    pub fn acquire() -> Self {
        FOREGROUND.fetch_add(1, Ordering::SeqCst);
        Self { _private: () }
    }
}

impl Drop for ForegroundGuard {
    fn drop(&mut self) {
        FOREGROUND.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Whether a foreground command currently owns the terminal
pub fn in_foreground() -> bool {
    FOREGROUND.load(Ordering::SeqCst) > 0
}

/// Resolve when the process is asked to stop.
///
/// Signals that arrive while a foreground command runs are ignored. A
/// handler that fails to register never fires.
pub async fn shutdown_signal() -> Interrupt {
    #[cfg(unix)]
    let mut sigterm = {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}", e);
                None
            }
        }
    };

    loop {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => Interrupt::Int,
                Err(e) => {
                    warn!("Failed to register Ctrl-C handler: {}", e);
                    std::future::pending().await
                }
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match sigterm.as_mut() {
                Some(stream) => {
                    stream.recv().await;
                    Interrupt::Term
                }
                None => std::future::pending().await,
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<Interrupt>();

        let interrupt = tokio::select! {
            i = ctrl_c => i,
            i = terminate => i,
        };

        if in_foreground() {
            debug!("Received {:?} while a command runs, waiting for it", interrupt);
            continue;
        }

        debug!("Received {:?}", interrupt);
        return interrupt;
    }
}
