//! Foreground mode shutdown trigger
//!
//! Children live in their own process groups, so a terminal Ctrl-C only
//! reaches the launcher. The launcher then runs the stop sequence itself.

use std::io;
use tracing::info;

/// Which signal ended the foreground wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

/// Block until Ctrl-C, or SIGTERM on Unix
pub async fn wait_for_shutdown() -> io::Result<ShutdownSignal> {
    let signal = wait_for_any().await?;
    info!("received {:?}, stopping services", signal);
    Ok(signal)
}

#[cfg(unix)]
async fn wait_for_any() -> io::Result<ShutdownSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|_| ShutdownSignal::Interrupt),
        _ = terminate.recv() => Ok(ShutdownSignal::Terminate),
    }
}

#[cfg(not(unix))]
async fn wait_for_any() -> io::Result<ShutdownSignal> {
    tokio::signal::ctrl_c().await?;
    Ok(ShutdownSignal::Interrupt)
}
