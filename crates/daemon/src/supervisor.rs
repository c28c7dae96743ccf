// Listener supervisor
//
// Keeps one surface serving until shutdown. A failed start, a panic while
// starting, or a server that stops on its own all lead to a restart after
// `restart_delay`. Each surface runs its own supervisor, so one listener
// going down never takes the other with it.

use crate::shutdown::ShutdownToken;
use jsonrpsee::server::ServerHandle;
use qnd_api_rpc::Surface;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Run `start` until shutdown, restarting the surface whenever it goes away
pub async fn supervise<F, Fut>(
    surface: Surface,
    start: F,
    restart_delay: Duration,
    mut shutdown: ShutdownToken,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<ServerHandle, String>> + Send + 'static,
{
    let mut attempt: u64 = 0;

    while !shutdown.is_shutdown() {
        attempt += 1;

        // Spawned so a panic in start-up is contained to this attempt
        match tokio::spawn(start()).await {
            Ok(Ok(handle)) => {
                if attempt > 1 {
                    info!(surface = %surface, attempt, "Listener restarted");
                }

                tokio::select! {
                    _ = handle.clone().stopped() => {
                        warn!(surface = %surface, "Listener stopped unexpectedly");
                    }
                    _ = shutdown.wait() => {
                        let _ = handle.stop();
                        handle.stopped().await;
                        info!(surface = %surface, "Listener stopped");
                        return;
                    }
                }
            }
            Ok(Err(e)) => {
                error!(surface = %surface, attempt, error = %e, "Listener failed to start");
            }
            Err(join_err) => {
                error!(surface = %surface, attempt, error = %join_err, "Listener start panicked");
            }
        }

        tokio::select! {
            _ = sleep(restart_delay) => {}
            _ = shutdown.wait() => return,
        }
    }
}
