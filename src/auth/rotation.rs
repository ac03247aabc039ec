use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use super::client::IdentityClient;

/// Identity tokens rotate on this schedule unless the deployment overrides it.
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Background task that rotates the identity token on a fixed schedule.
///
/// Runs every `interval` (+ 5-10s jitter) and:
/// 1. Asks the service for a replacement token
/// 2. Persists it and invalidates the cached session credentials
/// 3. Handles rotation errors gracefully with warnings; persisted state is
///    untouched on failure and the next tick retries
pub fn spawn_rotation(
    client: Arc<IdentityClient>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            // Jitter keeps a fleet of agents from rotating in lockstep.
            let jitter = {
                use rand::Rng;
                rand::thread_rng().gen_range(5..10)
            };

            sleep(interval + Duration::from_secs(jitter)).await;

            match client.rotate_identity_token().await {
                Ok(()) => {
                    info!(
                        access_id = %client.access_id(),
                        "scheduled identity token rotation complete"
                    );
                }
                Err(err) => {
                    warn!(
                        access_id = %client.access_id(),
                        error = %err,
                        "scheduled rotation failed (will retry)"
                    );
                }
            }
        }
    })
}
