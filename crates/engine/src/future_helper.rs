//! Completion-handle aggregation
//!
//! Shutdown and steady-state draining both need "wait for everything in
//! flight to finish" without the caller knowing how many destinations were
//! involved.

use tracing::warn;

use contracts::PipelineError;

use crate::sink_publisher::DeliveryHandle;

/// Await every delivery handle, surfacing the first failure
///
/// Blocks without a timeout: by the time this is invoked the delivery calls
/// are bounded by the sink plugin's own contract. Later failures are logged
/// but the first one wins.
///
/// # Errors
/// Returns the first delivery failure observed, after all handles resolved.
pub async fn await_all(handles: Vec<DeliveryHandle>) -> Result<(), PipelineError> {
    let mut first_failure: Option<PipelineError> = None;

    for handle in handles {
        let sink_name = handle.sink_name().to_string();
        if let Err(e) = handle.wait().await {
            if first_failure.is_none() {
                first_failure = Some(e);
            } else {
                warn!(sink = %sink_name, error = %e, "additional delivery failure");
            }
        }
    }

    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
