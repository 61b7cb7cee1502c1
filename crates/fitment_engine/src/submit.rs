use fitment_logging::{fitment_info, fitment_warn};

use crate::{FitmentApi, JobError};

/// Sends the targets, comma-joined, to the start-job endpoint.
///
/// Issues exactly one request. Callers keep submissions single-flight.
pub async fn submit(api: &dyn FitmentApi, targets: &[String]) -> Result<(), JobError> {
    let hostnames = targets.join(",");
    fitment_info!("Starting fitment job for {} target(s)", targets.len());

    match api.start_job(&hostnames).await {
        Ok(()) => {
            fitment_info!("Fitment job accepted");
            Ok(())
        }
        Err(err) => {
            fitment_warn!("Fitment job rejected: {}", err);
            Err(JobError::SubmissionFailed(err))
        }
    }
}
