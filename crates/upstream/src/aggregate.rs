// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::backend::{ResidualsBackend, Subsystem};
use crate::error::SnapshotError;
use residuals_domain::{PeriodKey, PipelineSnapshot};
use tracing::debug;

/// Reads all four subsystems for a period and combines the answers.
///
/// The reads run concurrently. The result is all-or-nothing: if any read
/// fails, no partial snapshot is produced and the first failure is
/// reported with the subsystem it came from.
///
/// # Arguments
///
/// * `backend` - The upstream subsystems
/// * `period` - The period to read
///
/// # Errors
///
/// Returns `SnapshotError` naming the first subsystem that failed.
pub async fn fetch_snapshot(
    backend: &dyn ResidualsBackend,
    period: PeriodKey,
) -> Result<PipelineSnapshot, SnapshotError> {
    debug!(period = %period, "Fetching pipeline snapshot");

    let (sources, lead_sheet, assignment, audits) = futures::try_join!(
        async {
            backend
                .source_statuses(period)
                .await
                .map_err(|source| SnapshotError::new(period, Subsystem::Uploads, source))
        },
        async {
            backend
                .lead_sheet_status(period)
                .await
                .map_err(|source| SnapshotError::new(period, Subsystem::LeadSheet, source))
        },
        async {
            backend
                .assignment_summary(period)
                .await
                .map_err(|source| SnapshotError::new(period, Subsystem::Assignments, source))
        },
        async {
            backend
                .audit_results(period)
                .await
                .map_err(|source| SnapshotError::new(period, Subsystem::Audits, source))
        },
    )?;

    Ok(PipelineSnapshot::new(
        period,
        sources,
        lead_sheet,
        assignment,
        audits,
    ))
}
