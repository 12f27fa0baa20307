// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use residuals_domain::{
    AssignmentSummary, LeadSheetStatus, PeriodKey, PipelineSnapshot, SourceStatus, UploadState,
};

pub fn march() -> PeriodKey {
    PeriodKey::new(2026, 3).unwrap()
}

pub fn uploaded_snapshot(period: PeriodKey) -> PipelineSnapshot {
    PipelineSnapshot::new(
        period,
        vec![
            SourceStatus::new("tsys", "TSYS", UploadState::Validated, 1_800, 250_000),
            SourceStatus::new("elavon", "Elavon", UploadState::Validated, 1_650, 250_000),
        ],
        LeadSheetStatus::new(UploadState::Validated, 980),
        AssignmentSummary::loaded(12, 3_100),
        Vec::new(),
    )
}
