//! Report generation port trait.

use crate::domain::analysis::JournalAnalysis;
use crate::domain::error::JournalError;

/// Port for writing journal reports.
pub trait ReportPort {
    fn write(
        &self,
        analysis: &JournalAnalysis,
        title: &str,
        output_path: &str,
    ) -> Result<(), JournalError>;
}
