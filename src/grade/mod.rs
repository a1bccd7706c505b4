#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Static-analysis tool scoring.
pub mod lint;
/// Shared score entry types.
pub mod results;
/// Totals, capping, and finalization.
pub mod score;
/// Test report aggregation.
pub mod tests;

pub use lint::{LintSource, LintSources, LintTool};
pub use results::{EntryKind, ModuleSummary, ScoreEntry};
pub use score::{Totals, finalize};
pub use tests::{TestAggregation, aggregate_module, score_report};
