//! Keeping localized documents in step with the base document.

mod coordinator;
mod report;
mod target;

pub use coordinator::{MergePolicy, SyncCoordinator};
pub use report::{SyncReport, TargetReport, TargetStatus, write_compare_report};
pub use target::{LanguageTarget, language_from_location};
