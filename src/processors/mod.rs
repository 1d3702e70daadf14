//! Data processing modules.

pub mod renaming;
pub mod transect;

pub use renaming::{
    archive_output_name, canonical_entry_name, plan_renames, rename_emlid_directory, rewrite_archive,
    ArchiveReport, Location, RenameError, RenamePlan, RenameReport, SurveyConfig, BACKUP_DIR,
};
pub use transect::{
    annotate_batch, annotate_csv, compute_table_distances, BatchSummary, TransectError,
    TransectSummary,
};
