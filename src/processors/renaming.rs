//! Renaming of emlid log directories to canonical SALVO names.
//!
//! An emlid directory holds the logs downloaded from a receiver (extracted
//! archive content) and a survey YAML file describing the site and location:
//!
//! ```yaml
//! site: beo
//! location: [line]
//! name history:
//!   reachm2_raw_202406082214: salvo_beo_line_reachm2-salvo-raw_20240608-221400
//! ```
//!
//! Top-level entries and the files of first-level subdirectories are renamed;
//! the renames of top-level entries are appended to `name history`.
//!
//! Zip archives as downloaded from the receiver are backed up into
//! `original/`, rewritten with canonical entry names as
//! `<canonical>.00.zip` and removed.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::config::NamingTables;
use crate::naming::emlid::compose_canonical;
use crate::naming::{self, build_canonical_name_with, NamingError, Token};

/// Errors that can occur during renaming.
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("No survey YAML file found in {0}")]
    MissingSurveyConfig(PathBuf),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to parse survey config {path}: {source}")]
    InvalidSurveyConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Survey location: a single name or a list joined with `-`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    One(String),
    Many(Vec<String>),
}

impl Location {
    pub fn joined(&self) -> String {
        match self {
            Location::One(s) => s.clone(),
            Location::Many(parts) => parts.join("-"),
        }
    }
}

/// Per-directory survey description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    pub site: String,

    pub location: Location,

    /// Original name -> canonical name of every renamed top-level entry
    #[serde(rename = "name history", default)]
    pub name_history: BTreeMap<String, String>,

    /// Other keys, preserved on rewrite
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl SurveyConfig {
    /// Find the survey YAML file of a directory (first `.yaml`/`.yml`, sorted).
    pub fn find_in(dir: &Path) -> Option<PathBuf> {
        let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_yaml(path))
            .collect();
        candidates.sort();
        candidates.into_iter().next()
    }

    /// Load a survey config from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read survey config: {}", path.display()))?;
        let config = serde_yaml::from_str(&content).map_err(|e| RenameError::InvalidSurveyConfig {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(config)
    }

    /// Write the survey config back to a YAML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize survey config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write survey config: {}", path.display()))?;
        Ok(())
    }
}

/// Directory receiving a copy of every archive before it is rewritten.
pub const BACKUP_DIR: &str = "original";

/// Level segment and extension of a rewritten raw archive.
const RAW_ARCHIVE_SUFFIX: &str = ".00.zip";

fn is_zip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

/// A single planned rename.
#[derive(Debug, Clone, PartialEq)]
pub struct RenamePlan {
    pub from: PathBuf,
    pub to: PathBuf,
    /// True for entries directly inside the emlid directory
    pub top_level: bool,
}

/// Outcome of rewriting one archive.
#[derive(Debug, Clone, Default)]
pub struct ArchiveReport {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Original -> new path of every file entry
    pub entries: Vec<(String, String)>,
}

/// Outcome of renaming an emlid directory.
#[derive(Debug, Default)]
pub struct RenameReport {
    /// Renamed entries and rewritten archives
    pub renamed: Vec<RenamePlan>,
    pub skipped: Vec<(PathBuf, String)>,
    /// Entry renames of each rewritten archive (empty on dry run)
    pub archives: Vec<ArchiveReport>,
    pub survey_config: PathBuf,
}

/// Canonical name of a directory entry.
///
/// Directories are named from their full name. Files are named from their
/// stem (up to the first `.`) and keep their last extension; when the stem
/// carries no log type, the full file name is used to detect it.
pub fn canonical_entry_name(
    entry_name: &str,
    is_dir: bool,
    site: &str,
    location: &str,
    tables: &NamingTables,
) -> naming::Result<String> {
    if is_dir || !entry_name.contains('.') {
        return build_canonical_name_with(entry_name, site, location, None, tables);
    }

    let stem = entry_name.split('.').next().unwrap_or(entry_name);
    let ext = entry_name.rsplit('.').next().unwrap_or("");

    let base = match build_canonical_name_with(stem, site, location, None, tables) {
        Err(NamingError::Unresolved {
            token: Token::LogType,
            ..
        }) => {
            let log_type = naming::detect_log_type_with(entry_name, &tables.log_types)
                .ok_or_else(|| NamingError::Unresolved {
                    token: Token::LogType,
                    name: entry_name.to_string(),
                })?;
            let instrument = naming::resolve_instrument(stem, tables)?;
            let timestamp = naming::extract_timestamp(stem)?;
            compose_canonical(tables, site, location, instrument, log_type.as_str(), &timestamp)
        }
        other => other?,
    };

    Ok(format!("{}.{}", base, ext))
}

fn should_skip(name: &str, tables: &NamingTables) -> bool {
    name.starts_with(&format!("{}_", tables.project)) || name == BACKUP_DIR || name.starts_with('.')
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    entries.sort();
    Ok(entries)
}

/// Plan the renames of an emlid directory without touching the filesystem.
///
/// Children of a subdirectory are planned before the subdirectory itself so
/// the plan can be applied in order. Zip archives are not planned; they are
/// rewritten by [`rename_emlid_directory`]. Entries that cannot be named are
/// returned in the second element with the reason.
pub fn plan_renames(
    dir: &Path,
    survey: &SurveyConfig,
    tables: &NamingTables,
) -> Result<(Vec<RenamePlan>, Vec<(PathBuf, String)>)> {
    let site = survey.site.as_str();
    let location = survey.location.joined();

    let mut plans = Vec::new();
    let mut skipped = Vec::new();

    for entry in sorted_entries(dir)? {
        let Some(name) = entry.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        if should_skip(&name, tables) || (entry.is_file() && (is_yaml(&entry) || is_zip(&entry))) {
            debug!("Skipping {}", entry.display());
            continue;
        }

        let is_dir = entry.is_dir();
        if is_dir {
            for child in sorted_entries(&entry)? {
                let Some(child_name) = child.file_name().and_then(|n| n.to_str()).map(str::to_string)
                else {
                    continue;
                };
                if should_skip(&child_name, tables) {
                    continue;
                }
                if child.is_dir() {
                    warn!("Nested subdirectory not renamed: {}", child.display());
                    skipped.push((child, "nested subdirectory".to_string()));
                    continue;
                }
                match canonical_entry_name(&child_name, false, site, &location, tables) {
                    Ok(new_name) => plans.push(RenamePlan {
                        to: entry.join(new_name),
                        from: child,
                        top_level: false,
                    }),
                    Err(e) => skipped.push((child, e.to_string())),
                }
            }
        }

        match canonical_entry_name(&name, is_dir, site, &location, tables) {
            Ok(new_name) => plans.push(RenamePlan {
                to: dir.join(new_name),
                from: entry,
                top_level: true,
            }),
            Err(e) => skipped.push((entry, e.to_string())),
        }
    }

    Ok((plans, skipped))
}

/// Name of the rewritten archive: `<canonical>.00.zip`.
pub fn archive_output_name(
    item: &str,
    site: &str,
    location: &str,
    tables: &NamingTables,
) -> naming::Result<String> {
    let base = build_canonical_name_with(item, site, location, None, tables)?;
    Ok(format!("{}{}", base, RAW_ARCHIVE_SUFFIX))
}

/// New path of an archive entry.
///
/// The file name and its first-level directory are renamed; components that
/// cannot be named keep their original name. Deeper directories are kept
/// as they are.
fn archive_entry_name(entry: &str, site: &str, location: &str, tables: &NamingTables) -> String {
    let rename = |name: &str, is_dir: bool| match canonical_entry_name(name, is_dir, site, location, tables) {
        Ok(new_name) => new_name,
        Err(e) => {
            debug!("Keeping archive entry name '{}': {}", name, e);
            name.to_string()
        }
    };

    let mut parts: Vec<String> = entry.split('/').map(str::to_string).collect();
    if parts.len() > 2 {
        warn!("Only one subdirectory level is renamed: {}", entry);
    } else if let Some(file) = parts.last_mut() {
        *file = rename(file.as_str(), false);
    }
    if parts.len() > 1 {
        let dir = rename(parts[0].as_str(), true);
        parts[0] = dir;
    }
    parts.join("/")
}

/// Copy the file entries of `source` into a new archive at `target`, renamed
/// to canonical names.
pub fn rewrite_archive(
    source: &Path,
    target: &Path,
    site: &str,
    location: &str,
    tables: &NamingTables,
) -> Result<ArchiveReport> {
    let file = File::open(source).with_context(|| format!("Failed to open archive: {}", source.display()))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("Failed to read archive: {}", source.display()))?;

    let out = File::create(target).with_context(|| format!("Failed to create archive: {}", target.display()))?;
    let mut writer = ZipWriter::new(out);

    let mut report = ArchiveReport {
        source: source.to_path_buf(),
        output: target.to_path_buf(),
        entries: Vec::with_capacity(archive.len()),
    };

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let new_name = archive_entry_name(&name, site, location, tables);

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .with_context(|| format!("Failed to extract {} from {}", name, source.display()))?;

        writer.start_file(new_name.as_str(), SimpleFileOptions::default())?;
        writer.write_all(&content)?;
        debug!("{} -> {}", name, new_name);
        report.entries.push((name, new_name));
    }

    writer.finish()?;
    Ok(report)
}

/// Back up `archive`, rewrite it to `target` and remove it.
fn replace_archive(
    archive: &Path,
    target: &Path,
    backup_dir: &Path,
    site: &str,
    location: &str,
    tables: &NamingTables,
) -> Result<ArchiveReport> {
    fs::create_dir_all(backup_dir)
        .with_context(|| format!("Failed to create backup directory: {}", backup_dir.display()))?;
    let backup = backup_dir.join(file_name_string(archive));
    if !backup.exists() {
        fs::copy(archive, &backup).with_context(|| format!("Failed to back up {}", archive.display()))?;
    }

    let report = match rewrite_archive(archive, target, site, location, tables) {
        Ok(report) => report,
        Err(e) => {
            // Leave no partial archive behind
            let _ = fs::remove_file(target);
            return Err(e);
        }
    };

    fs::remove_file(archive).with_context(|| format!("Failed to remove {}", archive.display()))?;
    Ok(report)
}

/// Rename the content of an emlid directory to canonical SALVO names.
///
/// The survey YAML of the directory provides the site and location. Zip
/// archives are backed up into `original/` and rewritten as
/// `<canonical>.00.zip`; the other entries are renamed in place. Unless
/// `dry_run` is set, the renames of top-level entries and archives are
/// recorded in the `name history` of the survey YAML.
///
/// # Errors
///
/// Returns an error if the directory does not exist, has no survey YAML, or
/// if the survey YAML cannot be read or written. Entries and archives that
/// cannot be named or rewritten are reported in [`RenameReport::skipped`].
pub fn rename_emlid_directory(dir: &Path, tables: &NamingTables, dry_run: bool) -> Result<RenameReport> {
    if !dir.is_dir() {
        return Err(RenameError::DirectoryNotFound(dir.to_path_buf()).into());
    }

    let survey_path =
        SurveyConfig::find_in(dir).ok_or_else(|| RenameError::MissingSurveyConfig(dir.to_path_buf()))?;
    let mut survey = SurveyConfig::load(&survey_path)?;
    let location = survey.location.joined();
    info!(
        "Survey config {}: site={}, location={}",
        survey_path.display(),
        survey.site,
        location
    );

    let mut renamed = Vec::new();
    let mut skipped = Vec::new();
    let mut archives = Vec::new();

    let backup_dir = dir.join(BACKUP_DIR);
    for archive in sorted_entries(dir)? {
        let item = file_name_string(&archive);
        if !archive.is_file() || !is_zip(&archive) || should_skip(&item, tables) {
            continue;
        }

        let new_name = match archive_output_name(&item, &survey.site, &location, tables) {
            Ok(name) => name,
            Err(e) => {
                warn!("Cannot rename {}: {}", archive.display(), e);
                skipped.push((archive, e.to_string()));
                continue;
            }
        };
        let target = dir.join(&new_name);
        if target.exists() {
            warn!("Target already exists, skipping: {}", target.display());
            skipped.push((archive, format!("target exists: {}", new_name)));
            continue;
        }

        if dry_run {
            println!("Would archive: {} -> {}", item, new_name);
        } else {
            match replace_archive(&archive, &target, &backup_dir, &survey.site, &location, tables) {
                Ok(report) => {
                    println!("Archived: {} -> {} ({} files)", item, new_name, report.entries.len());
                    archives.push(report);
                }
                Err(e) => {
                    warn!("Failed to rewrite {}: {:#}", archive.display(), e);
                    skipped.push((archive, format!("{:#}", e)));
                    continue;
                }
            }
        }

        survey.name_history.entry(item).or_insert(new_name);
        renamed.push(RenamePlan {
            from: archive,
            to: target,
            top_level: true,
        });
    }

    let (plans, plan_skipped) = plan_renames(dir, &survey, tables)?;
    for (path, reason) in &plan_skipped {
        warn!("Cannot rename {}: {}", path.display(), reason);
    }
    skipped.extend(plan_skipped);

    for plan in plans {
        let from_name = file_name_string(&plan.from);
        let to_name = file_name_string(&plan.to);

        if plan.to.exists() {
            warn!("Target already exists, skipping: {}", plan.to.display());
            skipped.push((plan.from.clone(), format!("target exists: {}", to_name)));
            continue;
        }

        if dry_run {
            println!("Would rename: {} -> {}", from_name, to_name);
        } else {
            if let Err(e) = fs::rename(&plan.from, &plan.to) {
                warn!("Failed to rename {}: {}", plan.from.display(), e);
                skipped.push((plan.from.clone(), e.to_string()));
                continue;
            }
            println!("Renamed: {} -> {}", from_name, to_name);
        }

        if plan.top_level {
            survey.name_history.entry(from_name).or_insert(to_name);
        }
        renamed.push(plan);
    }

    if !dry_run && renamed.iter().any(|p| p.top_level) {
        survey.save(&survey_path)?;
        info!("Name history recorded in {}", survey_path.display());
    }

    Ok(RenameReport {
        renamed,
        skipped,
        archives,
        survey_config: survey_path,
    })
}

fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
