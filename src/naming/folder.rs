//! Site, date and processing-level helpers based on the directory tree.
//!
//! Campaign data lives under `<root>/<raw|working_X>/SALVO/<YYYYMMDD>-<SITE>/...`
//! and processed files carry their level in the next-to-last dot segment
//! (`.00.` for raw exports, `.a1.`, `.a2.`, ... for successive products).

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use super::{NamingError, Result, Token};

fn survey_dir_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{8})(?:-([^-]+)(?:-.*)?)?$").expect("valid survey dir pattern"))
}

fn level_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^a(\d+)$").expect("valid level pattern"))
}

/// Survey directory components (`YYYYMMDD[-SITE[-...]]`) of a path, in order.
///
/// The whole component must match: a file name that merely starts with a
/// date (`20240522193005_probe.csv`) is not a survey directory.
fn survey_components(path: &Path) -> Vec<(NaiveDate, Option<String>)> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .filter_map(|name| {
            let caps = survey_dir_pattern().captures(name)?;
            let date = NaiveDate::parse_from_str(&caps[1], "%Y%m%d").ok()?;
            Some((date, caps.get(2).map(|m| m.as_str().to_string())))
        })
        .collect()
}

/// Return the site code from the directory tree.
///
/// The site is read from the deepest `YYYYMMDD-<SITE>` component.
///
/// # Example
///
/// ```
/// use salvo::naming::site_from_path;
///
/// let site = site_from_path("/data/raw/SALVO/20240522-ARM/emlid".as_ref()).unwrap();
/// assert_eq!(site, "ARM");
/// ```
pub fn site_from_path(path: &Path) -> Result<String> {
    survey_components(path)
        .into_iter()
        .filter_map(|(_, site)| site)
        .last()
        .ok_or_else(|| NamingError::unresolved(Token::Site, &path.display().to_string()))
}

/// Return the survey date from the directory tree.
///
/// The date is read from the deepest component starting with `YYYYMMDD`.
pub fn date_from_path(path: &Path) -> Result<NaiveDate> {
    survey_components(path)
        .into_iter()
        .map(|(date, _)| date)
        .last()
        .ok_or_else(|| NamingError::unresolved(Token::Date, &path.display().to_string()))
}

/// Output path of the next processing level for `input`.
///
/// Every `raw` directory component becomes `working_<level>`. In the file
/// name, the level segment is incremented: `.00.` becomes `.a1.` and `.aN.`
/// becomes `.a(N+1).`. Level `a0` is reserved for raw exports converted to
/// NetCDF and is never produced.
///
/// The path is only computed; no directory is created.
///
/// # Errors
///
/// Returns [`NamingError::Unresolved`] when the file name carries no `00` or
/// `aN` level segment, and [`NamingError::InvalidPath`] when `input` has no file name.
///
/// # Example
///
/// ```
/// use salvo::naming::output_path;
/// use std::path::Path;
///
/// let out = output_path(Path::new("/data/raw/20240420-BEO/probe.00.csv"), "a").unwrap();
/// assert_eq!(out, Path::new("/data/working_a/20240420-BEO/probe.a1.csv"));
/// ```
pub fn output_path(input: &Path, level: &str) -> Result<PathBuf> {
    let file_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| NamingError::InvalidPath(input.to_path_buf()))?;

    let working = OsString::from(format!("working_{}", level));
    let out_dir: PathBuf = input
        .parent()
        .map(|parent| {
            parent
                .components()
                .map(|c| match c {
                    Component::Normal(name) if name == "raw" => working.clone(),
                    other => other.as_os_str().to_os_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    let mut segments: Vec<String> = file_name.split('.').map(str::to_string).collect();
    if segments.len() < 3 {
        return Err(NamingError::unresolved(Token::ProcessingLevel, file_name));
    }
    let idx = segments.len() - 2;
    let next = next_level(&segments[idx])
        .ok_or_else(|| NamingError::unresolved(Token::ProcessingLevel, file_name))?;
    segments[idx] = next;

    Ok(out_dir.join(segments.join(".")))
}

fn next_level(segment: &str) -> Option<String> {
    if segment == "00" {
        return Some("a1".to_string());
    }
    let caps = level_pattern().captures(segment)?;
    let number: u32 = caps[1].parse().ok()?;
    Some(format!("a{}", number.checked_add(1)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_from_path() {
        let path = Path::new("/mnt/data/UAF-data/raw/SALVO/20240522-ARM/emlid/");
        assert_eq!(site_from_path(path), Ok("ARM".to_string()));
    }

    #[test]
    fn test_site_from_path_deepest_wins() {
        let path = Path::new("/campaign/20240401-BEO/20240420-ICE-line/probe.csv");
        assert_eq!(site_from_path(path), Ok("ICE".to_string()));
    }

    #[test]
    fn test_site_from_path_rejects_invalid_date() {
        let path = Path::new("/campaign/20241341-BEO/probe.csv");
        assert!(matches!(
            site_from_path(path),
            Err(NamingError::Unresolved { token: Token::Site, .. })
        ));
    }

    #[test]
    fn test_date_from_path() {
        let path = Path::new("/data/working_a/SALVO/20240530-ICE/magnaprobe/file.csv");
        assert_eq!(
            date_from_path(path),
            Ok(NaiveDate::from_ymd_opt(2024, 5, 30).unwrap())
        );

        // A bare date directory also counts
        let path = Path::new("/data/20240530/file.csv");
        assert_eq!(
            date_from_path(path),
            Ok(NaiveDate::from_ymd_opt(2024, 5, 30).unwrap())
        );
        assert!(site_from_path(path).is_err());
    }

    #[test]
    fn test_date_from_path_ignores_dated_file_names() {
        let path = Path::new("/data/raw/SALVO/20240420-BEO/magnaprobe/20240522193005_probe.00.csv");
        assert_eq!(
            date_from_path(path),
            Ok(NaiveDate::from_ymd_opt(2024, 4, 20).unwrap())
        );
        assert_eq!(site_from_path(path), Ok("BEO".to_string()));
    }

    #[test]
    fn test_date_from_path_missing() {
        assert!(date_from_path(Path::new("/data/raw/emlid")).is_err());
    }

    #[test]
    fn test_output_path_raw_export() {
        let input = Path::new("/data/raw/SALVO/20240420-BEO/magnaprobe/salvo_beo_line_magnaprobe_20240420.00.csv");
        let out = output_path(input, "a").unwrap();
        assert_eq!(
            out,
            Path::new("/data/working_a/SALVO/20240420-BEO/magnaprobe/salvo_beo_line_magnaprobe_20240420.a1.csv")
        );
    }

    #[test]
    fn test_output_path_increments_level() {
        let input = Path::new("/data/working_a/20240420-BEO/probe_20240420.a2.csv");
        let out = output_path(input, "a").unwrap();
        assert_eq!(out, Path::new("/data/working_a/20240420-BEO/probe_20240420.a3.csv"));
    }

    #[test]
    fn test_output_path_never_level_zero() {
        let out = output_path(Path::new("probe.a0.csv"), "a").unwrap();
        assert_eq!(out, Path::new("probe.a1.csv"));
    }

    #[test]
    fn test_output_path_level_only_names_directory() {
        let out = output_path(Path::new("/data/raw/probe.00.csv"), "b").unwrap();
        assert_eq!(out, Path::new("/data/working_b/probe.a1.csv"));

        let out = output_path(Path::new("/data/raw/probe.a4.csv"), "b").unwrap();
        assert_eq!(out, Path::new("/data/working_b/probe.a5.csv"));
    }

    #[test]
    fn test_output_path_unknown_level_segment() {
        for name in ["probe.b3.csv", "probe.a4294967295.csv"] {
            let result = output_path(Path::new(name), "a");
            assert!(matches!(
                result,
                Err(NamingError::Unresolved { token: Token::ProcessingLevel, .. })
            ));
        }
    }

    #[test]
    fn test_output_path_without_level() {
        let result = output_path(Path::new("/data/raw/probe.csv"), "a");
        assert!(matches!(
            result,
            Err(NamingError::Unresolved { token: Token::ProcessingLevel, .. })
        ));
    }
}
