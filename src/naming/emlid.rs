//! Canonical names for emlid receiver logs (Reach RS2 / Reach M2).

use chrono::NaiveDateTime;
use log::debug;

use super::{LogType, NamingError, Result, Token};
use crate::config::{LogTypeRule, NamingTables};

/// Date-time layouts recognised in name segments, keyed by segment length.
const DATE_PATTERNS: [(usize, &str); 2] = [(12, "%Y%m%d%H%M"), (14, "%Y%m%d%H%M%S")];

/// Date-time layout of the canonical date token.
const DATE_TOKEN_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Detect the log type of a file or directory name.
///
/// Matching is case-insensitive and follows the priority rinex, ubx, raw,
/// llh: the first type whose keyword appears in the name wins.
///
/// # Example
///
/// ```
/// use salvo::naming::{detect_log_type, LogType};
///
/// assert_eq!(detect_log_type("salvo_ice_ubx_foo.UBX"), Some(LogType::Ubx));
/// assert_eq!(detect_log_type("notes.txt"), None);
/// ```
pub fn detect_log_type(name: &str) -> Option<LogType> {
    detect_log_type_with(name, &NamingTables::default().log_types)
}

/// Detect the log type using an explicit ordered rule list.
pub fn detect_log_type_with(name: &str, rules: &[LogTypeRule]) -> Option<LogType> {
    let lower = name.to_lowercase();
    rules
        .iter()
        .find(|rule| lower.contains(&rule.keyword.to_lowercase()))
        .map(|rule| rule.log_type)
}

/// Resolve the instrument tag of a name from the ordered instrument table.
///
/// Keywords are matched case-sensitively; the first rule found in the name
/// wins.
pub fn resolve_instrument<'a>(name: &str, tables: &'a NamingTables) -> Result<&'a str> {
    tables
        .instruments
        .iter()
        .find(|rule| name.contains(rule.keyword.as_str()))
        .map(|rule| rule.tag.as_str())
        .ok_or_else(|| NamingError::unresolved(Token::Instrument, name))
}

/// Extract the acquisition date-time embedded in a name.
///
/// The name is split on `_`; each segment is cut at its first `.` and the
/// first segment of 12 (`YYYYMMDDHHMM`) or 14 (`YYYYMMDDHHMMSS`) characters
/// that parses as a valid date-time is returned.
pub fn extract_timestamp(name: &str) -> Result<NaiveDateTime> {
    name.split('_')
        .filter_map(|segment| segment.split('.').next())
        .find_map(|segment| {
            DATE_PATTERNS
                .iter()
                .find(|(len, _)| *len == segment.len())
                .and_then(|(_, fmt)| NaiveDateTime::parse_from_str(segment, fmt).ok())
        })
        .ok_or_else(|| NamingError::unresolved(Token::Date, name))
}

/// Build the canonical SALVO name of an emlid log with the default tables.
///
/// See [`build_canonical_name_with`].
///
/// # Example
///
/// ```
/// use salvo::naming::build_canonical_name;
///
/// let name = build_canonical_name("reachm2_raw_202406082214.ubx", "beo", "line", None).unwrap();
/// assert_eq!(name, "salvo_beo_line_reachm2-salvo-ubx_20240608-221400");
/// ```
pub fn build_canonical_name(
    name: &str,
    site: &str,
    location: &str,
    sample_rate_hz: Option<f64>,
) -> Result<String> {
    build_canonical_name_with(name, site, location, sample_rate_hz, &NamingTables::default())
}

/// Build `<project>_<site>_<location>_<instrument>-<logtype>[<rate>]_<YYYYMMDD-HHMMSS>`.
///
/// Site and location are lower-cased. The sample rate, if any, is appended to
/// the log type tag with no decimals.
///
/// # Errors
///
/// Returns [`NamingError::Unresolved`] if the instrument, the log type or the
/// date cannot be found in `name`.
pub fn build_canonical_name_with(
    name: &str,
    site: &str,
    location: &str,
    sample_rate_hz: Option<f64>,
    tables: &NamingTables,
) -> Result<String> {
    let instrument = resolve_instrument(name, tables)?;
    let log_type = detect_log_type_with(name, &tables.log_types)
        .ok_or_else(|| NamingError::unresolved(Token::LogType, name))?;
    let timestamp = extract_timestamp(name)?;

    let log_tag = match sample_rate_hz {
        Some(rate) => format!("{}{:.0}", log_type, rate),
        None => log_type.to_string(),
    };

    let canonical = compose_canonical(tables, site, location, instrument, &log_tag, &timestamp);
    debug!("Canonical name for '{}': {}", name, canonical);
    Ok(canonical)
}

/// Join resolved tokens into a canonical name; empty parts are dropped.
pub(crate) fn compose_canonical(
    tables: &NamingTables,
    site: &str,
    location: &str,
    instrument: &str,
    log_tag: &str,
    timestamp: &NaiveDateTime,
) -> String {
    [
        tables.project.clone(),
        site.to_lowercase(),
        location.to_lowercase(),
        format!("{}-{}", instrument, log_tag),
        timestamp.format(DATE_TOKEN_FORMAT).to_string(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("_")
}
