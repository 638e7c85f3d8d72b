use crate::JobPosting;
use regex::Regex;

pub const MAX_FILENAME_CHARS: usize = 150;
pub const DEFAULT_FILENAME: &str = "Unnamed Job Posting";

/// Human-readable base name before sanitization.
pub fn base_name(posting: &JobPosting) -> String {
    let company = posting.company.trim();
    let role = posting.role.trim();
    match (company.is_empty(), role.is_empty()) {
        (false, false) => format!("{company} - {role}"),
        (true, false) => format!("Unknown Company - {role}"),
        (false, true) => format!("{company} - Unknown Role"),
        (true, true) => format!("Job Posting {}", posting.date_applied.format("%Y-%m-%d")),
    }
}

/// Make `name` safe to use as a file stem on common filesystems.
///
/// Strips `< > : " / \ | ? *` and control characters, collapses whitespace
/// runs, trims, and caps the length at [`MAX_FILENAME_CHARS`] characters.
/// Never returns an empty string, and sanitizing twice changes nothing.
///
/// ```
/// use jobnote_record::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Acme: R&D / Tools"), "Acme R&D Tools");
/// assert_eq!(sanitize_filename("???"), "Unnamed Job Posting");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let stripped: String = name
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    let collapsed = match Regex::new(r"\s+") {
        Ok(re) => re.replace_all(&stripped, " ").into_owned(),
        Err(_) => stripped.split_whitespace().collect::<Vec<_>>().join(" "),
    };

    let truncated: String = collapsed.trim().chars().take(MAX_FILENAME_CHARS).collect();
    let result = truncated.trim_end();
    if result.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        result.to_string()
    }
}
