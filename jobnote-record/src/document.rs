use crate::filename::{base_name, sanitize_filename};
use crate::JobPosting;

/// Header keys, in the order they are written.
pub const HEADER_KEYS: [&str; 13] = [
    "company",
    "tags",
    "role",
    "location",
    "applied",
    "date_applied",
    "recruiter_screen",
    "interview",
    "rejection",
    "declined",
    "comp",
    "req",
    "link",
];

/// Rendered document plus the sanitized file stem (no extension).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub file_stem: String,
}

/// Render `posting` as front matter followed by the description section.
pub fn assemble(posting: &JobPosting) -> Document {
    let tracking = &posting.tracking;
    let recruiter_screen = if tracking.recruiter_screen.is_empty() {
        "''".to_string()
    } else {
        header_value(&tracking.recruiter_screen)
    };

    let text = format!(
        "---\n\
         company: {company}\n\
         tags:\n  - jobpost\n\
         role: {role}\n\
         location: {location}\n\
         applied: {applied}\n\
         date_applied: {date}\n\
         recruiter_screen: {recruiter_screen}\n\
         interview: {interview}\n\
         rejection: {rejection}\n\
         declined: {declined}\n\
         comp: {comp}\n\
         req: {req}\n\
         link: {link}\n\
         ---\n\
         \n\
         ## Description\n\
         \n\
         {description}\n",
        company = header_value(&posting.company),
        role = header_value(&posting.role),
        location = header_value(&posting.location),
        applied = tracking.applied,
        date = posting.date_applied.format("%Y-%m-%d"),
        interview = tracking.interview,
        rejection = tracking.rejection,
        declined = tracking.declined,
        comp = header_value(&posting.compensation),
        req = header_value(&posting.requisition_id),
        link = header_value(&posting.source_url),
        description = posting.description,
    );

    Document {
        text: normalize_line_endings(&text),
        file_stem: sanitize_filename(&base_name(posting)),
    }
}

/// Fold a value onto a single line so it cannot break the header shape.
fn header_value(raw: &str) -> String {
    if raw.contains(['\n', '\r']) {
        raw.split(['\n', '\r'])
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        raw.to_string()
    }
}

pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrackingDefaults;
    use chrono::NaiveDate;

    fn posting() -> JobPosting {
        JobPosting {
            company: "Acme".into(),
            role: "Backend Engineer".into(),
            location: "Remote".into(),
            compensation: "$150k".into(),
            requisition_id: "R-42".into(),
            description: "Line one\r\nLine two\rLine three".into(),
            source_url: "https://jobs.example.com/42?ref=abc".into(),
            date_applied: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            tracking: TrackingDefaults::default(),
        }
    }

    fn header_keys(text: &str) -> Vec<String> {
        let body = text.strip_prefix("---\n").unwrap();
        let end = body.find("\n---\n").unwrap();
        body[..end]
            .lines()
            .filter(|line| !line.starts_with(' '))
            .map(|line| line.split(':').next().unwrap().to_string())
            .collect()
    }

    #[test]
    fn renders_full_document() {
        let doc = assemble(&posting());
        let expected = "---\n\
company: Acme\n\
tags:\n  - jobpost\n\
role: Backend Engineer\n\
location: Remote\n\
applied: true\n\
date_applied: 2026-10-18\n\
recruiter_screen: ''\n\
interview: false\n\
rejection: false\n\
declined: false\n\
comp: $150k\n\
req: R-42\n\
link: https://jobs.example.com/42?ref=abc\n\
---\n\
\n\
## Description\n\
\n\
Line one\nLine two\nLine three\n";
        assert_eq!(doc.text, expected);
        assert_eq!(doc.file_stem, "Acme - Backend Engineer");
    }

    #[test]
    fn empty_fields_still_emit_every_key() {
        let mut empty = posting();
        empty.company.clear();
        empty.role.clear();
        empty.location.clear();
        empty.compensation.clear();
        empty.requisition_id.clear();
        empty.description.clear();

        let doc = assemble(&empty);
        assert_eq!(header_keys(&doc.text), HEADER_KEYS);
        assert!(doc.text.contains("\ncompany: \n"));
        assert!(doc.text.ends_with("## Description\n\n\n"));
        assert_eq!(doc.file_stem, "Job Posting 2026-10-18");
    }

    #[test]
    fn multiline_values_are_folded() {
        let mut p = posting();
        p.company = "Acme\nHoldings".into();
        p.location = "Berlin,\r\n  Remote".into();
        let doc = assemble(&p);
        assert!(doc.text.contains("\ncompany: Acme Holdings\n"));
        assert!(doc.text.contains("\nlocation: Berlin, Remote\n"));
        assert_eq!(header_keys(&doc.text).len(), 13);
        assert!(!doc.text.contains('\r'));
    }
}
