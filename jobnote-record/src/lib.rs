//! The job-posting record and its on-disk Markdown form.
//!
//! - [`JobPosting`]: normalized record built from extracted fields
//! - [`document`]: fixed-schema front matter + description body
//! - [`filename`]: filesystem-safe names derived from company and role
//! - [`persist`]: directory creation and collision-aware writes

pub mod document;
pub mod filename;
pub mod persist;

use chrono::NaiveDate;
use jobnote_llm::JobFields;
use serde::{Deserialize, Serialize};

pub use document::{assemble, Document};
pub use filename::{base_name, sanitize_filename};
pub use persist::persist;

/// Application-tracking flags every new record starts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingDefaults {
    pub applied: bool,
    pub recruiter_screen: String,
    pub interview: bool,
    pub rejection: bool,
    pub declined: bool,
}

impl Default for TrackingDefaults {
    fn default() -> Self {
        Self {
            applied: true,
            recruiter_screen: String::new(),
            interview: false,
            rejection: false,
            declined: false,
        }
    }
}

/// A normalized job posting, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub company: String,
    pub role: String,
    pub location: String,
    pub compensation: String,
    pub requisition_id: String,
    pub description: String,
    pub source_url: String,
    pub date_applied: NaiveDate,
    pub tracking: TrackingDefaults,
}

impl JobPosting {
    /// Build a record from successfully extracted fields.
    ///
    /// The description starts as the model's plain text; the formatting stage
    /// replaces it once through [`JobPosting::with_description`].
    pub fn from_fields(fields: JobFields, source_url: &str, date_applied: NaiveDate) -> Self {
        Self {
            company: fields.company.trim().to_string(),
            role: fields.role.trim().to_string(),
            location: fields.location.trim().to_string(),
            compensation: fields.comp.trim().to_string(),
            requisition_id: fields.req.trim().to_string(),
            description: fields.description.trim().to_string(),
            source_url: source_url.to_string(),
            date_applied,
            tracking: TrackingDefaults::default(),
        }
    }

    pub fn with_description(self, description: String) -> Self {
        Self {
            description,
            ..self
        }
    }
}
