//! Candidate intake: the profile an interview is started for, its validation contract and
//! resume text extraction.

mod resume;
mod validation;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::interview::domain::CandidateId;

pub use resume::{
    extract_contact_details, parse_resume, ContactDetails, ParsedResume, ResumeError,
    ResumeFormat, ResumeTextExtractor,
};
pub use validation::{
    validate_email, validate_phone, validate_profile, ProfileField, ProfileValidationErrors,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: CandidateId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub resume_file_name: Option<String>,
    #[serde(default)]
    pub resume_text: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl CandidateProfile {
    pub fn new() -> Self {
        Self {
            id: CandidateId::generate(),
            name: None,
            email: None,
            phone: None,
            resume_file_name: None,
            resume_text: None,
            uploaded_at: None,
        }
    }

    /// Pre-fills contact fields from whatever the resume yielded. Missing fields stay empty
    /// and are caught by [`validate_profile`].
    pub fn from_resume(parsed: ParsedResume, uploaded_at: DateTime<Utc>) -> Self {
        let ParsedResume {
            contact,
            text,
            file_name,
            ..
        } = parsed;
        Self {
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            resume_file_name: Some(file_name),
            resume_text: Some(text),
            uploaded_at: Some(uploaded_at),
            ..Self::new()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown candidate")
    }
}

impl Default for CandidateProfile {
    fn default() -> Self {
        Self::new()
    }
}
