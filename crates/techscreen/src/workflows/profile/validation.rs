use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::CandidateProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Name,
    Email,
    Phone,
}

impl ProfileField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

/// Every failing field with its message. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{}", describe(.fields))]
pub struct ProfileValidationErrors {
    pub fields: BTreeMap<ProfileField, &'static str>,
}

impl ProfileValidationErrors {
    pub fn message(&self, field: ProfileField) -> Option<&'static str> {
        self.fields.get(&field).copied()
    }

    pub fn contains(&self, field: ProfileField) -> bool {
        self.fields.contains_key(&field)
    }
}

fn describe(fields: &BTreeMap<ProfileField, &'static str>) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{}: {message}", field.label()))
        .collect::<Vec<_>>()
        .join("; ")
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern compiles")
    })
}

pub fn validate_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// At least ten digits, formatting ignored.
pub fn validate_phone(phone: &str) -> bool {
    phone.chars().filter(char::is_ascii_digit).count() >= 10
}

pub fn validate_profile(profile: &CandidateProfile) -> Result<(), ProfileValidationErrors> {
    let mut fields = BTreeMap::new();

    let name_ok = profile
        .name
        .as_deref()
        .is_some_and(|name| name.trim().chars().count() >= 2);
    if !name_ok {
        fields.insert(ProfileField::Name, "Name is required.");
    }
    if !profile.email.as_deref().is_some_and(validate_email) {
        fields.insert(ProfileField::Email, "Valid email required.");
    }
    if !profile.phone.as_deref().is_some_and(validate_phone) {
        fields.insert(ProfileField::Phone, "Valid phone required.");
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ProfileValidationErrors { fields })
    }
}
