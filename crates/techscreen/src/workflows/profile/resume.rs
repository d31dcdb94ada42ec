use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Lines searched for a `Name:` label before falling back to the first line.
const NAME_LABEL_LINES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeFormat {
    Pdf,
    Docx,
}

impl ResumeFormat {
    /// Picks the format from the MIME type, then from the file extension.
    pub fn detect(file_name: &str, mime_type: Option<&str>) -> Result<Self, ResumeError> {
        let essence = mime_type
            .and_then(|raw| raw.parse::<mime::Mime>().ok())
            .map(|parsed| parsed.essence_str().to_ascii_lowercase());
        match essence.as_deref() {
            Some(essence) if essence == mime::APPLICATION_PDF.essence_str() => {
                return Ok(Self::Pdf)
            }
            Some(DOCX_MIME) => return Ok(Self::Docx),
            _ => {}
        }

        let lowered = file_name.to_ascii_lowercase();
        if lowered.ends_with(".pdf") {
            Ok(Self::Pdf)
        } else if lowered.ends_with(".docx") {
            Ok(Self::Docx)
        } else {
            Err(ResumeError::UnsupportedFormat {
                file_name: file_name.to_string(),
            })
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
        }
    }
}

impl fmt::Display for ResumeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResumeError {
    #[error("unsupported file type for '{file_name}'; please upload a PDF or DOCX")]
    UnsupportedFormat { file_name: String },
    #[error("could not read {format} resume: {message}")]
    Extraction {
        format: ResumeFormat,
        message: String,
    },
    #[error("resume '{file_name}' contains no readable text")]
    Empty { file_name: String },
}

/// Turns an uploaded document into plain text.
pub trait ResumeTextExtractor {
    fn extract_text(&self, format: ResumeFormat, bytes: &[u8]) -> Result<String, ResumeError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedResume {
    pub file_name: String,
    pub format: ResumeFormat,
    pub contact: ContactDetails,
    pub text: String,
}

struct ContactPatterns {
    email: Regex,
    phone: Regex,
    name_label: Regex,
    capitalized_words: Regex,
}

fn patterns() -> &'static ContactPatterns {
    static PATTERNS: OnceLock<ContactPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ContactPatterns {
        email: Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
            .expect("email pattern compiles"),
        phone: Regex::new(
            r"(\+[0-9]{1,3}[-.\s]?)?(\(?[0-9]{3}\)?[-.\s]?)?[0-9]{3}[-.\s]?[0-9]{4,}",
        )
        .expect("phone pattern compiles"),
        name_label: Regex::new(r"(?i)name[:\s]*").expect("name label pattern compiles"),
        capitalized_words: Regex::new(r"([A-Z][a-z]+\s)+[A-Z][a-z]+")
            .expect("capitalized words pattern compiles"),
    })
}

/// Best-effort contact extraction. Each field is `None` when nothing plausible is found.
pub fn extract_contact_details(text: &str) -> ContactDetails {
    let patterns = patterns();
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let labelled = lines
        .iter()
        .take(NAME_LABEL_LINES)
        .find(|line| has_name_label(line))
        .map(|line| patterns.name_label.replacen(line, 1, "").trim().to_string());
    let name = match labelled {
        Some(name) => Some(name),
        None => lines.first().and_then(|first| {
            patterns
                .capitalized_words
                .find(first)
                .map(|found| found.as_str().trim().to_string())
        }),
    }
    .filter(|name| !name.is_empty());

    ContactDetails {
        name,
        email: patterns.email.find(text).map(|m| m.as_str().to_string()),
        phone: patterns.phone.find(text).map(|m| m.as_str().to_string()),
    }
}

/// `name` followed by a colon or whitespace, in any case.
fn has_name_label(line: &str) -> bool {
    let lowered = line.to_lowercase();
    lowered.match_indices("name").any(|(at, _)| {
        lowered[at + 4..]
            .chars()
            .next()
            .is_some_and(|next| next == ':' || next.is_whitespace())
    })
}

pub fn parse_resume(
    bytes: &[u8],
    file_name: &str,
    mime_type: Option<&str>,
    extractor: &dyn ResumeTextExtractor,
) -> Result<ParsedResume, ResumeError> {
    let format = ResumeFormat::detect(file_name, mime_type)?;
    let text = extractor.extract_text(format, bytes)?;
    if text.trim().is_empty() {
        return Err(ResumeError::Empty {
            file_name: file_name.to_string(),
        });
    }

    tracing::debug!(file_name, %format, chars = text.len(), "resume text extracted");
    Ok(ParsedResume {
        file_name: file_name.to_string(),
        format,
        contact: extract_contact_details(&text),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Utf8Extractor;

    impl ResumeTextExtractor for Utf8Extractor {
        fn extract_text(&self, format: ResumeFormat, bytes: &[u8]) -> Result<String, ResumeError> {
            String::from_utf8(bytes.to_vec()).map_err(|err| ResumeError::Extraction {
                format,
                message: err.to_string(),
            })
        }
    }

    #[test]
    fn format_detection_prefers_mime_then_extension() {
        assert_eq!(
            ResumeFormat::detect("cv.bin", Some("application/pdf")).unwrap(),
            ResumeFormat::Pdf
        );
        assert_eq!(
            ResumeFormat::detect("cv.bin", Some(DOCX_MIME)).unwrap(),
            ResumeFormat::Docx
        );
        assert_eq!(
            ResumeFormat::detect("CV.PDF", None).unwrap(),
            ResumeFormat::Pdf
        );
        assert!(matches!(
            ResumeFormat::detect("cv.txt", Some("text/plain")),
            Err(ResumeError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn labelled_name_wins_over_first_line() {
        let text = "Curriculum Vitae\nName: Jane Doe\nEmail jane.doe@example.com\nTel +1 555-123-4567\n";
        let contact = extract_contact_details(text);
        assert_eq!(contact.name.as_deref(), Some("Jane Doe"));
        assert_eq!(contact.email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(contact.phone.as_deref(), Some("+1 555-123-4567"));
    }

    #[test]
    fn falls_back_to_capitalized_words_on_first_line() {
        let contact = extract_contact_details("  John Smith  \nSenior Engineer\n");
        assert_eq!(contact.name.as_deref(), Some("John Smith"));
        assert_eq!(contact.email, None);
        assert_eq!(contact.phone, None);
    }

    #[test]
    fn no_name_when_first_line_is_not_a_name() {
        let contact = extract_contact_details("resume\nengineer");
        assert_eq!(contact.name, None);
    }

    #[test]
    fn parse_resume_rejects_blank_documents() {
        let err = parse_resume(b"   \n", "cv.pdf", None, &Utf8Extractor).unwrap_err();
        assert!(matches!(err, ResumeError::Empty { .. }));
    }

    #[test]
    fn parse_resume_fills_contact_details() {
        let parsed = parse_resume(
            b"Ada Lovelace\nada@analytical.org\n(555) 987-6543",
            "ada.docx",
            None,
            &Utf8Extractor,
        )
        .unwrap();
        assert_eq!(parsed.format, ResumeFormat::Docx);
        assert_eq!(parsed.contact.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(parsed.contact.phone.as_deref(), Some("(555) 987-6543"));
    }
}
