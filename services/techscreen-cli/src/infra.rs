use metrics_exporter_prometheus::PrometheusHandle;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use techscreen::config::AppConfig;
use techscreen::error::AppError;
use techscreen::persistence::{FileStore, SnapshotStore};
use techscreen::workflows::interview::{BootReport, InterviewController, SystemClock};
use techscreen::workflows::profile::{
    parse_resume, ParsedResume, ResumeError, ResumeFormat, ResumeTextExtractor,
};
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Rehydrates the controller from the configured data directory.
pub(crate) fn open_controller(config: &AppConfig) -> (InterviewController<FileStore>, BootReport) {
    let backend = FileStore::new(&config.storage.data_dir);
    let (controller, report) = InterviewController::boot(
        SnapshotStore::new(backend, config.storage.key.clone()),
        Arc::new(SystemClock),
    );
    if let Some(warning) = &report.warning {
        warn!(source = ?report.source, %warning, "saved state not restored");
    }
    (controller, report)
}

/// PDF text through `pdf-extract`, DOCX text from the package's `word/document.xml`.
pub(crate) struct DocumentTextExtractor;

impl ResumeTextExtractor for DocumentTextExtractor {
    fn extract_text(&self, format: ResumeFormat, bytes: &[u8]) -> Result<String, ResumeError> {
        let extracted = match format {
            ResumeFormat::Pdf => {
                pdf_extract::extract_text_from_mem(bytes).map_err(|err| err.to_string())
            }
            ResumeFormat::Docx => docx_text(bytes),
        };
        extracted.map_err(|message| ResumeError::Extraction { format, message })
    }
}

const DOCX_BODY: &str = "word/document.xml";

/// Paragraphs become lines; runs inside a paragraph are concatenated.
fn docx_text(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| format!("not a DOCX package: {err}"))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|err| format!("{DOCX_BODY}: {err}"))?
        .read_to_string(&mut xml)
        .map_err(|err| format!("{DOCX_BODY}: {err}"))?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_run_text = false;
    loop {
        match reader.read_event().map_err(|err| err.to_string())? {
            Event::Start(tag) if tag.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(tag) if tag.name().as_ref() == b"w:t" => in_run_text = false,
            Event::End(tag) if tag.name().as_ref() == b"w:p" => text.push('\n'),
            Event::Empty(tag) if tag.name().as_ref() == b"w:tab" => text.push('\t'),
            Event::Empty(tag) if matches!(tag.name().as_ref(), b"w:br" | b"w:cr") => {
                text.push('\n')
            }
            Event::Text(run) if in_run_text => {
                text.push_str(&run.unescape().map_err(|err| err.to_string())?)
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}

pub(crate) fn load_resume(path: &Path) -> Result<ParsedResume, AppError> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = mime_guess::from_path(path).first_raw();
    Ok(parse_resume(
        &bytes,
        &file_name,
        mime_type,
        &DocumentTextExtractor,
    )?)
}
