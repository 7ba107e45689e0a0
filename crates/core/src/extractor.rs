use crate::error::ExtractError;
use lopdf::Document;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

const PLAIN_TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "rst", "log", "py", "js", "ts", "rs", "go", "java", "c", "h", "cpp",
    "json", "csv", "tsv", "toml", "yaml", "yml", "xml", "html", "htm", "css", "sh", "ini", "cfg",
];

const DOCX_BODY: &str = "word/document.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    PlainText,
    Docx,
    Pdf,
}

impl ExtractorKind {
    pub fn for_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();

        match extension.as_str() {
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            other if PLAIN_TEXT_EXTENSIONS.contains(&other) => Some(Self::PlainText),
            _ => None,
        }
    }
}

pub trait FileExtractor {
    fn try_extract(&self, path: &Path) -> Result<String, ExtractError>;

    /// Best-effort text for `path`. Every failure degrades to an empty string.
    fn extract(&self, path: &Path) -> String {
        match self.try_extract(path) {
            Ok(text) => text,
            Err(error) => {
                debug!(path = %path.display(), %error, "no text extracted");
                String::new()
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FormatExtractor;

impl FileExtractor for FormatExtractor {
    fn try_extract(&self, path: &Path) -> Result<String, ExtractError> {
        match ExtractorKind::for_path(path) {
            Some(ExtractorKind::PlainText) => read_plain_text(path),
            Some(ExtractorKind::Docx) => read_docx(path),
            Some(ExtractorKind::Pdf) => read_pdf(path),
            None => Err(ExtractError::Unsupported(path.display().to_string())),
        }
    }
}

fn read_plain_text(path: &Path) -> Result<String, ExtractError> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_docx(path: &Path) -> Result<String, ExtractError> {
    let file = File::open(path)?;
    let mut archive =
        ZipArchive::new(file).map_err(|error| ExtractError::DocxParse(error.to_string()))?;
    let mut entry = archive
        .by_name(DOCX_BODY)
        .map_err(|error| ExtractError::DocxParse(error.to_string()))?;

    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;

    let paragraphs = docx_paragraphs(&xml)?;
    Ok(paragraphs.join("\n"))
}

/// Collects the run text of every `w:p` element in document order.
fn docx_paragraphs(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut paragraph_depth = 0usize;
    let mut in_run = false;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|error| ExtractError::DocxParse(error.to_string()))?;

        match event {
            Event::Start(element) => match element.local_name().as_ref() {
                b"p" => paragraph_depth += 1,
                b"r" => in_run = true,
                b"t" => in_text = true,
                _ => {}
            },
            Event::End(element) => match element.local_name().as_ref() {
                b"p" => {
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                    if paragraph_depth == 0 {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                }
                b"r" => in_run = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Empty(element) => match element.local_name().as_ref() {
                b"p" if paragraph_depth == 0 => paragraphs.push(String::new()),
                b"tab" if in_run => current.push('\t'),
                b"br" | b"cr" if in_run => current.push('\n'),
                _ => {}
            },
            Event::Text(text) if in_text => {
                let unescaped = text
                    .unescape()
                    .map_err(|error| ExtractError::DocxParse(error.to_string()))?;
                current.push_str(&unescaped);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn read_pdf(path: &Path) -> Result<String, ExtractError> {
    let document =
        Document::load(path).map_err(|error| ExtractError::PdfParse(error.to_string()))?;

    let mut text = String::new();
    for page_no in document.get_pages().into_keys() {
        match document.extract_text(&[page_no]) {
            Ok(page_text) if !page_text.is_empty() => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Ok(_) => {}
            Err(error) => {
                debug!(path = %path.display(), page = page_no, %error, "skipping unreadable pdf page");
            }
        }
    }

    Ok(text)
}
