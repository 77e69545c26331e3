//! Format detection for filterable documents.

use crate::error::{Error, Result};
use crate::reader::Source;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Magic bytes for PDF documents
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Magic bytes for ZIP containers (DOCX, EPUB, plain archives)
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Media type stored in the `mimetype` entry of an EPUB
const EPUB_MIMETYPE: &str = "application/epub+zip";

/// Media type prefix of OpenDocument packages (odt, ods, odp)
const ODF_MIMETYPE_PREFIX: &str = "application/vnd.oasis.opendocument.";

/// Part list every Office Open XML package (docx, xlsx, pptx) carries
const OOXML_CONTENT_TYPES: &str = "[Content_Types].xml";

/// Extensions read as plain text
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "text", "md", "markdown", "rst", "csv", "tsv", "log", "json", "xml", "yaml", "yml",
    "toml", "ini", "cfg", "conf", "rs", "c", "h", "cpp", "hpp", "cs", "java", "py", "js", "ts",
    "sh", "bat", "sql", "css",
];

const HTML_EXTENSIONS: &[&str] = &["html", "htm", "xhtml"];

/// Formats the engine has a backend for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    PlainText,
    Html,
    Pdf,
    Docx,
    Epub,
    /// ZIP archive whose entries are filtered one by one
    Archive,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::PlainText => write!(f, "plain text"),
            Format::Html => write!(f, "HTML"),
            Format::Pdf => write!(f, "PDF"),
            Format::Docx => write!(f, "DOCX"),
            Format::Epub => write!(f, "EPUB"),
            Format::Archive => write!(f, "ZIP archive"),
        }
    }
}

/// Detect the format of a document, content first, then extension
pub fn detect(source: &Source) -> Result<Format> {
    let mut head = [0u8; 8];
    let len = match source {
        Source::File(path) => read_head(&mut File::open(path)?, &mut head)?,
        Source::Memory { data, .. } => {
            let len = data.len().min(head.len());
            head[..len].copy_from_slice(&data[..len]);
            len
        }
    };
    let head = &head[..len];

    if head.starts_with(PDF_MAGIC) {
        return Ok(Format::Pdf);
    }

    if head.starts_with(&ZIP_MAGIC) {
        return match source {
            Source::File(path) => detect_container(File::open(path)?, path),
            Source::Memory { name, data } => detect_container(Cursor::new(data.as_slice()), name),
        };
    }

    let extension = source
        .name()
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if TEXT_EXTENSIONS.contains(&extension.as_str()) {
        Ok(Format::PlainText)
    } else if HTML_EXTENSIONS.contains(&extension.as_str()) {
        Ok(Format::Html)
    } else {
        Err(Error::UnsupportedFormat(format!(
            "no filter for {}",
            source.name().display()
        )))
    }
}

fn read_head<R: Read>(reader: &mut R, buffer: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Tell DOCX and EPUB packages apart from ordinary archives by their entries.
/// Other office packages have no backend; reading them as an archive would
/// dump their XML parts.
fn detect_container<R: Read + Seek>(reader: R, name: &Path) -> Result<Format> {
    let mut archive = ZipArchive::new(reader)?;

    if archive.by_name("word/document.xml").is_ok() {
        return Ok(Format::Docx);
    }

    if let Ok(mut entry) = archive.by_name("mimetype") {
        let mut mimetype = String::new();
        if entry.read_to_string(&mut mimetype).is_ok() {
            let mimetype = mimetype.trim();
            if mimetype == EPUB_MIMETYPE {
                return Ok(Format::Epub);
            }
            if mimetype.starts_with(ODF_MIMETYPE_PREFIX) {
                return Err(Error::UnsupportedFormat(format!(
                    "no filter for OpenDocument package {} ({})",
                    name.display(),
                    mimetype
                )));
            }
        }
    }

    if archive.by_name("META-INF/container.xml").is_ok() {
        return Ok(Format::Epub);
    }

    if archive.by_name(OOXML_CONTENT_TYPES).is_ok() {
        return Err(Error::UnsupportedFormat(format!(
            "no filter for Office Open XML package {}",
            name.display()
        )));
    }

    Ok(Format::Archive)
}
