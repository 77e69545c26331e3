use crate::error::{Error, Result};
use crate::reader::{DocumentFilter, FilterScope, Property, Source, TextSink};
use lopdf::{Dictionary, Document, Object};

/// Info dictionary keys reported as properties, with their display names
const INFO_KEYS: &[(&[u8], &str)] = &[
    (b"Title", "Title"),
    (b"Author", "Author"),
    (b"Subject", "Subject"),
    (b"Keywords", "Keywords"),
    (b"Creator", "Creator"),
    (b"Producer", "Producer"),
];

pub struct PdfData {
    source: Source,
    /// Parsed at open so a corrupt file fails before any output exists
    document: Document,
}

impl PdfData {
    pub fn open(source: Source) -> Result<Self> {
        let document = match &source {
            Source::File(path) => Document::load(path)?,
            Source::Memory { data, .. } => Document::load_mem(data)?,
        };
        Ok(Self { source, document })
    }

    fn extract_pages(&self) -> Result<Vec<String>> {
        let pages = match &self.source {
            Source::File(path) => pdf_extract::extract_text_by_pages(path),
            Source::Memory { data, .. } => pdf_extract::extract_text_from_mem_by_pages(data),
        };
        pages.map_err(|e| {
            Error::Pdf(format!(
                "Failed to extract text from {}: {}",
                self.source.name().display(),
                e
            ))
        })
    }
}

impl DocumentFilter for PdfData {
    fn properties(&self) -> Vec<Property> {
        let Some(info) = info_dictionary(&self.document) else {
            tracing::debug!("No Info dictionary in PDF: {}", self.source.name().display());
            return Vec::new();
        };

        INFO_KEYS
            .iter()
            .filter_map(|(key, name)| {
                let value = info
                    .get(key)
                    .ok()
                    .and_then(|obj| pdf_string(&self.document, obj))?;
                Some(Property::new(*name, value))
            })
            .collect()
    }

    fn text(&self, _scope: &FilterScope<'_>, out: &mut dyn TextSink) -> Result<()> {
        for page in self.extract_pages()? {
            out.emit(&page)?;
        }
        Ok(())
    }
}

fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    match document.trailer.get(b"Info").ok()? {
        Object::Reference(id) => document.get_object(*id).ok()?.as_dict().ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn pdf_string(document: &Document, object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Reference(id) => pdf_string(document, document.get_object(*id).ok()?),
        _ => None,
    }
}

/// UTF-16BE with a byte order mark, otherwise UTF-8 falling back to Latin-1
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FilterOptions;

    #[test]
    fn decodes_utf16_strings() {
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&bytes), "Hi");
    }

    #[test]
    fn decodes_latin1_fallback() {
        assert_eq!(decode_pdf_string(b"caf\xE9"), "caf\u{E9}");
        assert_eq!(decode_pdf_string(b"plain"), "plain");
    }

    #[test]
    fn broken_pdf_fails_to_open() {
        let result = PdfData::open(Source::Memory {
            name: "broken.pdf".into(),
            data: b"%PDF-1.4\nnot really a pdf".to_vec(),
        });
        assert!(matches!(result, Err(Error::Pdf(_))));
    }

    /// One page per entry of `pages`, Helvetica text, Title in the Info dictionary
    fn sample_pdf(title: &str, pages: &[&str]) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut data = Vec::new();
        doc.save_to(&mut data).unwrap();
        data
    }

    #[test]
    fn pages_stream_in_order_with_info_properties() {
        let pdf = PdfData::open(Source::Memory {
            name: "sample.pdf".into(),
            data: sample_pdf("Quarterly Report", &["Opening page", "Closing page"]),
        })
        .unwrap();

        assert_eq!(pdf.properties(), [Property::new("Title", "Quarterly Report")]);

        let options = FilterOptions::default();
        let mut text = String::new();
        pdf.text(&FilterScope::new(&options), &mut text).unwrap();
        let opening = text.find("Opening page").expect("first page text");
        let closing = text.find("Closing page").expect("second page text");
        assert!(opening < closing);
    }
}
