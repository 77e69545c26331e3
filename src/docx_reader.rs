use crate::archive_reader;
use crate::error::{Error, Result};
use crate::reader::{DocumentFilter, FilterScope, Property, Source, TextSink};
use docx_rust::document::{
    BodyContent, Paragraph, ParagraphContent, Run, RunContent, Table, TableCellContent,
    TableRowContent,
};
use docx_rust::{Docx, DocxFile};
use std::io::Cursor;

/// Packages embedded in a Word document (OLE objects, nested documents)
const EMBEDDINGS_PREFIX: &str = "word/embeddings/";

pub struct DocxData {
    /// DocxFile owns the raw data; Docx borrows from it.
    /// We store the file so it lives long enough, then parse on demand.
    file: DocxFile,
    source: Source,
}

impl DocxData {
    pub fn open(source: Source) -> Result<Self> {
        let file = match &source {
            Source::File(path) => DocxFile::from_file(path),
            Source::Memory { data, .. } => DocxFile::from_reader(Cursor::new(data.as_slice())),
        }
        .map_err(|e| Error::Docx(format!("Failed to open {}: {}", source.name().display(), e)))?;
        let data = Self { file, source };
        // Reject a malformed body before any text is requested
        data.parse()?;
        Ok(data)
    }

    fn parse(&self) -> Result<Docx<'_>> {
        self.file
            .parse()
            .map_err(|e| Error::Docx(format!("Failed to parse DOCX content: {}", e)))
    }
}

impl DocumentFilter for DocxData {
    fn properties(&self) -> Vec<Property> {
        let docx = match self.parse() {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!("{}", e);
                return Vec::new();
            }
        };

        // Core is an enum with CoreNamespace and CoreNoNamespace variants
        // Both have the same fields, just different XML namespace handling
        let (title, creator, language, description) = match &docx.core {
            Some(docx_rust::core::Core::CoreNamespace(c)) => (
                c.title.as_deref().map(|s| s.to_string()),
                c.creator.as_deref().map(|s| s.to_string()),
                c.language.as_deref().map(|s| s.to_string()),
                c.description.as_deref().map(|s| s.to_string()),
            ),
            Some(docx_rust::core::Core::CoreNoNamespace(c)) => (
                c.title.as_deref().map(|s| s.to_string()),
                c.creator.as_deref().map(|s| s.to_string()),
                c.language.as_deref().map(|s| s.to_string()),
                c.description.as_deref().map(|s| s.to_string()),
            ),
            None => (None, None, None, None),
        };

        let company = match &docx.app {
            Some(docx_rust::app::App::AppNoApNamespace(a)) => {
                a.company.as_deref().map(|s| s.to_string())
            }
            Some(docx_rust::app::App::AppWithApNamespace(a)) => {
                a.company.as_deref().map(|s| s.to_string())
            }
            None => None,
        };

        [
            ("Title", title),
            ("Author", creator),
            ("Language", language),
            ("Description", description),
            ("Company", company),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| Property::new(name, value)))
        .collect()
    }

    fn text(&self, scope: &FilterScope<'_>, out: &mut dyn TextSink) -> Result<()> {
        let docx = self.parse()?;

        let mut body = BodyWriter::new(out);
        for content in &docx.document.body.content {
            body.content(content)?;
        }

        if scope.options().disable_embedded_content() {
            return Ok(());
        }
        archive_reader::for_each_entry(
            &self.source,
            |name| name.starts_with(EMBEDDINGS_PREFIX),
            |name, data| match scope.embedded(&name, data)? {
                Some(nested) => {
                    out.emit("\n")?;
                    nested.text(out)
                }
                None => Ok(()),
            },
        )
    }
}

/// Writes body elements as they are walked. Trailing whitespace is trimmed
/// and runs of blank lines collapse into one; leading and trailing blank
/// lines are dropped.
struct BodyWriter<'s> {
    out: &'s mut dyn TextSink,
    started: bool,
    pending_blank: bool,
}

impl<'s> BodyWriter<'s> {
    fn new(out: &'s mut dyn TextSink) -> Self {
        Self {
            out,
            started: false,
            pending_blank: false,
        }
    }

    fn content(&mut self, content: &BodyContent) -> Result<()> {
        match content {
            BodyContent::Paragraph(para) => self.text(&paragraph_text(para)),
            BodyContent::Table(table) => {
                for row in table_rows(table) {
                    self.line(&row)?;
                }
                self.line("")
            }
            BodyContent::Sdt(sdt) => {
                if let Some(ref sdt_content) = sdt.content {
                    for item in &sdt_content.content {
                        self.content(item)?;
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn text(&mut self, text: &str) -> Result<()> {
        text.split('\n').try_for_each(|line| self.line(line))
    }

    fn line(&mut self, line: &str) -> Result<()> {
        let line = line.trim_end();
        if line.is_empty() {
            self.pending_blank = self.started;
            return Ok(());
        }
        if self.pending_blank {
            self.out.emit("\n")?;
            self.pending_blank = false;
        }
        self.started = true;
        self.out.emit(line)
    }
}

fn paragraph_text(para: &Paragraph) -> String {
    let mut result = String::new();

    for pc in &para.content {
        match pc {
            ParagraphContent::Run(run) => push_run_text(&mut result, run),
            ParagraphContent::Link(link) => {
                if let Some(ref run) = link.content {
                    push_run_text(&mut result, run);
                }
            }
            _ => {}
        }
    }

    result
}

fn push_run_text(output: &mut String, run: &Run) {
    for rc in &run.content {
        match rc {
            RunContent::Text(t) => output.push_str(&t.text),
            RunContent::Break(_) => output.push('\n'),
            RunContent::Tab(_) => output.push('\t'),
            _ => {}
        }
    }
}

/// One line per row, cells separated by tabs
fn table_rows(table: &Table) -> Vec<String> {
    table
        .rows
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .filter_map(|cell_content| match cell_content {
                    TableRowContent::TableCell(cell) => Some(cell),
                    _ => None,
                })
                .map(|cell| {
                    cell.content
                        .iter()
                        .map(|tc| {
                            let TableCellContent::Paragraph(para) = tc;
                            paragraph_text(para).trim().to_string()
                        })
                        .filter(|text| !text.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FilterOptions;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

    fn document_xml(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| match *p {
                "" => "<w:p/>".to_string(),
                p => format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p),
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        )
    }

    fn docx_with(paragraphs: &[&str], extra: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("[Content_Types].xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(CONTENT_TYPES.as_bytes()).unwrap();
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document_xml(paragraphs).as_bytes()).unwrap();
        for (name, data) in extra {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn open(data: Vec<u8>) -> DocxData {
        DocxData::open(Source::Memory {
            name: "doc.docx".into(),
            data,
        })
        .unwrap()
    }

    #[test]
    fn paragraphs_become_lines() {
        let docx = open(docx_with(&["First paragraph", "", "", "Second paragraph  "], &[]));
        let options = FilterOptions::default();
        let mut text = String::new();
        docx.text(&FilterScope::new(&options), &mut text).unwrap();
        assert_eq!(text, "First paragraph\n\nSecond paragraph\n");
    }

    #[test]
    fn embedded_documents_follow_the_body() {
        let inner = docx_with(&["Inner text"], &[]);
        let outer = open(docx_with(
            &["Outer text"],
            &[("word/embeddings/inner.docx", inner.as_slice())],
        ));

        let options = FilterOptions::default();
        let mut text = String::new();
        outer.text(&FilterScope::new(&options), &mut text).unwrap();
        assert_eq!(text, "Outer text\n\nInner text\n");

        let options = FilterOptions::builder().disable_embedded_content(true).build();
        let mut text = String::new();
        outer.text(&FilterScope::new(&options), &mut text).unwrap();
        assert_eq!(text, "Outer text\n");
    }

    #[test]
    fn malformed_body_fails_to_open() {
        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<<<not xml").unwrap();
        let data = writer.finish().unwrap().into_inner();

        let result = DocxData::open(Source::Memory {
            name: "broken.docx".into(),
            data,
        });
        assert!(matches!(result, Err(Error::Docx(_))));
    }
}
