use crate::error::{Error, Result};
use crate::markdown;
use crate::reader::{DocumentFilter, FilterScope, Property, Source, TextSink};
use rbook::prelude::*;
use rbook::Epub;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub struct EpubData {
    epub: Epub,
    /// rbook opens paths, so in-memory sources live in a temp file meanwhile
    _spill: Option<NamedTempFile>,
}

impl EpubData {
    pub fn open(source: &Source) -> Result<Self> {
        match source {
            Source::File(path) => Ok(Self {
                epub: open_epub(path)?,
                _spill: None,
            }),
            Source::Memory { name, data } => {
                let mut spill = tempfile::Builder::new().suffix(".epub").tempfile()?;
                spill.write_all(data)?;
                spill.flush()?;
                let epub = open_epub(spill.path()).map_err(|e| match e {
                    Error::Epub(reason) => Error::Epub(format!("{}: {}", name.display(), reason)),
                    other => other,
                })?;
                Ok(Self {
                    epub,
                    _spill: Some(spill),
                })
            }
        }
    }

    /// Spine chapters in reading order, each converted as soon as it is read
    fn for_each_chapter<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(String) -> Result<()>,
    {
        let mut reader = self.epub.reader();

        while let Some(result) = reader.read_next() {
            let data = result.map_err(|e| Error::Epub(format!("Failed to read chapter: {}", e)))?;
            let html_content = data.content().to_string();

            // Skip empty or near-empty content
            if html_content.trim().is_empty() {
                continue;
            }

            visit(markdown::html_to_text(&html_content))?;
        }

        Ok(())
    }
}

fn open_epub(path: &Path) -> Result<Epub> {
    Epub::options()
        .strict(false)
        .open(path)
        .map_err(|e| Error::Epub(format!("Failed to open {}: {}", path.display(), e)))
}

impl DocumentFilter for EpubData {
    fn properties(&self) -> Vec<Property> {
        let metadata = self.epub.metadata();
        let mut properties = Vec::new();

        if let Some(title) = metadata.title() {
            properties.push(Property::new("Title", title.value().to_string()));
        }

        let authors: Vec<String> = metadata
            .creators()
            .map(|creator| creator.value().to_string())
            .collect();
        if !authors.is_empty() {
            properties.push(Property::new("Author", authors.join(", ")));
        }

        if let Some(publisher) = metadata.publishers().next() {
            properties.push(Property::new("Publisher", publisher.value().to_string()));
        }
        if let Some(language) = metadata.languages().next() {
            properties.push(Property::new("Language", language.value().to_string()));
        }
        if let Some(description) = metadata.descriptions().next() {
            properties.push(Property::new("Description", description.value().to_string()));
        }

        properties
    }

    fn text(&self, _scope: &FilterScope<'_>, out: &mut dyn TextSink) -> Result<()> {
        let mut first = true;
        self.for_each_chapter(|chapter| {
            if chapter.is_empty() {
                return Ok(());
            }
            if !first {
                out.emit("\n")?;
            }
            first = false;
            out.emit(&chapter)
        })
    }
}
