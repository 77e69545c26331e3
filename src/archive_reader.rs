use crate::error::Result;
use crate::reader::{DocumentFilter, FilterScope, Property, Source, TextSink};
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

/// A ZIP archive; each file entry is filtered as a document of its own
pub struct ArchiveData {
    source: Source,
}

impl ArchiveData {
    pub fn open(source: Source) -> Result<Self> {
        // Fail early on a corrupt central directory
        match &source {
            Source::File(path) => drop(ZipArchive::new(File::open(path)?)?),
            Source::Memory { data, .. } => drop(ZipArchive::new(Cursor::new(data.as_slice()))?),
        }
        Ok(Self { source })
    }
}

impl DocumentFilter for ArchiveData {
    fn properties(&self) -> Vec<Property> {
        Vec::new()
    }

    fn text(&self, scope: &FilterScope<'_>, out: &mut dyn TextSink) -> Result<()> {
        if scope.options().disable_embedded_content() {
            // Only the table of contents
            for name in entry_names(&self.source)? {
                out.emit(&name)?;
            }
            return Ok(());
        }

        for_each_entry(&self.source, |_| true, |name, data| {
            let Some(nested) = scope.embedded(&name, data)? else {
                return Ok(());
            };
            out.emit(&format!("[{}]", name))?;
            nested.text(out)
        })
    }
}

/// Names of the file entries, in archive order
pub fn entry_names(source: &Source) -> Result<Vec<String>> {
    match source {
        Source::File(path) => names_from(File::open(path)?),
        Source::Memory { data, .. } => names_from(Cursor::new(data.as_slice())),
    }
}

/// Hand the file entries whose name passes `wanted` to `visit`, one at a
/// time and in archive order
pub fn for_each_entry<W, V>(source: &Source, wanted: W, visit: V) -> Result<()>
where
    W: Fn(&str) -> bool,
    V: FnMut(String, Vec<u8>) -> Result<()>,
{
    match source {
        Source::File(path) => visit_entries(File::open(path)?, wanted, visit),
        Source::Memory { data, .. } => visit_entries(Cursor::new(data.as_slice()), wanted, visit),
    }
}

fn names_from<R: Read + Seek>(reader: R) -> Result<Vec<String>> {
    let mut archive = ZipArchive::new(reader)?;
    let mut names = Vec::new();

    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if entry.is_file() {
            names.push(entry.name().to_string());
        }
    }

    Ok(names)
}

fn visit_entries<R, W, V>(reader: R, wanted: W, mut visit: V) -> Result<()>
where
    R: Read + Seek,
    W: Fn(&str) -> bool,
    V: FnMut(String, Vec<u8>) -> Result<()>,
{
    let mut archive = ZipArchive::new(reader)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if !entry.is_file() || !wanted(entry.name()) {
            continue;
        }
        let name = entry.name().to_string();
        // The declared size comes from the archive and is not trusted
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        drop(entry);
        visit(name, data)?;
    }

    Ok(())
}
