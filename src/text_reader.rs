use crate::error::Result;
use crate::reader::{DocumentFilter, FilterScope, Property, Source, TextSink};

pub struct PlainTextData {
    text: String,
}

impl PlainTextData {
    pub fn open(source: &Source) -> Result<Self> {
        let bytes = source.bytes()?;
        let text = String::from_utf8_lossy(&bytes);
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(&text).to_string();
        Ok(Self { text })
    }
}

impl DocumentFilter for PlainTextData {
    fn properties(&self) -> Vec<Property> {
        Vec::new()
    }

    fn text(&self, _scope: &FilterScope<'_>, out: &mut dyn TextSink) -> Result<()> {
        out.emit(&self.text)
    }
}
