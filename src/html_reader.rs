use crate::error::Result;
use crate::markdown;
use crate::reader::{DocumentFilter, FilterScope, Property, Source, TextSink};

pub struct HtmlData {
    html: String,
}

impl HtmlData {
    pub fn open(source: &Source) -> Result<Self> {
        let bytes = source.bytes()?;
        Ok(Self {
            html: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

impl DocumentFilter for HtmlData {
    fn properties(&self) -> Vec<Property> {
        markdown::html_title(&self.html)
            .map(|title| vec![Property::new("Title", title)])
            .unwrap_or_default()
    }

    fn text(&self, _scope: &FilterScope<'_>, out: &mut dyn TextSink) -> Result<()> {
        out.emit(&markdown::html_to_text(&self.html))
    }
}
