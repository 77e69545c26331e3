use std::time::Duration;

/// How the reader reacts when extraction outlives the configured timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReaderTimeout {
    #[default]
    None,
    /// Stop reading quietly and keep what was extracted so far
    TimeoutOnly,
    /// Stop reading and fail the extraction
    TimeoutWithException,
}

/// Extraction settings handed to every reader of a run.
///
/// Built once through [`FilterOptionsBuilder`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    disable_embedded_content: bool,
    include_properties: bool,
    read_into_memory: bool,
    reader_timeout: ReaderTimeout,
    timeout_millis: Option<u32>,
    do_clean_up_characters: bool,
    word_break_separator: Option<String>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            disable_embedded_content: false,
            include_properties: false,
            read_into_memory: false,
            reader_timeout: ReaderTimeout::None,
            timeout_millis: None,
            do_clean_up_characters: true,
            word_break_separator: None,
        }
    }
}

impl FilterOptions {
    pub fn builder() -> FilterOptionsBuilder {
        FilterOptionsBuilder::default()
    }

    /// Skip attachments and packages nested inside the document
    pub fn disable_embedded_content(&self) -> bool {
        self.disable_embedded_content
    }

    /// Emit document properties (title, author, ...) ahead of the body
    pub fn include_properties(&self) -> bool {
        self.include_properties
    }

    /// Load the whole file before handing it to the format backend
    pub fn read_into_memory(&self) -> bool {
        self.read_into_memory
    }

    pub fn reader_timeout(&self) -> ReaderTimeout {
        self.reader_timeout
    }

    pub fn timeout_millis(&self) -> Option<u32> {
        self.timeout_millis
    }

    /// Effective deadline length, `None` unless a timeout mode is active
    pub fn timeout(&self) -> Option<Duration> {
        match self.reader_timeout {
            ReaderTimeout::None => None,
            _ => self
                .timeout_millis
                .map(|ms| Duration::from_millis(u64::from(ms))),
        }
    }

    pub fn do_clean_up_characters(&self) -> bool {
        self.do_clean_up_characters
    }

    pub fn word_break_separator(&self) -> Option<&str> {
        self.word_break_separator.as_deref()
    }
}

/// Incremental builder for [`FilterOptions`]; every setter overwrites the
/// previous value.
#[derive(Debug, Clone, Default)]
pub struct FilterOptionsBuilder {
    options: FilterOptions,
}

impl FilterOptionsBuilder {
    pub fn disable_embedded_content(&mut self, value: bool) -> &mut Self {
        self.options.disable_embedded_content = value;
        self
    }

    pub fn include_properties(&mut self, value: bool) -> &mut Self {
        self.options.include_properties = value;
        self
    }

    pub fn read_into_memory(&mut self, value: bool) -> &mut Self {
        self.options.read_into_memory = value;
        self
    }

    pub fn do_clean_up_characters(&mut self, value: bool) -> &mut Self {
        self.options.do_clean_up_characters = value;
        self
    }

    /// Mode and duration always travel together
    pub fn timeout(&mut self, mode: ReaderTimeout, millis: u32) -> &mut Self {
        self.options.reader_timeout = mode;
        self.options.timeout_millis = match mode {
            ReaderTimeout::None => None,
            _ => Some(millis),
        };
        self
    }

    pub fn word_break_separator(&mut self, separator: impl Into<String>) -> &mut Self {
        self.options.word_break_separator = Some(separator.into());
        self
    }

    pub fn build(&self) -> FilterOptions {
        self.options.clone()
    }
}
