//! Streaming text reader over the format backends.
//!
//! [`FilterReader::open`] detects the document format, then runs the
//! matching backend on a worker thread. The backend streams its text one
//! unit at a time (page, chapter, body element, archive entry) and the
//! worker pushes finished lines through a bounded channel. The reader side
//! enforces the configured timeout while waiting; once it stops listening
//! the worker's next send fails and the backend unwinds.

use crate::archive_reader::ArchiveData;
use crate::cleanup;
use crate::detect::{self, Format};
use crate::docx_reader::DocxData;
use crate::epub_reader::EpubData;
use crate::error::{Error, Result};
use crate::html_reader::HtmlData;
use crate::metadata;
use crate::options::{FilterOptions, ReaderTimeout};
use crate::pdf_reader::PdfData;
use crate::text_reader::PlainTextData;
use std::any::Any;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Lines buffered between the worker and the reader
const LINE_BUFFER: usize = 256;

/// Archives inside archives are followed this deep
const MAX_EMBED_DEPTH: usize = 4;

/// Where a backend reads the document from
#[derive(Debug, Clone)]
pub enum Source {
    File(PathBuf),
    /// Fully loaded document; `name` is used for format detection and messages
    Memory { name: PathBuf, data: Vec<u8> },
}

impl Source {
    pub fn name(&self) -> &Path {
        match self {
            Source::File(path) => path,
            Source::Memory { name, .. } => name,
        }
    }

    /// Whole document contents
    pub fn bytes(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            Source::File(path) => Ok(Cow::Owned(fs::read(path)?)),
            Source::Memory { data, .. } => Ok(Cow::Borrowed(data)),
        }
    }
}

/// A document property such as the title or author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Receiver of extracted text. Every chunk holds whole lines.
pub trait TextSink {
    fn emit(&mut self, text: &str) -> Result<()>;
}

/// Collects chunks as newline-terminated text
impl TextSink for String {
    fn emit(&mut self, text: &str) -> Result<()> {
        self.push_str(text);
        if !text.is_empty() && !text.ends_with('\n') {
            self.push('\n');
        }
        Ok(())
    }
}

/// Trait for the document formats the engine can filter (PDF, DOCX, etc.)
pub trait DocumentFilter {
    /// Document metadata, in display order
    fn properties(&self) -> Vec<Property>;
    /// Stream the body text into `out`, one page, chapter or entry at a time;
    /// `scope` gives access to embedded documents
    fn text(&self, scope: &FilterScope<'_>, out: &mut dyn TextSink) -> Result<()>;
}

/// Context a backend extracts in
pub struct FilterScope<'a> {
    options: &'a FilterOptions,
    depth: usize,
}

impl<'a> FilterScope<'a> {
    pub fn new(options: &'a FilterOptions) -> Self {
        Self { options, depth: 0 }
    }

    pub fn options(&self) -> &FilterOptions {
        self.options
    }

    /// Open a document nested inside the current one.
    ///
    /// Returns `None` for content the engine cannot read (unsupported format,
    /// nesting too deep, embedded content disabled) so the parent document
    /// still yields its own text.
    pub fn embedded(&self, name: &str, data: Vec<u8>) -> Result<Option<Embedded<'a>>> {
        if self.options.disable_embedded_content() {
            return Ok(None);
        }
        if self.depth >= MAX_EMBED_DEPTH {
            tracing::debug!("Skipping {}: nested too deep", name);
            return Ok(None);
        }

        let source = Source::Memory {
            name: PathBuf::from(name),
            data,
        };
        let filter = match open_filter(source) {
            Ok(filter) => filter,
            Err(Error::UnsupportedFormat(reason)) => {
                tracing::debug!("Skipping embedded {}: {}", name, reason);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        Ok(Some(Embedded {
            filter,
            scope: FilterScope {
                options: self.options,
                depth: self.depth + 1,
            },
        }))
    }
}

/// An opened nested document
pub struct Embedded<'a> {
    filter: Box<dyn DocumentFilter>,
    scope: FilterScope<'a>,
}

impl Embedded<'_> {
    pub fn text(&self, out: &mut dyn TextSink) -> Result<()> {
        self.filter.text(&self.scope, out)
    }
}

/// Detect the format of `source` and open the matching backend
pub fn open_filter(source: Source) -> Result<Box<dyn DocumentFilter>> {
    let format = detect::detect(&source)?;
    tracing::debug!("{} detected as {}", source.name().display(), format);
    filter_for(format, source)
}

fn filter_for(format: Format, source: Source) -> Result<Box<dyn DocumentFilter>> {
    Ok(match format {
        Format::PlainText => Box::new(PlainTextData::open(&source)?),
        Format::Html => Box::new(HtmlData::open(&source)?),
        Format::Pdf => Box::new(PdfData::open(source)?),
        Format::Docx => Box::new(DocxData::open(source)?),
        Format::Epub => Box::new(EpubData::open(&source)?),
        Format::Archive => Box::new(ArchiveData::open(source)?),
    })
}

/// Anything that yields text one line at a time
pub trait LineSource {
    /// Next line without its terminator, `None` once the input is exhausted
    fn read_line(&mut self) -> Result<Option<String>>;
}

/// Producer half handed to the extraction worker
pub struct LineSink {
    tx: SyncSender<Result<String>>,
    options: FilterOptions,
}

impl TextSink for LineSink {
    /// Split `text` into lines, post-process and send each of them. Fails
    /// with `ReaderClosed` once the reader is gone, which stops the worker.
    fn emit(&mut self, text: &str) -> Result<()> {
        for line in split_lines(text) {
            let line = self.finish_line(line);
            self.tx.send(Ok(line)).map_err(|_| Error::ReaderClosed)?;
        }
        Ok(())
    }
}

impl LineSink {
    fn fail(&self, err: Error) {
        // Nobody is listening anymore if this fails
        let _ = self.tx.send(Err(err));
    }

    fn finish_line(&self, line: &str) -> String {
        let line = cleanup::replace_word_breaks(line, self.options.word_break_separator());
        if self.options.do_clean_up_characters() {
            cleanup::clean_up_characters(&line)
        } else {
            line.into_owned()
        }
    }
}

/// Streaming line reader over one document
pub struct FilterReader {
    lines: Option<Receiver<Result<String>>>,
    worker: Option<JoinHandle<()>>,
    mode: ReaderTimeout,
    timeout: Duration,
    deadline: Option<Instant>,
}

impl FilterReader {
    /// Open `path` with the given options.
    ///
    /// Returns once the backend has opened the document, so unreadable,
    /// unsupported or corrupt inputs fail before any output is created.
    /// Text extraction then continues on the worker.
    pub fn open(path: &Path, options: &FilterOptions) -> Result<Self> {
        tracing::debug!(
            mode = ?options.reader_timeout(),
            timeout_ms = ?options.timeout_millis(),
            "Opening {}",
            path.display()
        );
        let source = if options.read_into_memory() {
            let data = fs::read(path)?;
            tracing::debug!("Read {} bytes of {} into memory", data.len(), path.display());
            Source::Memory {
                name: path.to_path_buf(),
                data,
            }
        } else {
            Source::File(path.to_path_buf())
        };
        let format = detect::detect(&source)?;
        tracing::debug!("{} detected as {}", path.display(), format);

        let (opened_tx, opened) = mpsc::sync_channel(1);
        let mut reader = Self::spawn(options, move |sink, options| {
            let filter = match filter_for(format, source) {
                Ok(filter) => {
                    let _ = opened_tx.send(Ok(()));
                    filter
                }
                Err(e) => {
                    let _ = opened_tx.send(Err(e));
                    return Ok(());
                }
            };
            if options.include_properties() {
                let properties = filter.properties();
                if !properties.is_empty() {
                    sink.emit(&metadata::format_properties(&properties))?;
                }
            }
            filter.text(&FilterScope::new(options), sink)
        })?;

        reader.wait_until_opened(&opened)?;
        Ok(reader)
    }

    /// Run `produce` on a worker thread and read what it emits
    pub fn spawn<F>(options: &FilterOptions, produce: F) -> Result<Self>
    where
        F: FnOnce(&mut LineSink, &FilterOptions) -> Result<()> + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(LINE_BUFFER);
        let mut sink = LineSink {
            tx,
            options: options.clone(),
        };
        let worker_options = options.clone();
        let worker = thread::Builder::new()
            .name("filter-worker".into())
            .spawn(move || match produce(&mut sink, &worker_options) {
                Ok(()) | Err(Error::ReaderClosed) => {}
                Err(e) => sink.fail(e),
            })?;

        let timeout = options.timeout().unwrap_or_default();
        Ok(Self {
            lines: Some(rx),
            worker: Some(worker),
            mode: options.reader_timeout(),
            timeout,
            deadline: options.timeout().map(|t| Instant::now() + t),
        })
    }

    /// Block until the worker reports whether the backend could open the
    /// document. The deadline applies here as well.
    fn wait_until_opened(&mut self, opened: &Receiver<Result<()>>) -> Result<()> {
        let next = match self.deadline {
            None => opened.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(deadline) => opened.recv_timeout(deadline.saturating_duration_since(Instant::now())),
        };

        match next {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                self.close(true)?;
                Err(e)
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.close(true)?;
                Err(Error::Engine("worker ended before opening the document".into()))
            }
            Err(RecvTimeoutError::Timeout) => self.expire(),
        }
    }

    /// The deadline passed: detach the worker and apply the timeout mode
    fn expire(&mut self) -> Result<()> {
        self.close(false)?;
        tracing::debug!("Extraction timed out after {:?}", self.timeout);
        match self.mode {
            ReaderTimeout::TimeoutWithException => Err(Error::Timeout(self.timeout)),
            ReaderTimeout::TimeoutOnly | ReaderTimeout::None => Ok(()),
        }
    }

    /// Drop the channel and, unless it may still be busy, reap the worker
    fn close(&mut self, join: bool) -> Result<()> {
        self.lines = None;
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        if !join {
            // Detached: its next send fails and it returns
            return Ok(());
        }
        worker
            .join()
            .map_err(|payload| Error::Engine(panic_message(payload.as_ref())))
    }
}

impl LineSource for FilterReader {
    fn read_line(&mut self) -> Result<Option<String>> {
        let Some(lines) = &self.lines else {
            return Ok(None);
        };

        let next = match self.deadline {
            None => lines.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(deadline) => lines.recv_timeout(deadline.saturating_duration_since(Instant::now())),
        };

        match next {
            Ok(Ok(line)) => Ok(Some(line)),
            Ok(Err(e)) => {
                self.close(true)?;
                Err(e)
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.close(true)?;
                Ok(None)
            }
            Err(RecvTimeoutError::Timeout) => self.expire().map(|()| None),
        }
    }
}

impl Drop for FilterReader {
    fn drop(&mut self) {
        // Never block on a worker that may be stuck inside a parser
        let _ = self.close(false);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Split on `\n`, `\r\n` and lone `\r`; a trailing terminator adds no line
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = (!text.is_empty()).then(|| {
        text.strip_suffix("\r\n")
            .or_else(|| text.strip_suffix('\n'))
            .or_else(|| text.strip_suffix('\r'))
            .unwrap_or(text)
    });

    std::iter::from_fn(move || {
        let current = rest?;
        match current.find(['\r', '\n']) {
            Some(pos) => {
                let skip = if current[pos..].starts_with("\r\n") { 2 } else { 1 };
                rest = Some(&current[pos + skip..]);
                Some(&current[..pos])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}
