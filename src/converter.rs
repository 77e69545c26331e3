use crate::options::FilterOptions;
use crate::reader::{FilterReader, LineSource};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// Outcome of a multiple-file run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub failed: usize,
}

/// Extract `input` into `output`, or to stdout when no output is given
pub fn convert_single(input: &Path, output: Option<&Path>, options: &FilterOptions) -> Result<()> {
    let mut reader = open_reader(input, options)?;
    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(create_output(path)?),
        None => Box::new(io::stdout().lock()),
    };

    copy_lines(&mut reader, &mut out)
        .and_then(|_| out.flush().map_err(Into::into))
        .with_context(|| format!("Failed to extract text from {}", input.display()))?;

    Ok(())
}

/// Extract every input into `<input>.txt`, carrying on past failures
pub fn convert_many(inputs: &[PathBuf], options: &FilterOptions) -> Summary {
    let mut summary = Summary {
        total: inputs.len(),
        failed: 0,
    };

    for input in inputs {
        let output = sidecar_path(input);
        match convert_single(input, Some(&output), options) {
            Ok(()) => tracing::debug!("Wrote {}", output.display()),
            Err(e) => {
                summary.failed += 1;
                eprintln!("{:#}", e);
            }
        }
    }

    summary
}

/// `report.pdf` → `report.pdf.txt`, next to the input
pub fn sidecar_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".txt");
    PathBuf::from(name)
}

/// Copy every line of `reader` to `out`, in order. Returns the line count.
pub fn copy_lines<R, W>(reader: &mut R, out: &mut W) -> Result<usize>
where
    R: LineSource + ?Sized,
    W: Write + ?Sized,
{
    let mut count = 0;
    while let Some(line) = reader.read_line()? {
        out.write_all(line.as_bytes())?;
        out.write_all(LINE_ENDING.as_bytes())?;
        count += 1;
    }
    Ok(count)
}

fn open_reader(input: &Path, options: &FilterOptions) -> Result<FilterReader> {
    FilterReader::open(input, options)
        .with_context(|| format!("Failed to extract text from {}", input.display()))
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}
