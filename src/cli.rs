use crate::options::{FilterOptions, ReaderTimeout};
use std::path::PathBuf;
use thiserror::Error;

pub const USAGE: &str = "\
Usage: ifiltercmd <input file> [-o <output file> -M -c[+/-] -e[+/-] -p[+/-] -m[+/-] -te <timeout> -ti <timeout> -w <char> -?]

ifiltercmd extracts the plain text of a document (PDF, DOCX, EPUB, HTML, ZIP, text).
Options ('+' activates an option (default if missing), '-' deactivates it)
<input file>     : Source file to extract text from
-o <output file> : Destination for output. If not provided output is written to the console.
-M               : Multiple files. <input file> is a pattern matched in the current directory;
                   a .txt file is created next to each match (-o is ignored).
-e               : Don't read embedded content, e.g. the documents inside a ZIP archive (default false)
-p               : The metadata properties of a document are also returned (default false)

less important options:
-c               : Do cleanup characters (default true). Translates typographic characters to likely ASCII characters
-m               : Read input file completely into memory before extracting (default false)
-w <char>        : Text inserted where the document marks a word break (default: nothing)
-te <timeout>    : Timeout in milliseconds for large files, failing after the timeout elapsed
-ti <timeout>    : Timeout in milliseconds for large files, keeping the text read so far after the timeout elapsed
-?               : Show this help

Example: ifiltercmd report.pdf -o output.txt -c- -e- -m+ -ti 5000

Exit code is 0 for success (you have to still check for an empty output file) and 1 for errors
";

/// What the command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(Invocation),
    Help,
}

/// A fully parsed run, read-only once parsing is over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Literal path, or a file name pattern with `-M`
    pub input: String,
    /// `None` writes to the console
    pub output: Option<PathBuf>,
    pub multiple_files: bool,
    pub options: FilterOptions,
}

/// Malformed command lines; each one is reported together with [`USAGE`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("Option missing after - or /")]
    MissingOption,

    #[error("Expecting another argument after option {0}")]
    MissingArgument(String),

    #[error("Invalid timeout value {0}")]
    InvalidTimeout(String),

    #[error("Unknown option {0}")]
    UnknownOption(String),

    #[error("Only one input file allowed! Found more than one. First one: {first}, next: {next}")]
    MultipleInputs { first: String, next: String },

    #[error("No input file provided")]
    NoInput,

    #[error("The input file '{0}' does not exist")]
    InputNotFound(String),

    #[error("Invalid file pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Parse the command line tokens (program name excluded).
///
/// Tokens starting with `-` or `/` are options, anything else is the input.
/// Parsing stops at the first problem or at `-?`.
pub fn parse<I, S>(args: I) -> Result<Command, UsageError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut tokens = args.into_iter().map(Into::into);
    let mut input: Option<String> = None;
    let mut output = None;
    let mut multiple_files = false;
    let mut options = FilterOptions::builder();

    while let Some(arg) = tokens.next() {
        let Some(name) = arg.strip_prefix('-').or_else(|| arg.strip_prefix('/')) else {
            if let Some(first) = input.as_ref().filter(|first| !first.is_empty()) {
                return Err(UsageError::MultipleInputs {
                    first: first.clone(),
                    next: arg,
                });
            }
            input = Some(arg);
            continue;
        };

        match name {
            "" => return Err(UsageError::MissingOption),
            "M" => multiple_files = true,
            "c" | "c+" => {
                options.do_clean_up_characters(true);
            }
            "c-" => {
                options.do_clean_up_characters(false);
            }
            "e" | "e+" => {
                options.disable_embedded_content(true);
            }
            "e-" => {
                options.disable_embedded_content(false);
            }
            "p" | "p+" => {
                options.include_properties(true);
            }
            "p-" => {
                options.include_properties(false);
            }
            "m" | "m+" => {
                options.read_into_memory(true);
            }
            "m-" => {
                options.read_into_memory(false);
            }
            "te" | "ti" => {
                let value = next_argument(&mut tokens, &arg)?;
                let millis = parse_timeout(&value)?;
                let mode = if name == "ti" {
                    ReaderTimeout::TimeoutOnly
                } else {
                    ReaderTimeout::TimeoutWithException
                };
                options.timeout(mode, millis);
            }
            "o" => output = Some(PathBuf::from(next_argument(&mut tokens, &arg)?)),
            "w" => {
                options.word_break_separator(next_argument(&mut tokens, &arg)?);
            }
            "?" => return Ok(Command::Help),
            _ => return Err(UsageError::UnknownOption(arg)),
        }
    }

    match input.filter(|input| !input.is_empty()) {
        Some(input) => Ok(Command::Run(Invocation {
            input,
            output,
            multiple_files,
            options: options.build(),
        })),
        None => Err(UsageError::NoInput),
    }
}

fn next_argument(
    tokens: &mut impl Iterator<Item = String>,
    option: &str,
) -> Result<String, UsageError> {
    tokens
        .next()
        .ok_or_else(|| UsageError::MissingArgument(option.to_string()))
}

/// Whitespace around the number is tolerated, negative values are not
fn parse_timeout(value: &str) -> Result<u32, UsageError> {
    value
        .trim()
        .parse()
        .map_err(|_| UsageError::InvalidTimeout(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Invocation {
        match parse(args.iter().copied()) {
            Ok(Command::Run(invocation)) => invocation,
            other => panic!("expected a run for {args:?}, got {other:?}"),
        }
    }

    fn error(args: &[&str]) -> UsageError {
        parse(args.iter().copied()).expect_err("expected a usage error")
    }

    #[test]
    fn single_input_uses_defaults() {
        let invocation = run(&["report.pdf"]);
        assert_eq!(invocation.input, "report.pdf");
        assert_eq!(invocation.output, None);
        assert!(!invocation.multiple_files);
        assert_eq!(invocation.options, FilterOptions::default());
    }

    #[test]
    fn boolean_flags_follow_plus_and_minus() {
        let invocation = run(&["doc", "-e", "-p+", "-m", "-c-"]);
        assert!(invocation.options.disable_embedded_content());
        assert!(invocation.options.include_properties());
        assert!(invocation.options.read_into_memory());
        assert!(!invocation.options.do_clean_up_characters());

        let invocation = run(&["doc", "-e+", "-p", "-m+", "-c-", "-c"]);
        assert!(invocation.options.disable_embedded_content());
        assert!(invocation.options.include_properties());
        assert!(invocation.options.read_into_memory());
        assert!(invocation.options.do_clean_up_characters());
    }

    #[test]
    fn last_occurrence_wins() {
        let invocation = run(&["-e", "-p", "-m", "doc", "-e-", "-p-", "-m-", "-c-", "-c+"]);
        assert!(!invocation.options.disable_embedded_content());
        assert!(!invocation.options.include_properties());
        assert!(!invocation.options.read_into_memory());
        assert!(invocation.options.do_clean_up_characters());

        let invocation = run(&["doc", "-o", "a.txt", "-o", "b.txt"]);
        assert_eq!(invocation.output, Some(PathBuf::from("b.txt")));
    }

    #[test]
    fn slash_prefix_is_an_option_too() {
        let invocation = run(&["/M", "*.pdf", "/p", "/o", "out.txt"]);
        assert!(invocation.multiple_files);
        assert!(invocation.options.include_properties());
        assert_eq!(invocation.output, Some(PathBuf::from("out.txt")));
    }

    #[test]
    fn timeout_options_set_mode_and_value() {
        let invocation = run(&["doc", "-te", "5000"]);
        assert_eq!(
            invocation.options.reader_timeout(),
            ReaderTimeout::TimeoutWithException
        );
        assert_eq!(invocation.options.timeout_millis(), Some(5000));

        let invocation = run(&["doc", "-ti", "5000"]);
        assert_eq!(invocation.options.reader_timeout(), ReaderTimeout::TimeoutOnly);
        assert_eq!(invocation.options.timeout_millis(), Some(5000));

        let invocation = run(&["doc", "-te", "10", "-ti", "20"]);
        assert_eq!(invocation.options.reader_timeout(), ReaderTimeout::TimeoutOnly);
        assert_eq!(invocation.options.timeout_millis(), Some(20));
    }

    #[test]
    fn invalid_timeouts_are_rejected() {
        assert_eq!(
            error(&["doc", "-te", "abc"]),
            UsageError::InvalidTimeout("abc".into())
        );
        assert_eq!(
            error(&["doc", "-ti", "-5"]),
            UsageError::InvalidTimeout("-5".into())
        );
    }

    #[test]
    fn word_break_separator_is_stored() {
        let invocation = run(&["doc", "-w", "|"]);
        assert_eq!(invocation.options.word_break_separator(), Some("|"));
    }

    #[test]
    fn full_example_configures_every_option() {
        let invocation = run(&[
            "report.pdf", "-o", "out.txt", "-c-", "-e-", "-m+", "-ti", "5000",
        ]);
        assert_eq!(invocation.input, "report.pdf");
        assert_eq!(invocation.output, Some(PathBuf::from("out.txt")));
        let options = &invocation.options;
        assert!(!options.do_clean_up_characters());
        assert!(!options.disable_embedded_content());
        assert!(options.read_into_memory());
        assert_eq!(options.reader_timeout(), ReaderTimeout::TimeoutOnly);
        assert_eq!(options.timeout_millis(), Some(5000));
    }

    #[test]
    fn usage_errors() {
        assert_eq!(error(&["-"]), UsageError::MissingOption);
        assert_eq!(error(&["doc", "/"]), UsageError::MissingOption);
        assert_eq!(
            error(&["doc", "-o"]),
            UsageError::MissingArgument("-o".into())
        );
        assert_eq!(
            error(&["doc", "-te"]),
            UsageError::MissingArgument("-te".into())
        );
        assert_eq!(
            error(&["doc", "/w"]),
            UsageError::MissingArgument("/w".into())
        );
        assert_eq!(error(&["doc", "-x"]), UsageError::UnknownOption("-x".into()));
        assert_eq!(
            error(&["doc", "-c++"]),
            UsageError::UnknownOption("-c++".into())
        );
        assert_eq!(
            error(&["a.txt", "b.txt"]),
            UsageError::MultipleInputs {
                first: "a.txt".into(),
                next: "b.txt".into()
            }
        );
        assert_eq!(error(&[]), UsageError::NoInput);
        assert_eq!(error(&["-p", "-M"]), UsageError::NoInput);
    }

    #[test]
    fn first_error_stops_parsing() {
        assert_eq!(error(&["-q", "a", "b"]), UsageError::UnknownOption("-q".into()));
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(parse(["-?"]), Ok(Command::Help));
        assert_eq!(parse(["a", "b", "-?"]).ok(), None);
        assert_eq!(parse(["a", "-?", "b"]), Ok(Command::Help));
    }

    #[test]
    fn messages_name_the_offending_values() {
        assert_eq!(
            error(&["a.txt", "b.txt"]).to_string(),
            "Only one input file allowed! Found more than one. First one: a.txt, next: b.txt"
        );
        assert_eq!(
            error(&["doc", "-o"]).to_string(),
            "Expecting another argument after option -o"
        );
        assert_eq!(
            error(&["doc", "-te", "x"]).to_string(),
            "Invalid timeout value x"
        );
    }
}
