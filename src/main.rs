mod archive_reader;
mod cleanup;
mod cli;
mod converter;
mod detect;
mod docx_reader;
mod epub_reader;
mod error;
mod html_reader;
mod markdown;
mod metadata;
mod options;
mod pdf_reader;
mod reader;
mod resolve;
mod text_reader;

use cli::{Command, Invocation, UsageError};
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned());

    match cli::parse(args) {
        Ok(Command::Run(invocation)) => run(&invocation),
        Ok(Command::Help) => {
            print!("{}", cli::USAGE);
            ExitCode::SUCCESS
        }
        Err(e) => usage_failure(&e),
    }
}

fn run(invocation: &Invocation) -> ExitCode {
    if invocation.multiple_files {
        let inputs = match resolve::expand_pattern(&invocation.input) {
            Ok(inputs) => inputs,
            Err(e) => return usage_failure(&e),
        };
        if let Some(output) = &invocation.output {
            tracing::warn!("Ignoring -o {} with -M", output.display());
        }

        let summary = converter::convert_many(&inputs, &invocation.options);
        if summary.total > 0 {
            eprintln!(
                "Extracted {} of {} files",
                summary.total - summary.failed,
                summary.total
            );
        }
        // Per-file failures were reported above and do not change the exit code
        return ExitCode::SUCCESS;
    }

    let input = match resolve::existing_file(&invocation.input) {
        Ok(input) => input,
        Err(e) => return usage_failure(&e),
    };

    match converter::convert_single(&input, invocation.output.as_deref(), &invocation.options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn usage_failure(error: &UsageError) -> ExitCode {
    eprintln!("{}", error);
    eprint!("{}", cli::USAGE);
    ExitCode::FAILURE
}
