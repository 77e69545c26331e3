//! Turning the input argument into the list of files to process.

use crate::cli::UsageError;
use glob::{MatchOptions, Pattern};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Single-file mode: the argument must name an existing file
pub fn existing_file(input: &str) -> Result<PathBuf, UsageError> {
    let path = PathBuf::from(input);
    if path.is_file() {
        Ok(path)
    } else {
        Err(UsageError::InputNotFound(input.to_string()))
    }
}

/// Multiple-file mode: match the file name pattern against the files of a
/// directory (the current one unless the pattern names one).
///
/// Only regular files directly inside the directory are considered; the
/// result is sorted and taken before anything is written.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, UsageError> {
    let invalid = |reason: String| UsageError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };

    let path = Path::new(pattern);
    let name_pattern = path
        .file_name()
        .ok_or_else(|| invalid("no file name to match".into()))?
        .to_string_lossy();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let matcher = Pattern::new(&name_pattern).map_err(|e| invalid(e.to_string()))?;
    matching_files(dir, &matcher).map_err(|e| invalid(format!("{}: {}", dir.display(), e)))
}

fn matching_files(dir: &Path, matcher: &Pattern) -> io::Result<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: !cfg!(windows),
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if matcher.matches_with(&name.to_string_lossy(), options) {
            files.push(dir.join(name));
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn pattern_matches_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), "").unwrap();
        fs::write(dir.path().join("a.pdf"), "").unwrap();
        fs::write(dir.path().join("c.txt"), "").unwrap();
        fs::create_dir(dir.path().join("d.pdf")).unwrap();

        let pattern = dir.path().join("*.pdf");
        let files = expand_pattern(pattern.to_str().unwrap()).unwrap();
        assert_eq!(names(&files), ["a.pdf", "b.pdf"]);
        assert!(files.iter().all(|f| f.starts_with(dir.path())));
    }

    #[test]
    fn no_match_is_empty_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = dir.path().join("*.docx");
        assert!(expand_pattern(pattern.to_str().unwrap()).unwrap().is_empty());
    }

    #[test]
    fn matching_does_not_recurse() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("deep.txt"), "").unwrap();
        fs::write(dir.path().join("top.txt"), "").unwrap();

        let pattern = dir.path().join("*.txt");
        let files = expand_pattern(pattern.to_str().unwrap()).unwrap();
        assert_eq!(names(&files), ["top.txt"]);
    }

    #[test]
    fn invalid_patterns_are_usage_errors() {
        let err = expand_pattern("a**b").unwrap_err();
        assert!(matches!(err, UsageError::InvalidPattern { .. }));
    }

    #[test]
    fn existing_file_requires_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("here.txt");
        fs::write(&file, "x").unwrap();

        assert_eq!(existing_file(file.to_str().unwrap()).unwrap(), file);
        assert_eq!(
            existing_file("missing.txt").unwrap_err(),
            UsageError::InputNotFound("missing.txt".into())
        );
        assert!(existing_file(dir.path().to_str().unwrap()).is_err());
    }
}
