//! Per-line character post-processing.
//!
//! Two independent steps run on every extracted line:
//! 1. word-break markers are replaced with the configured separator
//! 2. with character cleanup on, typographic characters are translated to
//!    their likely ASCII counterparts

use std::borrow::Cow;
use unicode_normalization::UnicodeNormalization;

/// Characters documents use to mark a break opportunity inside a word
const WORD_BREAK_MARKERS: [char; 2] = [
    '\u{00AD}', // Soft hyphen
    '\u{200B}', // Zero width space
];

/// Typographic characters NFKC leaves alone
const ASCII_MAPPINGS: &[(char, &str)] = &[
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201A}', "'"),
    ('\u{201B}', "'"),
    ('\u{2032}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{201E}', "\""),
    ('\u{201F}', "\""),
    ('\u{2033}', "\""),
    ('\u{00AB}', "\""),
    ('\u{00BB}', "\""),
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
    ('\u{2012}', "-"),
    ('\u{2013}', "-"),
    ('\u{2014}', "-"),
    ('\u{2015}', "-"),
    ('\u{2212}', "-"),
    ('\u{2022}', "-"),
    ('\u{2023}', "-"),
    ('\u{25CF}', "-"),
    ('\u{25AA}', "-"),
    ('\u{25E6}', "-"),
    ('\u{2043}', "-"),
    ('\u{00B7}', "-"),
];

/// Replace word-break markers with `separator`, or drop them when unset
pub fn replace_word_breaks<'a>(line: &'a str, separator: Option<&str>) -> Cow<'a, str> {
    if !line.contains(WORD_BREAK_MARKERS) {
        return Cow::Borrowed(line);
    }
    Cow::Owned(line.replace(WORD_BREAK_MARKERS, separator.unwrap_or("")))
}

/// Translate characters to likely ASCII characters.
///
/// - Unicode NFKC normalization (ligatures, fullwidth forms, `…`, odd spaces)
/// - quotes, dashes and bullets mapped to ASCII
/// - remaining unicode spaces become a plain space
/// - control characters other than tab removed
pub fn clean_up_characters(line: &str) -> String {
    let mut result = String::with_capacity(line.len());

    for c in line.nfkc() {
        if is_control_char(c) {
            continue;
        }

        if let Some(replacement) = ascii_replacement(c) {
            result.push_str(replacement);
            continue;
        }

        if c != ' ' && c.is_whitespace() && c != '\t' {
            result.push(' ');
            continue;
        }

        result.push(c);
    }

    result
}

fn ascii_replacement(c: char) -> Option<&'static str> {
    ASCII_MAPPINGS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
}

fn is_control_char(c: char) -> bool {
    (c.is_control() && c != '\t')
        || matches!(
            c,
            '\u{FEFF}' // BOM
            | '\u{FFFD}' // Replacement character
            | '\u{200E}' // Left-to-right mark
            | '\u{200F}' // Right-to-left mark
            | '\u{2060}' // Word joiner, forbids a break
        )
        || WORD_BREAK_MARKERS.contains(&c)
}
