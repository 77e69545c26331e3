/// Convert an HTML fragment to readable text lines.
///
/// html2md produces markdown; its inline markup is dropped again so only
/// the text remains.
pub fn html_to_text(html: &str) -> String {
    let md = html2md::parse_html(html);
    let plain = md
        .lines()
        .filter(|line| !line.trim_start().starts_with("```") && !is_heading_underline(line))
        .map(plain_line)
        .collect::<Vec<_>>()
        .join("\n");
    clean_text(&plain)
}

/// One markdown line without heading marks, emphasis, link targets, image
/// targets and backslash escapes
pub fn plain_line(line: &str) -> String {
    let chars: Vec<char> = strip_heading(line).chars().collect();
    let mut out = String::with_capacity(line.len());
    push_plain(&mut out, &chars);
    out
}

/// `=====` under a setext heading
fn is_heading_underline(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c == '=')
}

fn strip_heading(line: &str) -> &str {
    let rest = line.trim_start_matches('#');
    let level = line.len() - rest.len();
    if (1..=6).contains(&level) && (rest.is_empty() || rest.starts_with(' ')) {
        rest.trim_start()
    } else {
        line
    }
}

fn push_plain(out: &mut String, chars: &[char]) {
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c == '\\' && next.is_some_and(|n| n.is_ascii_punctuation()) {
            out.extend(next);
            i += 2;
            continue;
        }

        let link_start = match (c, next) {
            ('!', Some('[')) => Some(i + 1),
            ('[', _) => Some(i),
            _ => None,
        };
        if let Some((label, end)) = link_start.and_then(|start| link_at(chars, start)) {
            push_plain(out, label);
            i = end;
            continue;
        }

        if (c == '*' || c == '_') && is_emphasis(chars, i) {
            i += 1;
            continue;
        }

        out.push(c);
        i += 1;
    }
}

/// `[label](target)` starting at `start`: the label and the index after `)`
fn link_at(chars: &[char], start: usize) -> Option<(&[char], usize)> {
    let close = matching(chars, start, '[', ']')?;
    if chars.get(close + 1) != Some(&'(') {
        return None;
    }
    let end = matching(chars, close + 1, '(', ')')?;
    Some((&chars[start + 1..close], end + 1))
}

fn matching(chars: &[char], open_at: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, &c) in chars[open_at..].iter().enumerate() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(open_at + offset);
            }
        }
    }
    None
}

/// A `*` or `_` hugging text on one side and a boundary on the other
fn is_emphasis(chars: &[char], i: usize) -> bool {
    let boundary = |c: Option<char>| c.map_or(true, |c| c.is_whitespace() || c.is_ascii_punctuation());
    let prev = i.checked_sub(1).map(|p| chars[p]);
    let next = chars.get(i + 1).copied();

    let opens = next.is_some_and(|n| !n.is_whitespace()) && boundary(prev);
    let closes = prev.is_some_and(|p| !p.is_whitespace()) && boundary(next);
    opens || closes
}

/// Text between the first `<title>` and `</title>`, if any
pub fn html_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let open = lower.find("<title")?;
    let start = open + lower[open..].find('>')? + 1;
    let end = start + lower[start..].find("</title")?;
    let title = html[start..end].trim();
    (!title.is_empty()).then(|| title.to_string())
}

pub fn clean_text(text: &str) -> String {
    // Trim trailing whitespace per line
    let mut result = text
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");

    // Collapse 3+ consecutive blank lines to 2
    while result.contains("\n\n\n") {
        result = result.replace("\n\n\n", "\n\n");
    }

    let trimmed = result.trim_matches('\n');
    if trimmed.is_empty() {
        String::new()
    } else {
        trimmed.to_string() + "\n"
    }
}
