use crate::reader::Property;

/// Render document properties as `Name: value` lines followed by a blank line
pub fn format_properties(properties: &[Property]) -> String {
    let mut lines = Vec::new();

    for property in properties {
        let value = property.value.trim();
        if value.is_empty() {
            continue;
        }
        // Multi-line values (descriptions) stay on one output line
        let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
        lines.push(format!("{}: {}", property.name, value));
    }

    if lines.is_empty() {
        return String::new();
    }

    lines.push(String::new());
    lines.join("\n") + "\n"
}
