//! ORDER BY resolution.
//!
//! Three authoring forms land here: a literal ordered object
//! (`{"name": "ASC"}`), an array of field/direction items, and a
//! `{param:NAME,default:'...'}` template string whose value arrives in the
//! request parameters. Directions normalize to ASC/DESC; anything
//! unrecognized becomes ASC. A sort value that cannot be parsed logs a
//! warning and contributes no ORDER BY at all.

use crate::value::plain_text;
use crate::Params;
use indexmap::IndexMap;
use std::collections::HashMap;
use stencil_template::{SortItem, SortSpec};
use tracing::warn;

/// Resolve a sort spec into the ORDER BY list, if any.
pub(crate) fn order_by_clause(sort: &SortSpec, request: &Params) -> Option<String> {
    match sort {
        SortSpec::Fields(map) => {
            let items: Vec<String> = map
                .iter()
                .map(|(field, dir)| format!("{} {}", field, normalize_direction(dir)))
                .collect();
            non_blank(items.join(", "))
        }
        SortSpec::Items(items) => {
            let rendered: Vec<String> = items
                .iter()
                .map(|item| render_sort_item(item, request))
                .collect();
            non_blank(rendered.join(", "))
        }
        SortSpec::Template(text) => {
            if text.starts_with("{param:") {
                let resolved = extract_param_with_default(text, request);
                if resolved.trim().is_empty() {
                    return None;
                }
                parse_sort_object(&resolved)
            } else {
                parse_sort_object(text)
            }
        }
    }
}

fn render_sort_item(item: &SortItem, request: &Params) -> String {
    let direction = match &item.direction {
        Some(d) if d.starts_with("{param:") => resolve_direction_template(d, request),
        Some(d) => normalize_direction(d),
        None => "ASC".to_string(),
    };
    format!("{} {}", item.field, direction)
}

/// Parse a sort object like `{name:'ASC', id:'DESC'}` into an ORDER BY
/// list, preserving key order.
///
/// Tolerates single quotes and a clipped trailing brace, both common when
/// the object travels inside a parameter template.
fn parse_sort_object(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut cleaned = trimmed.to_string();
    if cleaned.starts_with('{') && !cleaned.ends_with('}') {
        cleaned.push('}');
    }
    cleaned = cleaned.replace('\'', "\"");

    match serde_json::from_str::<IndexMap<String, String>>(&cleaned) {
        Ok(map) => {
            let items: Vec<String> = map
                .iter()
                .map(|(field, dir)| format!("{} {}", field, normalize_direction(dir)))
                .collect();
            non_blank(items.join(", "))
        }
        Err(e) => {
            warn!("Failed to parse sort object '{}': {}", cleaned, e);
            None
        }
    }
}

/// Resolve a `{param:NAME,default:'...'}` template against the request.
///
/// Returns the parameter's value when present, the unquoted default when
/// not, and the template itself when the text is not actually a param
/// template. The closing brace may be clipped.
fn extract_param_with_default(template: &str, request: &Params) -> String {
    let content = template.strip_prefix('{').unwrap_or(template);
    let content = content.strip_suffix('}').unwrap_or(content);
    let (param_part, rest) = match content.split_once(',') {
        Some((head, tail)) => (head.trim(), Some(tail.trim())),
        None => (content.trim(), None),
    };

    let Some(name) = param_part.strip_prefix("param:") else {
        return template.to_string();
    };

    if let Some(value) = request.get(name.trim()) {
        return plain_text(value);
    }

    if let Some(rest) = rest {
        if let Some(default) = rest.strip_prefix("default:") {
            return strip_quotes(default.trim()).to_string();
        }
    }

    String::new()
}

/// Resolve a `{param:NAME,default:'ASC',values:{'req':'SQL',...}}`
/// direction template. The request value selects an entry from the
/// template's own values map (lookup is lowercased); no match means the
/// declared default.
fn resolve_direction_template(template: &str, request: &Params) -> String {
    let content = template.strip_prefix('{').unwrap_or(template);
    let content = content.strip_suffix('}').unwrap_or(content);

    let mut param = "sort".to_string();
    let mut default = "ASC".to_string();
    let mut values: HashMap<String, String> = HashMap::new();

    // Lift out the values block first; it contains its own commas
    let mut remainder = content.to_string();
    if let Some(start) = content.find("values:") {
        let after = &content[start..];
        if let (Some(open), Some(close)) = (after.find('{'), after.find('}')) {
            if open < close {
                for entry in after[open + 1..close].split(',') {
                    if let Some((k, v)) = entry.split_once(':') {
                        values.insert(
                            strip_quotes(k.trim()).to_string(),
                            strip_quotes(v.trim()).to_string(),
                        );
                    }
                }
                remainder = format!("{}{}", &content[..start], &after[close + 1..]);
            }
        }
    }

    for part in remainder.split(',') {
        let Some((key, val)) = part.split_once(':') else {
            continue;
        };
        match key.trim() {
            "param" => param = strip_quotes(val.trim()).to_string(),
            "default" => default = strip_quotes(val.trim()).to_string(),
            _ => {}
        }
    }

    if let Some(selected) = request.get(&param) {
        let key = plain_text(selected).to_lowercase();
        if let Some(direction) = values.get(&key) {
            return direction.clone();
        }
    }
    default
}

fn normalize_direction(direction: &str) -> String {
    let normalized = direction.trim().to_uppercase();
    if normalized == "ASC" || normalized == "DESC" {
        normalized
    } else {
        "ASC".to_string()
    }
}

fn strip_quotes(s: &str) -> &str {
    let stripped = s
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''));
    if let Some(inner) = stripped {
        return inner;
    }
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}

fn non_blank(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
