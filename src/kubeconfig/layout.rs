//! Layout-preserving rewrites of kubeconfig text.
//!
//! Serializing a tree with `serde_yaml` drops comments, quoting and flow style. To keep a
//! file recognizable after a token refresh, [`splice`] edits the text it was loaded from
//! instead: block mappings and block sequences are walked line by line alongside the
//! trees before and after the change. Unchanged entries are copied verbatim; changed
//! entries are descended into when they are blocks themselves, and re-rendered at their
//! original indentation otherwise. New keys and list items are rendered in place after
//! the last entry of their block.
//!
//! ```text
//! users:                      users:
//! - name: me   # laptop       - name: me   # laptop
//!   user:                       user:
//!     token: old        ->        token: sha256~new
//! clusters: [...]  # ops      clusters: [...]  # ops
//! ```
//!
//! Text the walker does not follow (document markers, tab indentation, keys that do not
//! line up with the parsed tree) makes the affected entry, or the whole document, fall
//! back to plain re-rendering.

use serde_yaml::{Mapping, Value};

type Lines = Vec<String>;

/// Rewrite `source`, which parsed to `before`, so that it parses to `after`.
///
/// Returns `None` when the text cannot be edited in place.
pub(crate) fn splice(source: &str, before: &Value, after: &Value) -> Option<String> {
    if before == after {
        return Some(source.to_string());
    }

    let lines: Lines = source.lines().map(str::to_string).collect();
    if lines.iter().any(|line| is_unsupported(line)) {
        return None;
    }

    let edited = if lines.iter().all(|line| is_trivia(line)) {
        let mut edited = lines;
        edited.extend(render(after)?);
        edited
    } else {
        edit_node(&lines, before, after)?
    };

    let newline = if source.contains("\r\n") { "\r\n" } else { "\n" };
    let mut text = edited.join(newline);
    text.push_str(newline);
    Some(text)
}

fn edit_node(lines: &[String], before: &Value, after: &Value) -> Option<Lines> {
    if before == after {
        return Some(lines.to_vec());
    }

    let first = lines.iter().find(|line| !is_trivia(line))?;
    let indent = indent_of(first);
    let content = &first[indent..];

    match (before, after) {
        (Value::Sequence(before), Value::Sequence(after)) if is_item(content) => {
            edit_sequence(lines, indent, before, after)
        }
        (Value::Mapping(before), Value::Mapping(after)) if split_key(content).is_some() => {
            edit_mapping(lines, indent, before, after)
        }
        _ => None,
    }
}

fn edit_mapping(lines: &[String], indent: usize, before: &Mapping, after: &Mapping) -> Option<Lines> {
    // A compact sequence (`key:` followed by `- item` at the same column) belongs to its key
    let (prefix, entries) = split_entries(lines, indent, |content| split_key(content).is_some(), is_item)?;

    let mut keys: Vec<Value> = Vec::with_capacity(entries.len());
    for entry in &entries {
        let (_, key, _) = split_key(&entry[0][indent..])?;
        let key = Value::String(key);
        if !before.contains_key(&key) || keys.contains(&key) {
            return None;
        }
        keys.push(key);
    }
    if keys.len() != before.len() {
        return None;
    }

    let mut out = prefix.to_vec();
    for (entry, key) in entries.iter().zip(&keys) {
        let (Some(old), Some(new)) = (before.get(key), after.get(key)) else {
            continue;
        };
        if old == new {
            out.extend(entry.iter().cloned());
        } else {
            out.extend(edit_entry(entry, indent, old, new)?);
        }
    }

    let added: Mapping = after
        .iter()
        .filter(|(key, _)| !before.contains_key(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if !added.is_empty() {
        let rendered = render(&Value::Mapping(added))?;
        insert_before_trailing_trivia(
            &mut out,
            prefix.len(),
            rendered.iter().map(|line| indented(indent, line)),
        );
    }
    Some(out)
}

fn edit_entry(entry: &[String], indent: usize, before: &Value, after: &Value) -> Option<Lines> {
    let head = &entry[0];
    let (key_text, _, rest) = split_key(&head[indent..])?;
    let (value, comment) = split_comment(rest);
    let children = &entry[1..];

    if value.trim().is_empty() && children.iter().any(|line| !is_trivia(line)) {
        if let Some(body) = edit_node(children, before, after) {
            let mut out = vec![head.clone()];
            out.extend(body);
            return Some(out);
        }
    }

    let mut out = render_entry(indent, key_text, after, comment)?;
    out.extend(trailing_trivia(entry).iter().cloned());
    Some(out)
}

fn edit_sequence(lines: &[String], indent: usize, before: &[Value], after: &[Value]) -> Option<Lines> {
    let (prefix, items) = split_entries(lines, indent, is_item, |_| false)?;
    if items.len() != before.len() {
        return None;
    }

    let mut out = prefix.to_vec();
    for ((item, old), new) in items.iter().zip(before).zip(after) {
        if old == new {
            out.extend(item.iter().cloned());
        } else {
            out.extend(edit_item(item, indent, old, new)?);
        }
    }

    if after.len() > before.len() {
        let rendered = render(&Value::Sequence(after[before.len()..].to_vec()))?;
        insert_before_trailing_trivia(
            &mut out,
            prefix.len(),
            rendered.iter().map(|line| indented(indent, line)),
        );
    }
    Some(out)
}

fn edit_item(item: &[String], indent: usize, before: &Value, after: &Value) -> Option<Lines> {
    let head = &item[0];
    let (value, _) = split_comment(&head[indent + 1..]);

    let edited = if value.trim().is_empty() {
        // Bare `-`: the node starts on the next line
        edit_node(&item[1..], before, after).map(|body| {
            let mut out = vec![head.clone()];
            out.extend(body);
            out
        })
    } else {
        // `- key: value` is a mapping indented past the dash; blank the dash, edit, put it back
        let mut shifted = item.to_vec();
        shifted[0].replace_range(indent..=indent, " ");
        edit_node(&shifted, before, after).and_then(|mut body| {
            let first = body.iter_mut().find(|line| !is_trivia(line))?;
            if indent_of(first) <= indent {
                return None;
            }
            first.replace_range(indent..=indent, "-");
            Some(body)
        })
    };

    edited.or_else(|| {
        let mut out: Lines = render(&Value::Sequence(vec![after.clone()]))?
            .iter()
            .map(|line| indented(indent, line))
            .collect();
        out.extend(trailing_trivia(item).iter().cloned());
        Some(out)
    })
}

/// `key: value` lines at `indent`, keeping `comment` when the value fits on the key line.
fn render_entry(indent: usize, key: &str, value: &Value, comment: &str) -> Option<Lines> {
    let rendered = render(value)?;
    let pad = " ".repeat(indent);

    let inline = match value {
        Value::Mapping(mapping) => mapping.is_empty(),
        Value::Sequence(sequence) => sequence.is_empty(),
        _ => true,
    };

    if inline {
        let (first, rest) = rendered.split_first()?;
        let comment = if rest.is_empty() { comment } else { "" };
        let mut out = vec![format!("{pad}{key}: {first}{comment}")];
        out.extend(rest.iter().map(|line| indented(indent, line)));
        return Some(out);
    }

    let child_indent = if value.is_sequence() { indent } else { indent + 2 };
    let mut out = vec![format!("{pad}{key}:{comment}")];
    out.extend(rendered.iter().map(|line| indented(child_indent, line)));
    Some(out)
}

fn render(value: &Value) -> Option<Lines> {
    let text = serde_yaml::to_string(value).ok()?;
    Some(text.lines().map(str::to_string).collect())
}

/// Split a block into its leading trivia and its entries.
///
/// Entries start at lines of exactly `indent` accepted by `starts_entry`. Other lines at
/// that column must be accepted by `continues_entry`; deeper lines and trivia belong to
/// the entry above them.
fn split_entries<'a>(
    lines: &'a [String],
    indent: usize,
    starts_entry: impl Fn(&str) -> bool,
    continues_entry: impl Fn(&str) -> bool,
) -> Option<(&'a [String], Vec<&'a [String]>)> {
    let mut starts = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        if is_trivia(line) {
            continue;
        }
        let line_indent = indent_of(line);
        if line_indent < indent || (line_indent > indent && starts.is_empty()) {
            return None;
        }
        if line_indent > indent {
            continue;
        }
        let content = &line[indent..];
        if starts_entry(content) {
            starts.push(index);
        } else if starts.is_empty() || !continues_entry(content) {
            return None;
        }
    }

    let first = *starts.first()?;
    let ends = starts.iter().skip(1).copied().chain(std::iter::once(lines.len()));
    let entries = starts.iter().zip(ends).map(|(&start, end)| &lines[start..end]).collect();
    Some((&lines[..first], entries))
}

/// `(key text as written, key, rest after the colon)` for a `key: ...` line.
fn split_key(content: &str) -> Option<(&str, String, &str)> {
    let (key, end) = match content.chars().next()? {
        quote @ ('"' | '\'') => {
            let close = content[1..].find(quote)? + 1;
            let inner = &content[1..close];
            if inner.contains('\\') {
                return None;
            }
            (inner.to_string(), close + 1)
        }
        '-' | '#' | '[' | ']' | '{' | '}' | ',' | '?' | ':' | '&' | '*' | '!' | '|' | '>' | '%'
        | '@' | '`' => return None,
        _ => {
            let colon = content
                .match_indices(':')
                .map(|(index, _)| index)
                .find(|&index| matches!(content.as_bytes().get(index + 1), None | Some(b' ')))?;
            let key = content[..colon].trim_end();
            if key.contains(" #") {
                return None;
            }
            (key.to_string(), colon)
        }
    };

    let rest = content[end..].strip_prefix(':')?;
    if !(rest.is_empty() || rest.starts_with(' ')) {
        return None;
    }
    Some((&content[..end], key, rest))
}

/// Split `text` at the start of a trailing `# comment`, keeping the blanks before it with
/// the comment.
fn split_comment(text: &str) -> (&str, &str) {
    let mut quote = None;
    let mut after_blank = true;
    for (index, c) in text.char_indices() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => {}
            None if c == '#' && after_blank => {
                let value = text[..index].trim_end();
                return (value, &text[value.len()..]);
            }
            None if (c == '"' || c == '\'') && after_blank => quote = Some(c),
            None => {}
        }
        after_blank = c == ' ';
    }
    (text, "")
}

fn insert_before_trailing_trivia(out: &mut Lines, floor: usize, lines: impl Iterator<Item = String>) {
    let mut at = out.len();
    while at > floor && is_trivia(&out[at - 1]) {
        at -= 1;
    }
    let tail = out.split_off(at);
    out.extend(lines);
    out.extend(tail);
}

fn trailing_trivia(entry: &[String]) -> &[String] {
    let start = entry.iter().rposition(|line| !is_trivia(line)).map_or(entry.len(), |index| index + 1);
    &entry[start..]
}

fn indented(indent: usize, line: &str) -> String {
    if line.is_empty() {
        String::new()
    } else {
        format!("{}{line}", " ".repeat(indent))
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ")
}

fn is_trivia(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn is_unsupported(line: &str) -> bool {
    line.starts_with("---")
        || line.starts_with("...")
        || line.starts_with('%')
        || line.chars().take_while(|c| c.is_whitespace()).any(|c| c == '\t')
}
