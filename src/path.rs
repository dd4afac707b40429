//! Route pattern simplification.
//!
//! Turns a registered regular expression such as `^users/(?P<pk>[^/.]+)/$`
//! into a readable path `/users/<pk>/`.

use std::sync::OnceLock;

use regex::Regex;

/// Placeholder for capture groups without a name.
const UNNAMED_GROUP: &str = "<var>";

fn named_group_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(\?P<(\w+)>").expect("valid named group regex"))
}

/// Simplify a route regex into a path with `<name>` placeholders.
pub fn simplify_pattern(pattern: &str) -> String {
    let named = replace_named_groups(pattern);
    let unnamed = replace_unnamed_groups(&named);

    let mut path: String = unnamed
        .chars()
        .filter(|c| !matches!(c, '^' | '$' | '?' | '\\'))
        .collect();
    while path.contains("//") {
        path = path.replace("//", "/");
    }
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    path
}

/// Full path of a route, composed under its parent include when present.
pub fn compose_path(pattern: &str, parent: Option<&str>) -> String {
    match parent {
        Some(parent) => format!(
            "/{}{}",
            simplify_pattern(parent).trim_matches('/'),
            simplify_pattern(pattern)
        ),
        None => simplify_pattern(pattern),
    }
}

fn replace_named_groups(pattern: &str) -> String {
    let mut result = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(caps) = named_group_start().captures(rest) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        result.push_str(&rest[..whole.start()]);
        result.push('<');
        result.push_str(&caps[1]);
        result.push('>');

        let body = &rest[whole.end()..];
        let end = group_end(body).unwrap_or(body.len());
        rest = &body[end..];
    }
    result.push_str(rest);
    result
}

fn replace_unnamed_groups(pattern: &str) -> String {
    let mut result = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(start) = find_unescaped_open(rest) {
        result.push_str(&rest[..start]);
        let body = &rest[start + 1..];
        match group_end(body) {
            Some(end) => {
                result.push_str(UNNAMED_GROUP);
                rest = &body[end..];
            }
            None => {
                // unbalanced: keep the remainder verbatim
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

/// Byte offset just past the `)` closing a group whose `(` was already consumed.
fn group_end(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut escaped = false;
    for (idx, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn find_unescaped_open(pattern: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, c) in pattern.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' => return Some(idx),
            _ => {}
        }
    }
    None
}
