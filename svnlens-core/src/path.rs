//! Repository path helpers
//!
//! Paths are stored without leading or trailing slashes; the repository root
//! is the empty string.

/// Normalize a user-supplied path: strip slashes, drop empty and `.` segments
pub fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Parent directory of a normalized path (`""` for top-level entries and the root)
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Last segment of a normalized path
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Join a directory and a relative path
pub fn join(dir: &str, rest: &str) -> String {
    match (dir.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => dir.to_string(),
        _ => format!("{}/{}", dir, rest),
    }
}

/// True when `path` equals `ancestor` or lies below it
pub fn is_same_or_descendant(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() || path == ancestor {
        return true;
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// True when `ancestor` is a strict ancestor directory of `path`
pub fn is_strict_ancestor(ancestor: &str, path: &str) -> bool {
    ancestor != path && is_same_or_descendant(path, ancestor)
}

/// Path relative to `ancestor`; caller guarantees the relationship
pub fn strip_ancestor<'a>(path: &'a str, ancestor: &str) -> &'a str {
    if ancestor.is_empty() {
        path
    } else if path == ancestor {
        ""
    } else {
        &path[ancestor.len() + 1..]
    }
}

/// Every strict ancestor of a path, nearest first, ending with the root
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    let mut current = Some(path);
    std::iter::from_fn(move || {
        let p = current?;
        if p.is_empty() {
            current = None;
            return None;
        }
        let up = parent(p);
        current = Some(up);
        Some(up)
    })
}
