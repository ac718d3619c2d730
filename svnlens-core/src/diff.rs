//! Unified diff formatting
//!
//! A pure function of two byte sequences: no engine access, no caching. The
//! query layer resolves both sides and their revision labels, then hands
//! them here.
//!
//! Output follows the svn/GNU unified convention:
//! ```text
//! Index: trunk/TODO
//! ===================================================================
//! --- trunk/TODO	(revision 0)
//! +++ trunk/TODO	(revision 6)
//! @@ -0,0 +1 @@
//! +Readme
//! ```

use similar::{Algorithm, ChangeTag, DiffOp, TextDiff};

use crate::object::Revnum;

const SEPARATOR: &str = "===================================================================";

const NO_NEWLINE: &str = "\\ No newline at end of file";

/// True when a NUL byte appears within the first `sniff_len` bytes, or the
/// content is not valid UTF-8
pub fn is_binary(data: &[u8], sniff_len: usize) -> bool {
    data[..data.len().min(sniff_len)].contains(&0) || std::str::from_utf8(data).is_err()
}

/// `Index:` / separator / `---` / `+++` lines shared by every diff
pub fn header(path: &str, old_rev: Revnum, new_rev: Revnum) -> String {
    format!(
        "Index: {path}\n{SEPARATOR}\n--- {path}\t(revision {old_rev})\n+++ {path}\t(revision {new_rev})\n"
    )
}

/// Range in GNU hunk-header form from a 0-based start and a line count
fn format_range(start: usize, count: usize) -> String {
    match count {
        0 => format!("{},0", start),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, count),
    }
}

fn hunk_header(group: &[DiffOp]) -> String {
    let Some(first) = group.first() else {
        return String::new();
    };
    let old_start = first.old_range().start;
    let new_start = first.new_range().start;
    // Myers may end a group with an insert anchored before the preceding equal
    let old_count: usize = group.iter().map(|op| op.old_range().len()).sum();
    let new_count: usize = group.iter().map(|op| op.new_range().len()).sum();
    format!(
        "@@ -{} +{} @@\n",
        format_range(old_start, old_count),
        format_range(new_start, new_count)
    )
}

/// Unified diff of `old` against `new`; empty when the contents are equal
///
/// Content that is not valid UTF-8 on either side cannot be shown line by
/// line without altering it, so it gets the header only.
pub fn unified_diff(
    path: &str,
    old_rev: Revnum,
    old: &[u8],
    new_rev: Revnum,
    new: &[u8],
    context: usize,
) -> String {
    if old == new {
        return String::new();
    }
    let (Ok(old), Ok(new)) = (std::str::from_utf8(old), std::str::from_utf8(new)) else {
        return header(path, old_rev, new_rev);
    };

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(old, new);

    let mut out = header(path, old_rev, new_rev);
    for group in diff.grouped_ops(context) {
        out.push_str(&hunk_header(&group));
        for op in &group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Equal => ' ',
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                };
                out.push(sign);
                out.push_str(change.value());
                if change.missing_newline() {
                    out.push('\n');
                    out.push_str(NO_NEWLINE);
                    out.push('\n');
                }
            }
        }
    }
    out
}
