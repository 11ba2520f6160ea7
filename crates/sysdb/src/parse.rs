//! Line scanning shared by the passwd and group parsers.

use std::io::{self, BufRead};

/// Strip a `#` comment and any following bytes.
fn remove_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Scan colon-delimited records, returning the first one `matcher` accepts.
///
/// Lines are trimmed, comments removed and blank lines skipped. A line with
/// fewer than `min_fields` fields is ignored. At most `max_fields` fields are
/// split out; the last one keeps any remaining colons.
pub(crate) fn scan<R, T, F>(
    reader: R,
    min_fields: usize,
    max_fields: usize,
    mut matcher: F,
) -> io::Result<Option<T>>
where
    R: BufRead,
    F: FnMut(&[&str]) -> Option<T>,
{
    for line in reader.split(b'\n') {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        let text = remove_comment(&line).trim();
        if text.is_empty() {
            continue;
        }

        let fields: Vec<&str> = text.splitn(max_fields, ':').collect();
        if fields.len() < min_fields {
            continue;
        }

        if let Some(found) = matcher(&fields) {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Collect every record `matcher` accepts.
pub(crate) fn scan_all<R, T, F>(
    reader: R,
    min_fields: usize,
    max_fields: usize,
    mut matcher: F,
) -> io::Result<Vec<T>>
where
    R: BufRead,
    F: FnMut(&[&str]) -> Option<T>,
{
    let mut found = Vec::new();
    // scan stops at the first Some, so keep returning None and collect on the side
    scan(reader, min_fields, max_fields, |fields| {
        if let Some(item) = matcher(fields) {
            found.push(item);
        }
        None::<()>
    })?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_remove_comment() {
        assert_eq!(remove_comment("root:x:0 # admin"), "root:x:0 ");
        assert_eq!(remove_comment("# whole line"), "");
        assert_eq!(remove_comment("plain"), "plain");
    }

    #[test]
    fn test_scan_skips_blank_comment_and_short_lines() {
        let data = "\n   \n# comment\nshort:x\n  wheel:*:0:root  # trailing\n";
        let found = scan(Cursor::new(data), 4, 4, |f| Some(f[0].to_string())).unwrap();
        assert_eq!(found.as_deref(), Some("wheel"));
    }

    #[test]
    fn test_scan_keeps_extra_colons_in_last_field() {
        let data = "a:b:c:d:e\n";
        let found = scan(Cursor::new(data), 3, 3, |f| Some(f[2].to_string())).unwrap();
        assert_eq!(found.as_deref(), Some("c:d:e"));
    }

    #[test]
    fn test_scan_all_collects_every_match() {
        let data = "a:1\nb:2\nc:1\n";
        let found = scan_all(Cursor::new(data), 2, 2, |f| {
            (f[1] == "1").then(|| f[0].to_string())
        })
        .unwrap();
        assert_eq!(found, vec!["a", "c"]);
    }
}
