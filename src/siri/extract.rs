//! Tag and block extraction over raw SIRI XML text.
//!
//! This is a linear scan, not a DOM parse: an element runs from its open tag
//! to the first close tag with the same local name, so same-named elements
//! must not nest inside one another. Stop-Monitoring deliveries satisfy that
//! today; if an upstream schema change breaks the assumption, swap a real
//! XML parser in behind [`extract_tag`] / [`extract_blocks`]; callers only
//! see extracted text either way.

/// One matched element, as byte offsets into the scanned document.
struct ElementMatch {
    content_start: usize,
    content_end: usize,
    resume_at: usize,
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':')
}

/// `true` when a qualified name (`tag` or `ns:tag`) has the wanted local
/// name, ignoring ASCII case.
fn local_name_matches(qname: &str, tag: &str) -> bool {
    let local = match qname.rsplit_once(':') {
        Some((_, local)) => local,
        None => qname,
    };
    local.eq_ignore_ascii_case(tag)
}

fn next_lt(bytes: &[u8], from: usize) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == b'<').map(|p| from + p)
}

/// Finds the first complete `<tag>...</tag>` element at or after `from`.
///
/// Namespace prefixes and attributes on the open tag are tolerated;
/// self-closing elements never match. Returns `None` when no complete
/// element remains.
fn find_element(xml: &str, tag: &str, from: usize) -> Option<ElementMatch> {
    let bytes = xml.as_bytes();
    let mut i = from;

    while let Some(lt) = next_lt(bytes, i) {
        let mut j = lt + 1;
        if j >= bytes.len() {
            return None;
        }
        // Closing tags, comments, processing instructions.
        if matches!(bytes[j], b'/' | b'!' | b'?') {
            i = j;
            continue;
        }

        let name_start = j;
        while j < bytes.len() && is_name_byte(bytes[j]) {
            j += 1;
        }
        if j == name_start || !local_name_matches(&xml[name_start..j], tag) {
            i = lt + 1;
            continue;
        }

        // Skip attributes up to the end of the open tag.
        let gt = match bytes[j..].iter().position(|&b| b == b'>') {
            Some(p) => j + p,
            None => return None,
        };
        if bytes[gt - 1] == b'/' {
            // Self-closing: no content to extract.
            i = gt + 1;
            continue;
        }

        let content_start = gt + 1;
        match find_close(xml, tag, content_start) {
            Some((content_end, resume_at)) => {
                return Some(ElementMatch {
                    content_start,
                    content_end,
                    resume_at,
                });
            }
            // No close tag with this name exists anywhere after the open
            // tag, so no later occurrence can complete either.
            None => return None,
        }
    }
    None
}

/// Finds the first `</tag>` (any namespace prefix) at or after `from`,
/// returning the offset where content ends and the offset just past the
/// close tag.
fn find_close(xml: &str, tag: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = xml.as_bytes();
    let mut i = from;

    while let Some(lt) = next_lt(bytes, i) {
        if lt + 1 >= bytes.len() {
            return None;
        }
        if bytes[lt + 1] != b'/' {
            i = lt + 1;
            continue;
        }

        let name_start = lt + 2;
        let mut j = name_start;
        while j < bytes.len() && is_name_byte(bytes[j]) {
            j += 1;
        }
        if j == name_start || !local_name_matches(&xml[name_start..j], tag) {
            i = lt + 2;
            continue;
        }

        let gt = match bytes[j..].iter().position(|&b| b == b'>') {
            Some(p) => j + p,
            None => return None,
        };
        return Some((lt, gt + 1));
    }
    None
}

/// Extracts the text of the first non-empty `<tag>` or `<ns:tag>` element,
/// trimmed. Absence is a valid outcome, not an error.
pub fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let mut from = 0;
    while let Some(m) = find_element(xml, tag, from) {
        let text = xml[m.content_start..m.content_end].trim();
        if !text.is_empty() {
            return Some(text.to_string());
        }
        from = m.resume_at;
    }
    None
}

/// Returns the inner content of every top-level `<tag>` element, verbatim,
/// preserving nested markup for per-field extraction.
pub fn extract_blocks(xml: &str, tag: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut from = 0;
    while let Some(m) = find_element(xml, tag, from) {
        blocks.push(xml[m.content_start..m.content_end].to_string());
        from = m.resume_at;
    }
    blocks
}
