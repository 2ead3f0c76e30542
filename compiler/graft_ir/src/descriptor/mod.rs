//! Type descriptor helpers.
//!
//! Descriptors use the class file grammar: `I`, `J`, `Lpkg/Name;`, `[I`,
//! and `(params)ret` for methods.

/// Whether `desc` is a method descriptor.
#[inline]
pub fn is_method(desc: &str) -> bool {
    desc.starts_with('(')
}

/// Split a method descriptor into its parameter descriptors and return descriptor.
///
/// Returns `None` if `desc` is not a well-formed method descriptor.
pub fn split_method(desc: &str) -> Option<(Vec<&str>, &str)> {
    let rest = desc.strip_prefix('(')?;
    let close = rest.find(')')?;
    let (params_src, ret) = (&rest[..close], &rest[close + 1..]);

    let mut params = Vec::new();
    let mut cursor = params_src;
    while !cursor.is_empty() {
        let len = field_len(cursor)?;
        params.push(&cursor[..len]);
        cursor = &cursor[len..];
    }

    if ret != "V" && field_len(ret)? != ret.len() {
        return None;
    }
    Some((params, ret))
}

/// Length in bytes of the single field descriptor at the start of `src`.
fn field_len(src: &str) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut dims = 0;
    while bytes.get(dims) == Some(&b'[') {
        dims += 1;
    }
    match bytes.get(dims)? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => Some(dims + 1),
        b'L' => src[dims..].find(';').map(|end| dims + end + 1),
        _ => None,
    }
}

/// Number of local variable slots a value of this descriptor occupies.
pub fn slot_size(desc: &str) -> u16 {
    if desc == "J" || desc == "D" {
        2
    } else {
        1
    }
}

/// Build a method descriptor from parameter and return descriptors.
pub fn method(params: &[&str], ret: &str) -> String {
    let mut out = String::with_capacity(2 + ret.len() + params.iter().map(|p| p.len()).sum::<usize>());
    out.push('(');
    for param in params {
        out.push_str(param);
    }
    out.push(')');
    out.push_str(ret);
    out
}
