//! JSON Pointer segment escaping (RFC 6901).

/// Splits a pointer into unescaped segments.
///
/// The empty pointer denotes the document root and yields no segments.
#[must_use]
pub fn split(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer.split('/').skip(1).map(unescape).collect()
}

/// Reverses pointer escaping: `~1` becomes `/`, then `~0` becomes `~`.
///
/// The order matters: unescaping `~0` first would turn `~01` into `/`
/// instead of `~1`.
#[must_use]
pub fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Escapes a raw key for embedding in a pointer: `~` becomes `~0`, then
/// `/` becomes `~1`.
#[must_use]
pub fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
