//! Reversible path codec
//!
//! Maps a hierarchical relative path such as `srv/www` onto a single,
//! separator-free path segment (`srv@www`) usable both as a directory name
//! under the storage root and as an index key.
//!
//! `escape` strips leading and trailing `/`, then rewrites `%` to `%%`,
//! `@` to `%t` and `/` to `@`, in that order. `unescape` applies the inverse
//! substitutions in reverse order.

/// Encode a relative path as a flat identifier containing no `/`.
pub fn escape(path: &str) -> String {
    path.trim_matches('/')
        .replace('%', "%%")
        .replace('@', "%t")
        .replace('/', "@")
}

/// Decode an identifier produced by [`escape`].
///
/// A single left-to-right scan: `@` is a separator, `%%` a literal `%`,
/// `%t` a literal `@`. A plain chain of `str::replace` calls cannot be used
/// here because `%%t` must decode to `%t`, not `@`.
pub fn unescape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '@' => out.push('/'),
            '%' => match chars.peek() {
                Some('%') => {
                    chars.next();
                    out.push('%');
                }
                Some('t') => {
                    chars.next();
                    out.push('@');
                }
                _ => out.push('%'),
            },
            other => out.push(other),
        }
    }
    out
}
