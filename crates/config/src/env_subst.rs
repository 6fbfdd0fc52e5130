/// Expand `${VAR}` and `${VAR:-fallback}` in raw config text.
///
/// Unset variables without a fallback are left untouched so the parse error
/// (or the literal value) points at the missing variable.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] with an injectable variable lookup.
pub(crate) fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated: copy the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };

        let body = &after[..end];
        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body, None),
        };

        match lookup(name).or_else(|| fallback.map(str::to_owned)) {
            Some(value) if !name.is_empty() => out.push_str(&value),
            _ => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
