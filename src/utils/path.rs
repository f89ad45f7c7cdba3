use url::Url;

use crate::core::error::Error;

/// Appends a client-supplied path (optionally carrying its own query string)
/// to the upstream base. The result always stays under `base`.
pub(crate) fn upstream_url(base: &Url, path: &str) -> Result<Url, Error> {
    if path.is_empty() {
        return Ok(base.clone());
    }

    let invalid = |reason: &str| Error::InvalidPath(format!("{}: {}", reason, path));

    if path.starts_with('/') {
        return Err(invalid("must be relative"));
    }

    if path
        .chars()
        .any(|c| c.is_control() || c.is_whitespace() || c == '\\' || c == '#')
    {
        return Err(invalid("forbidden character"));
    }

    let resource = path.split_once('?').map_or(path, |(resource, _)| resource);

    let lowered = resource.to_ascii_lowercase();
    if lowered.contains("%2f") || lowered.contains("%5c") {
        return Err(invalid("encoded separator"));
    }

    let segments: Vec<&str> = resource.split('/').collect();

    if segments.first().is_some_and(|first| first.contains(':')) {
        return Err(invalid("must not carry a scheme"));
    }

    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() && i + 1 != segments.len() {
            return Err(invalid("empty segment"));
        }

        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        if decoded == "." || decoded == ".." {
            return Err(invalid("dot segment"));
        }
    }

    let url = base.join(path).map_err(|e| invalid(&e.to_string()))?;

    if url.origin() != base.origin() || !url.path().starts_with(base.path()) {
        return Err(invalid("escapes upstream base"));
    }

    Ok(url)
}

/// `join` drops the last segment of a base without a trailing slash.
pub(crate) fn normalize_base(base: &str) -> Result<Url, url::ParseError> {
    if base.ends_with('/') {
        Url::parse(base)
    } else {
        Url::parse(&format!("{}/", base))
    }
}
