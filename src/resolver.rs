use crate::results::NOT_FOUND;
use url::Url;

/// Resolves a resource reference found on a page to an absolute URL.
///
/// Candidates already carrying an `http`/`https` scheme come back untouched.
/// Anything else is joined against `base_url` with standard relative-URL
/// rules. Returns [`NOT_FOUND`] when either side cannot be parsed.
pub fn resolve(candidate: &str, base_url: &str) -> String {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return NOT_FOUND.to_string();
    }

    if has_web_scheme(candidate) {
        return candidate.to_string();
    }

    let joined = Url::parse(base_url).and_then(|base| base.join(candidate));
    match joined {
        Ok(url) => url.to_string(),
        Err(e) => {
            ::log::debug!(
                "Could not resolve '{}' against '{}': {}",
                candidate,
                base_url,
                e
            );
            NOT_FOUND.to_string()
        }
    }
}

fn has_web_scheme(candidate: &str) -> bool {
    match candidate.split_once(':') {
        Some((scheme, _)) => {
            scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
        }
        None => false,
    }
}
