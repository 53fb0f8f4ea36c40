use url::{Origin, Url};

/// Checks whether a URL belongs to the crawl's origin
///
/// The origin is scheme + host + port, compared after resolution, so
/// relative and protocol-relative links that resolve onto the same site are
/// internal while `http` vs `https`, other subdomains and other ports are not.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_lens::url::is_internal;
///
/// let origin = Url::parse("https://example.com/").unwrap().origin();
/// assert!(is_internal(&origin, &Url::parse("https://example.com/about").unwrap()));
/// assert!(!is_internal(&origin, &Url::parse("https://blog.example.com/").unwrap()));
/// ```
pub fn is_internal(origin: &Origin, url: &Url) -> bool {
    url.origin() == *origin
}
