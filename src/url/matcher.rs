/// Checks if a URL path matches an include/exclude pattern
///
/// Two kinds of pattern are supported:
/// 1. Prefix: "/blog" matches "/blog", "/blog/post-1" and "/blogroll"
/// 2. Glob: any pattern containing `*` must match the whole path, where `*`
///    matches any run of characters (including `/`)
///
/// # Examples
///
/// ```
/// use sumi_lens::url::matches_path_pattern;
///
/// assert!(matches_path_pattern("/blog", "/blog/post-1"));
/// assert!(!matches_path_pattern("/blog", "/about"));
///
/// assert!(matches_path_pattern("/docs/*.html", "/docs/guide/intro.html"));
/// assert!(matches_path_pattern("*/print", "/articles/42/print"));
/// assert!(!matches_path_pattern("*/print", "/articles/42/print/extra"));
/// ```
pub fn matches_path_pattern(pattern: &str, path: &str) -> bool {
    if pattern.contains('*') {
        glob_match(pattern.as_bytes(), path.as_bytes())
    } else {
        path.starts_with(pattern)
    }
}

/// Whole-string wildcard match with backtracking on the last `*`
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut star_text = 0;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            star = Some(p);
            star_text = t;
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some(s) = star {
            p = s + 1;
            star_text += 1;
            t = star_text;
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}
