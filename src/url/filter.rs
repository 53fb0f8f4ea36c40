use crate::config::CrawlConfig;
use crate::url::matches_path_pattern;
use url::Url;

/// File extensions that never lead to an HTML page
pub const SKIPPED_EXTENSIONS: &[&str] = &[
    // Images
    "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "bmp", "tif", "tiff", "avif",
    // Documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "csv", "rtf",
    // Archives
    "zip", "rar", "7z", "tar", "gz", "tgz", "bz2", "dmg", "exe", "msi", "apk",
    // Media
    "mp3", "mp4", "wav", "ogg", "webm", "avi", "mov", "mkv", "flac", "m4a",
    // Fonts
    "woff", "woff2", "ttf", "otf", "eot",
    // Assets
    "css", "js", "json", "xml", "txt", "map",
];

/// Decides whether a URL is eligible for crawling
///
/// A URL is rejected when:
/// - its path ends in a known non-HTML extension
/// - its path matches any `exclude-paths` pattern
/// - `include-paths` is non-empty and its path matches none of them
///
/// Exclusion wins over inclusion.
pub fn should_crawl(config: &CrawlConfig, url: &Url) -> bool {
    let path = url.path();

    if has_skipped_extension(path) {
        return false;
    }

    if config
        .exclude_paths
        .iter()
        .any(|pattern| matches_path_pattern(pattern, path))
    {
        return false;
    }

    config.include_paths.is_empty()
        || config
            .include_paths
            .iter()
            .any(|pattern| matches_path_pattern(pattern, path))
}

/// Checks whether the last path segment carries a skipped extension
pub fn has_skipped_extension(path: &str) -> bool {
    let last_segment = path.rsplit('/').next().unwrap_or("");

    match last_segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            SKIPPED_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}
