//! Skip policy for hrefs and frontier entries.

use url::Url;

/// Path extensions that never lead to an HTML page.
const NON_HTML_EXTENSIONS: &[&str] = &[
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "rtf", "csv", "txt",
    // images
    "jpg", "jpeg", "png", "gif", "svg", "webp", "ico", "bmp", "tif", "tiff", "avif",
    // archives
    "zip", "rar", "7z", "tar", "gz", "tgz", "bz2", "dmg", "exe", "apk",
    // media
    "mp3", "mp4", "m4a", "avi", "mov", "wmv", "webm", "wav", "ogg", "flac", "mkv",
    // fonts
    "woff", "woff2", "ttf", "otf", "eot",
    // assets and data
    "css", "js", "mjs", "json", "xml", "rss", "atom", "map",
];

/// Schemes that are never fetched.
const SKIPPED_SCHEMES: &[&str] = &["mailto:", "tel:", "javascript:", "data:", "sms:"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NonHttpScheme,
    FragmentOnly,
    NonHtmlExtension,
}

/// Reason a raw href is not a link to another document.
pub fn skip_href(href: &str) -> Option<SkipReason> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return Some(SkipReason::FragmentOnly);
    }
    let lower = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return Some(SkipReason::NonHttpScheme);
    }
    None
}

/// Reason an absolute URL should not be fetched by the crawler.
pub fn skip_url(url: &str) -> Option<SkipReason> {
    if let Some(reason) = skip_href(url) {
        return Some(reason);
    }
    let Ok(parsed) = Url::parse(url) else {
        return Some(SkipReason::NonHttpScheme);
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return Some(SkipReason::NonHttpScheme);
    }
    has_non_html_extension(parsed.path()).then_some(SkipReason::NonHtmlExtension)
}

fn has_non_html_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            NON_HTML_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_href() {
        assert_eq!(skip_href("#top"), Some(SkipReason::FragmentOnly));
        assert_eq!(skip_href("mailto:a@example.com"), Some(SkipReason::NonHttpScheme));
        assert_eq!(skip_href("TEL:+123"), Some(SkipReason::NonHttpScheme));
        assert_eq!(skip_href("javascript:void(0)"), Some(SkipReason::NonHttpScheme));
        assert_eq!(skip_href("/about"), None);
        assert_eq!(skip_href("https://example.com/#x"), None);
    }

    #[test]
    fn test_skip_url_extensions() {
        assert_eq!(skip_url("https://example.com/report.PDF"), Some(SkipReason::NonHtmlExtension));
        assert_eq!(skip_url("https://example.com/logo.png"), Some(SkipReason::NonHtmlExtension));
        assert_eq!(skip_url("https://example.com/app.js"), Some(SkipReason::NonHtmlExtension));
        assert_eq!(skip_url("https://example.com/sitemap.xml"), Some(SkipReason::NonHtmlExtension));
        assert_eq!(skip_url("https://example.com/about"), None);
        assert_eq!(skip_url("https://example.com/page.html"), None);
        assert_eq!(skip_url("https://example.com/v1.2/docs"), None);
        assert_eq!(skip_url("https://example.com/.well-known"), None);
    }
}
