//! Standalone HTML page around a rendered body.

use super::html::escape;
use crate::model::Metadata;

/// Title used when the package has none.
pub const DEFAULT_TITLE: &str = "Document";

const STYLE: &str = "body { max-width: 50em; margin: 0 auto; padding: 1em; font-family: sans-serif; line-height: 1.5; }
img { max-width: 100%; height: auto; }
table { border-collapse: collapse; }
td, th { border: 1px solid #ccc; padding: 0.25em 0.5em; vertical-align: top; }";

/// Wrap a body fragment into a complete, offline HTML document.
///
/// The page references nothing outside itself: styling is inline and images
/// are expected to be `data:` URIs already.
pub fn assemble(body: &str, metadata: &Metadata) -> String {
    let title = metadata
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE);
    let lang = metadata
        .language
        .as_deref()
        .map(|lang| format!(" lang=\"{}\"", escape(lang)))
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\n<html{lang}>\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>\n{STYLE}\n</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        escape(title)
    )
}
