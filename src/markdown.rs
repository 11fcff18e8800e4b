//! Markdown handling for article bodies: pointing image references at their
//! hosted copies and converting the result to HTML.

use crate::source::Manifest;
use pulldown_cmark::{escape, html, Options, Parser};

/// File extensions (compared case-insensitively) that mark a source file as
/// an image.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpeg", "jpg", "gif", "tif", "tiff"];

/// Reports whether `file_name` names an image, judged by the text after its
/// last `.`.
pub fn is_image(file_name: &str) -> bool {
    let extension = file_name.rsplit('.').next().unwrap_or(file_name);
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Replaces every occurrence of each image file name in `body` with the
/// image's raw URL.
///
/// This is a plain substring replacement. It is not limited to markdown image
/// syntax, so an image name mentioned in prose is rewritten too, as is a name
/// that happens to be a suffix of a longer one.
pub fn rewrite_images(body: &str, manifest: &Manifest) -> String {
    let mut body = body.to_owned();
    for (name, file) in manifest.iter().filter(|(name, _)| is_image(name)) {
        if body.contains(name.as_str()) {
            body = body.replace(name.as_str(), &file.raw_url);
        }
    }
    body
}

/// Converts markdown to HTML. Tables are enabled; fenced code blocks are
/// part of CommonMark and need no flag. Nothing else is turned on.
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);

    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, Parser::new_ext(markdown, options));
    output
}

/// Escapes `&`, `<`, `>` and `"` in text bound for an HTML page.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    // Writing into a `String` never fails.
    let _ = escape::escape_html(&mut escaped, text);
    escaped
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::source::SourceFile;

    fn manifest(files: &[(&str, &str)]) -> Manifest {
        files
            .iter()
            .map(|(name, raw_url)| {
                (
                    name.to_string(),
                    SourceFile {
                        content: String::new(),
                        raw_url: raw_url.to_string(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_is_image() {
        assert!(is_image("fig1.png"));
        assert!(is_image("Photo.JPEG"));
        assert!(is_image("scan.tiff"));
        assert!(is_image("archive.tar.gif"));
        assert!(!is_image("article.md"));
        assert!(!is_image("article.json"));
    }

    #[test]
    fn test_rewrite_images() {
        let files = manifest(&[
            ("fig1.png", "https://x/fig1.png"),
            ("article.md", "https://x/article.md"),
        ]);
        assert_eq!(
            "See https://x/fig1.png for details",
            rewrite_images("See fig1.png for details", &files)
        );
    }

    #[test]
    fn test_rewrite_images_touches_prose_and_markup() {
        let files = manifest(&[("map.jpg", "https://x/map.jpg")]);
        assert_eq!(
            "![map](https://x/map.jpg)\n\nThe file https://x/map.jpg is large.",
            rewrite_images("![map](map.jpg)\n\nThe file map.jpg is large.", &files)
        );
    }

    #[test]
    fn test_rewrite_images_leaves_non_images() {
        let files = manifest(&[("notes.md", "https://x/notes.md")]);
        assert_eq!(
            "Read notes.md first.",
            rewrite_images("Read notes.md first.", &files)
        );
    }

    #[test]
    fn test_to_html_table_and_fence() {
        let html = to_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n```python\nx = 1\n```\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
        assert!(html.contains(r#"<pre><code class="language-python">x = 1"#));
    }

    #[test]
    fn test_to_html_no_strikethrough() {
        assert_eq!("<p>~~gone~~</p>\n", to_html("~~gone~~"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            "&lt;script&gt;alert(&quot;hi&quot;) &amp; bye&lt;/script&gt;",
            escape_html(r#"<script>alert("hi") & bye</script>"#)
        );
        assert_eq!("plain text", escape_html("plain text"));
    }
}
