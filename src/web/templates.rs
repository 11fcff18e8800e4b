//! Loads the site's page templates and renders them. Each page template is
//! concatenated with the shared layout file before parsing, so pages can
//! `{{template "header" .}}` and `{{template "footer" .}}`.

use gtmpl::{Context, Template, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The shared layout, defining the `header` and `footer` templates.
const LAYOUT: &str = "layout.html";

/// Every page the site renders.
pub const PAGES: &[&str] = &[
    "index",
    "why",
    "journals",
    "article",
    "contact",
    "guestbook",
    "error",
];

/// The parsed templates, keyed by page name.
pub struct Templates {
    pages: HashMap<&'static str, Template>,
}

impl Templates {
    /// Loads `layout.html` and `<page>.html` for each of [`PAGES`] from
    /// `directory`, failing if any is missing or doesn't parse.
    pub fn load(directory: &Path) -> Result<Templates> {
        let layout = read(&directory.join(LAYOUT))?;
        let mut pages = HashMap::with_capacity(PAGES.len());
        for page in PAGES {
            let path = directory.join(format!("{}.html", page));
            let mut contents = layout.clone();
            contents.push(' ');
            contents.push_str(&read(&path)?);

            let mut template = Template::default();
            template.parse(&contents).map_err(|err| Error::Parse {
                path,
                message: err.to_string(),
            })?;
            pages.insert(*page, template);
        }
        Ok(Templates { pages })
    }

    /// Renders `page` against `value`.
    pub fn render(&self, page: &str, value: Value) -> Result<String> {
        let template = self
            .pages
            .get(page)
            .ok_or_else(|| Error::UnknownPage(page.to_owned()))?;
        let execute = |message: String| Error::Execute {
            page: page.to_owned(),
            message,
        };
        template
            .render(&Context::from(value).map_err(execute)?)
            .map_err(execute)
    }
}

fn read(path: &Path) -> Result<String> {
    let mut contents = String::new();
    File::open(path)
        .and_then(|mut file| file.read_to_string(&mut contents))
        .map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
    Ok(contents)
}

/// Builds a template object from `(key, value)` pairs.
pub fn object<I>(entries: I) -> Value
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    Value::Object(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value))
            .collect(),
    )
}

/// Shorthand for a template string.
pub fn string<S: Into<String>>(s: S) -> Value {
    Value::String(s.into())
}

/// The result of a fallible templating operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or rendering a template.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    #[error("opening template file `{}`: {err}", path.display())]
    Open { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    #[error("parsing template file `{}`: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// Returned when rendering a page fails.
    #[error("rendering page `{page}`: {message}")]
    Execute { page: String, message: String },

    /// Returned when asked to render a page that wasn't loaded.
    #[error("no template for page `{0}`")]
    UnknownPage(String),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load_and_render() -> Result<()> {
        let templates = Templates::load(Path::new("./templates"))?;
        let html = templates.render(
            "error",
            object(vec![("year", string("2026")), ("status", string("404"))]),
        )?;
        assert!(html.contains("Page not found"));
        assert!(html.contains("2026"));
        Ok(())
    }

    #[test]
    fn test_load_missing_directory() {
        match Templates::load(Path::new("./testdata/no-templates")) {
            Err(Error::Open { path, .. }) => assert!(path.ends_with("layout.html")),
            Err(other) => panic!("wanted Open; found {:?}", other),
            Ok(_) => panic!("wanted Open; found templates"),
        }
    }

    #[test]
    fn test_render_unknown_page() -> Result<()> {
        let templates = Templates::load(Path::new("./templates"))?;
        match templates.render("nope", Value::Nil) {
            Err(Error::UnknownPage(page)) => assert_eq!("nope", page),
            other => panic!("wanted UnknownPage; found {:?}", other),
        }
        Ok(())
    }
}
