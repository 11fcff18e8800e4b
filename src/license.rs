//! The table of known Creative Commons licences and the HTML attribution
//! snippet rendered beneath each article.

use serde::Deserialize;
use tracing::warn;

/// The licence used when an article doesn't name one.
pub const DEFAULT_LICENSE: &str = "CC-BY-4.0";

/// `(identifier, path segment, human-readable name)`
const KNOWN_LICENSES: &[(&str, &str, &str)] = &[
    ("CC-BY-4.0", "by", "Attribution"),
    ("CC-BY-SA-4.0", "by-sa", "Attribution-ShareAlike"),
    ("CC-BY-NC-4.0", "by-nc", "Attribution-NonCommercial"),
    ("CC-BY-ND-4.0", "by-nd", "Attribution-NoDerivatives"),
    ("CC-BY-NC-ND-4.0", "by-nc-nd", "Attribution-NonCommercial-NoDerivatives"),
    ("CC-BY-NC-SA-4.0", "by-nc-sa", "Attribution-NonCommercial-ShareAlike"),
];

/// Selects how an article's licence snippet is chosen.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LicenseMode {
    /// Every article is presented under [`DEFAULT_LICENSE`], whatever its
    /// metadata says.
    Fixed,

    /// The metadata's `license` field picks the snippet. Absent or unknown
    /// identifiers fall back to [`DEFAULT_LICENSE`].
    FromMetadata,
}

impl Default for LicenseMode {
    fn default() -> Self {
        LicenseMode::Fixed
    }
}

impl LicenseMode {
    /// Returns the attribution HTML for an article whose metadata names
    /// `license` (if anything).
    pub fn html(self, license: Option<&str>) -> String {
        match self {
            LicenseMode::Fixed => default_html(),
            LicenseMode::FromMetadata => {
                let id = license.unwrap_or(DEFAULT_LICENSE);
                match license_html(id) {
                    Some(html) => html,
                    None => {
                        warn!(license = id, "unknown licence; using {}", DEFAULT_LICENSE);
                        default_html()
                    }
                }
            }
        }
    }
}

/// Returns the attribution HTML for a known licence identifier.
pub fn license_html(id: &str) -> Option<String> {
    KNOWN_LICENSES
        .iter()
        .find(|(known, _, _)| *known == id)
        .map(|(_, segment, name)| snippet(segment, name))
}

/// Lists the identifiers of every known licence.
pub fn known_licenses() -> impl Iterator<Item = &'static str> {
    KNOWN_LICENSES.iter().map(|(id, _, _)| *id)
}

fn default_html() -> String {
    snippet("by", "Attribution")
}

fn snippet(segment: &str, name: &str) -> String {
    format!(
        concat!(
            r#"<a rel="license" href="http://creativecommons.org/licenses/{segment}/4.0/">"#,
            r#"<img alt="Creative Commons License" style="border-width:0" "#,
            r#"src="https://i.creativecommons.org/l/{segment}/4.0/88x31.png" /></a><br />"#,
            r#"This work is licensed under a <a rel="license" "#,
            r#"href="http://creativecommons.org/licenses/{segment}/4.0/">"#,
            r#"Creative Commons {name} 4.0 International License</a>."#,
        ),
        segment = segment,
        name = name,
    )
}
