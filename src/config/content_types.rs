// ABOUTME: File extension to content type table for static uploads.
// ABOUTME: Built-in defaults, extended or overridden from configuration.

use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_CONTENT_TYPES: &[(&str, &str)] = &[
    (".map", "application/json"),
    (".swf", "application/x-shockwave-flash"),
    (".js", "application/javascript"),
    (".woff", "application/x-font-woff"),
    (".otf", "application/x-font-otf"),
    (".eot", "application/x-font-eot"),
    (".ttf", "application/x-font-ttf"),
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".svg", "image/svg+xml"),
    (".gif", "image/gif"),
    (".ico", "image/x-icon"),
    (".css", "text/css"),
    (".html", "text/html"),
    (".json", "application/json"),
    (".txt", "text/plain"),
];

/// Maps `.ext` (lowercase, with the dot) to a content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypes(BTreeMap<String, String>);

impl Default for ContentTypes {
    fn default() -> Self {
        Self(
            DEFAULT_CONTENT_TYPES
                .iter()
                .map(|(ext, ty)| (ext.to_string(), ty.to_string()))
                .collect(),
        )
    }
}

impl ContentTypes {
    /// Defaults plus `extra`; entries in `extra` win.
    pub fn with_overrides(extra: &BTreeMap<String, String>) -> Self {
        let mut types = Self::default();
        for (ext, ty) in extra {
            types.0.insert(normalize(ext), ty.clone());
        }
        types
    }

    /// Content type for a file, or `None` if its extension is unknown.
    pub fn lookup(&self, path: &Path) -> Option<&str> {
        let ext = path.extension()?.to_str()?;
        self.0.get(&normalize(ext)).map(String::as_str)
    }
}

fn normalize(ext: &str) -> String {
    format!(".{}", ext.trim_start_matches('.').to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_common_web_assets() {
        let types = ContentTypes::default();
        assert_eq!(types.lookup(Path::new("a/b/site.css")), Some("text/css"));
        assert_eq!(types.lookup(Path::new("logo.PNG")), Some("image/png"));
        assert_eq!(types.lookup(Path::new("app.js.map")), Some("application/json"));
        assert_eq!(types.lookup(Path::new("README")), None);
        assert_eq!(types.lookup(Path::new("module.wasm")), None);
    }

    #[test]
    fn overrides_add_and_replace() {
        let extra = BTreeMap::from([
            ("webp".to_string(), "image/webp".to_string()),
            (".js".to_string(), "text/javascript".to_string()),
        ]);
        let types = ContentTypes::with_overrides(&extra);
        assert_eq!(types.lookup(Path::new("x.webp")), Some("image/webp"));
        assert_eq!(types.lookup(Path::new("x.js")), Some("text/javascript"));
    }
}
