//! Extension to mimetype table used to pick a parser.

use super::url::ResourceUrl;
use std::collections::HashMap;
use tracing::debug;

/// `application/json`
pub const JSON: &str = "application/json";
/// `application/yaml`
pub const YAML: &str = "application/yaml";
/// `text/csv`
pub const CSV: &str = "text/csv";
/// `text/plain`
pub const TEXT: &str = "text/plain";
/// `application/pickle`
pub const PICKLE: &str = "application/pickle";

/// Mutable mapping from file extension to mimetype.
///
/// Extensions and mimetypes are stored lower-cased; extensions may be given with or
/// without the leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeTypes {
    types: HashMap<String, String>,
}

impl Default for MimeTypes {
    fn default() -> Self {
        let mut table = Self::empty();
        for (ext, mimetype) in [
            (".json", JSON),
            (".yaml", YAML),
            (".yml", YAML),
            (".csv", CSV),
            (".txt", TEXT),
            (".text", TEXT),
            (".pkl", PICKLE),
            (".pickle", PICKLE),
        ] {
            table.add_type(mimetype, ext);
        }
        table
    }
}

impl MimeTypes {
    /// A table with no entries.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Map `ext` to `mimetype`, replacing any previous mapping.
    pub fn add_type(&mut self, mimetype: &str, ext: &str) {
        let ext = normalize_ext(ext);
        let mimetype = mimetype.to_ascii_lowercase();
        debug!("Adding extension-mimetype mapping: {ext} -> {mimetype}");
        self.types.insert(ext, mimetype);
    }

    /// Remove one extension, returning the mimetype it mapped to.
    pub fn remove_ext(&mut self, ext: &str) -> Option<String> {
        let ext = normalize_ext(ext);
        debug!("Removing extension: {ext}");
        self.types.remove(&ext)
    }

    /// Remove every extension mapping to `mimetype`; returns the removed extensions.
    pub fn remove_type(&mut self, mimetype: &str) -> Vec<String> {
        let mimetype = mimetype.to_ascii_lowercase();
        let mut removed: Vec<String> = self
            .types
            .iter()
            .filter(|(_, value)| **value == mimetype)
            .map(|(ext, _)| ext.clone())
            .collect();
        removed.sort_unstable();

        debug!("Selected extensions to remove: {removed:?}");
        for ext in &removed {
            self.types.remove(ext);
        }
        removed
    }

    /// Mimetype for the extension of `url`, if known.
    pub fn guess_type(&self, url: &ResourceUrl) -> Option<&str> {
        let guessed = url.extension().and_then(|ext| self.types.get(&ext)).map(String::as_str);
        debug!(url = %url, mimetype = ?guessed, "Guessed resource type");
        guessed
    }

    /// Mimetype registered for a single extension.
    pub fn get(&self, ext: &str) -> Option<&str> {
        self.types.get(&normalize_ext(ext)).map(String::as_str)
    }
}

fn normalize_ext(ext: &str) -> String {
    let ext = ext.to_ascii_lowercase();
    if ext.starts_with('.') { ext } else { format!(".{ext}") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = MimeTypes::default();
        assert_eq!(table.guess_type(&ResourceUrl::parse("a/b.YML")), Some(YAML));
        assert_eq!(table.guess_type(&ResourceUrl::parse("https://h/data.pickle")), Some(PICKLE));
        assert_eq!(table.guess_type(&ResourceUrl::parse("a/b.bin")), None);
        assert_eq!(table.guess_type(&ResourceUrl::parse("noext")), None);
    }

    #[test]
    fn test_add_and_remove() {
        let mut table = MimeTypes::default();
        table.add_type("Application/X-Custom", "CFG");
        assert_eq!(table.get(".cfg"), Some("application/x-custom"));

        assert_eq!(table.remove_ext(".cfg").as_deref(), Some("application/x-custom"));
        assert_eq!(table.remove_ext(".cfg"), None);

        assert_eq!(table.remove_type(YAML), [".yaml", ".yml"]);
        assert_eq!(table.get("yaml"), None);
        assert_eq!(table.get("json"), Some(JSON));
    }
}
