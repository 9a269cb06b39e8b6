use std::collections::HashMap;
use std::path::Path;

use crate::error::Error;

/// Name of the config file looked up in the site root.
pub const CONFIG_FILE: &str = "folio.toml";

/// Site configuration loaded from `folio.toml`.
/// Every field has a default matching the stock portfolio layout.
#[derive(Debug, Clone)]
pub struct Config {
    /// Contact directory JSON, relative to the site root.
    pub contact_file: String,
    /// Sections re-rendered after the contact directory loads.
    pub contact_bound: Vec<String>,
    /// Directory holding one `<file>.txt` per section.
    pub content_dir: String,
    /// Section whose parse repopulates the sub-skill dossier table.
    pub dossier_section: String,
    /// Section id -> content file stem, where the two differ.
    pub files: HashMap<String, String>,
    /// Section ids in load order.
    pub sections: Vec<String>,
    /// Shell HTML file; scaffolded when absent on disk.
    pub shell: String,
    /// Directory holding per-dossier fallback files.
    pub subskill_dir: String,
}

/// Raw TOML structure for `folio.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct FolioTomlConfig {
    contact_bound: Option<Vec<String>>,
    contact_file: Option<String>,
    content_dir: Option<String>,
    dossier_section: Option<String>,
    #[serde(default)]
    files: HashMap<String, String>,
    sections: Option<Vec<String>>,
    shell: Option<String>,
    subskill_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            contact_file: "contact-info.json".to_string(),
            contact_bound: vec!["contact".to_string()],
            content_dir: "content".to_string(),
            dossier_section: "skills".to_string(),
            files: HashMap::from([("projects".to_string(), "experience".to_string())]),
            sections: ["about", "skills", "projects", "contact"].map(String::from).to_vec(),
            shell: "index.html".to_string(),
            subskill_dir: "content/subskills".to_string(),
        };
    }
}

impl Config {
    /// Load config from `folio.toml` in the given root directory.
    /// Returns the defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; a config the
    /// user wrote is never silently replaced by defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };
        return Self::parse(&content);
    }

    /// Parse config text, filling unset keys from the defaults.
    /// `[files]` entries are merged over the default mapping.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: FolioTomlConfig = toml::from_str(content)?;
        let defaults = Self::default();

        let mut files = defaults.files;
        files.extend(raw.files);

        return Ok(Self {
            contact_file: raw.contact_file.unwrap_or(defaults.contact_file),
            contact_bound: raw.contact_bound.unwrap_or(defaults.contact_bound),
            content_dir: raw.content_dir.unwrap_or(defaults.content_dir),
            dossier_section: raw.dossier_section.unwrap_or(defaults.dossier_section),
            files,
            sections: raw.sections.unwrap_or(defaults.sections),
            shell: raw.shell.unwrap_or(defaults.shell),
            subskill_dir: raw.subskill_dir.unwrap_or(defaults.subskill_dir),
        });
    }

    /// Content file stem for a section; the identity unless `[files]` overrides it.
    pub fn file_stem<'a>(&'a self, section: &'a str) -> &'a str {
        return self.files.get(section).map_or(section, String::as_str);
    }

    /// Site-relative URL of a section's content file.
    pub fn section_url(&self, section: &str) -> String {
        let dir = self.content_dir.trim_end_matches('/');
        return format!("{dir}/{}.txt", self.file_stem(section));
    }
}
