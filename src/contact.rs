//! Contact directory: the obfuscated email and the named link table.
//!
//! Substitution is purely textual and runs before parsing, so the parser
//! never sees a `{{...}}` token.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Deserialize;

use crate::fetcher::{Fetcher, Transport};
use crate::log;

/// Returned by `email()` when the directory cannot assemble an address.
pub const EMAIL_UNAVAILABLE: &str = "Email unavailable";
/// Returned by `link()` for names the directory cannot resolve.
pub const UNRESOLVED_LINK: &str = "#";
/// Reserved link target marking an email reveal anchor for the renderer.
pub const EMAIL_REVEAL_HREF: &str = "email:reveal";
/// Text shown on a reveal anchor before its first activation.
pub const EMAIL_REVEAL_LABEL: &str = "Click to reveal email";

static LINKED_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"\[([^\]]+)\]\(\{\{link:([A-Za-z0-9_-]+)\}\}\)").expect("valid regex");
});
static LINK_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\{\{link:([A-Za-z0-9_-]+)\}\}").expect("valid regex"));
static EMAIL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\{\{email\}\}").expect("valid regex"));
static ANY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"\{\{(?:email|link:[A-Za-z0-9_-]+)\}\}").expect("valid regex");
});

/// The address split into pieces so it never appears whole in the JSON file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct EmailParts {
    /// Domain label without the top-level part, e.g. `example`.
    pub domain: Option<String>,
    /// Second piece of the local part.
    pub middle: Option<String>,
    /// First piece of the local part.
    pub prefix: Option<String>,
    /// Last piece of the local part.
    pub suffix: Option<String>,
    /// Top-level domain including its dot, e.g. `.com`.
    pub tld: Option<String>,
}

impl EmailParts {
    /// `prefix + middle + suffix + "@" + domain + tld`, or `None` if any piece is missing.
    pub fn assemble(&self) -> Option<String> {
        let prefix = self.prefix.as_deref()?;
        let middle = self.middle.as_deref()?;
        let suffix = self.suffix.as_deref()?;
        let domain = self.domain.as_deref()?;
        let tld = self.tld.as_deref()?;
        return Some(format!("{prefix}{middle}{suffix}@{domain}{tld}"));
    }
}

/// Contents of the contact directory file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ContactRecord {
    /// Obfuscated email pieces.
    #[serde(default)]
    pub email: Option<EmailParts>,
    /// Link name -> URL.
    #[serde(default)]
    pub links: BTreeMap<String, String>,
}

/// Holds the contact record once loaded. Until then, and if loading fails,
/// every query answers with a sentinel.
#[derive(Debug, Clone, Default)]
pub struct ContactDirectory {
    record: Option<ContactRecord>,
}

impl ContactDirectory {
    /// An unloaded directory.
    pub fn new() -> Self {
        return Self::default();
    }

    /// A directory already holding `record`.
    pub const fn from_record(record: ContactRecord) -> Self {
        return Self { record: Some(record) };
    }

    /// True once a record has been loaded.
    pub const fn is_loaded(&self) -> bool {
        return self.record.is_some();
    }

    /// Load the record from `url`, bypassing caches. Never fails to the caller:
    /// on any error the directory stays unloaded and `false` is returned.
    /// A loaded record is immutable; later calls keep it and return `true`.
    pub fn load<T: Transport>(&mut self, fetcher: &Fetcher<T>, url: &str) -> bool {
        if self.is_loaded() {
            return true;
        }
        match fetcher.fetch_json::<ContactRecord>(url, true) {
            Ok(record) => {
                log!("contact"; "loaded {} links from {url}", record.links.len());
                self.record = Some(record);
                return true;
            },
            Err(e) => {
                log!("error"; "contact directory unavailable: {e}");
                return false;
            },
        }
    }

    /// The assembled address, when the record has every piece of it.
    pub fn address(&self) -> Option<String> {
        return self.record.as_ref().and_then(|r| return r.email.as_ref()).and_then(EmailParts::assemble);
    }

    /// The assembled address, or `EMAIL_UNAVAILABLE`.
    pub fn email(&self) -> String {
        return self.address().unwrap_or_else(|| return EMAIL_UNAVAILABLE.to_string());
    }

    /// The URL registered under `name`, or `UNRESOLVED_LINK`.
    pub fn link(&self, name: &str) -> &str {
        return self
            .record
            .as_ref()
            .and_then(|r| return r.links.get(name))
            .map_or(UNRESOLVED_LINK, String::as_str);
    }

    /// Replace contact tokens in source text.
    ///
    /// 1. `[label]({{link:NAME}})` becomes `[label](URL)` when `NAME` resolves,
    ///    and is left alone otherwise.
    /// 2. Remaining `{{link:NAME}}` become the URL or `#`.
    /// 3. `{{email}}` becomes a reveal anchor when an address is available,
    ///    or the `Email unavailable` sentinel text.
    pub fn substitute(&self, text: &str) -> String {
        let linked = LINKED_TOKEN.replace_all(text, |cap: &Captures<'_>| {
            let url = self.link(&cap[2]);
            if url == UNRESOLVED_LINK {
                return cap[0].to_string();
            }
            return format!("[{}]({url})", &cap[1]);
        });
        let bare = LINK_TOKEN.replace_all(&linked, |cap: &Captures<'_>| return self.link(&cap[1]).to_string());

        let replacement = match self.address() {
            Some(_) => format!("[{EMAIL_REVEAL_LABEL}]({EMAIL_REVEAL_HREF})"),
            None => EMAIL_UNAVAILABLE.to_string(),
        };
        return EMAIL_TOKEN.replace_all(&bare, regex::NoExpand(&replacement)).into_owned();
    }
}

/// True when `text` still holds a contact token.
pub fn has_tokens(text: &str) -> bool {
    return ANY_TOKEN.is_match(text);
}

/// Names used in `{{link:NAME}}` tokens, with one-based line numbers.
pub fn link_tokens(text: &str) -> Vec<(u32, String)> {
    let mut found = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = u32::try_from(idx).unwrap_or(u32::MAX).saturating_add(1);
        for cap in LINK_TOKEN.captures_iter(line) {
            found.push((line_no, cap[1].to_string()));
        }
    }
    return found;
}
