//! Sub-skill tiles: at most one dossier open at a time.

use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::config::Config;
use crate::contact::ContactDirectory;
use crate::dom::{attr, by_class, by_id, is_hidden, replace_children, set_hidden};
use crate::fetcher::{Fetcher, Transport};
use crate::log;
use crate::page::Page;
use crate::parser::{DossierTable, dossier_key, parse};
use crate::render::{dossier_body, dossier_placeholder};

/// What a tile activation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reveal {
    /// The open tile was activated again and closed.
    Closed,
    /// Element is not a well-formed tile; nothing changed.
    Ignored,
    /// The tile is now the open one.
    Opened {
        /// Tile id (`data-skill-id`).
        key: String,
        /// Where the body came from when the well was filled on this
        /// activation; `None` when it already held a dossier.
        filled: Option<DossierSource>,
    },
}

/// Where a dossier's body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DossierSource {
    /// Per-dossier file under the sub-skill directory.
    Fallback,
    /// Nothing found; placeholder shown.
    Placeholder,
    /// `@subskill:` region of the dossier section.
    Table,
}

/// Tracks the single open tile.
#[derive(Debug, Clone, Default)]
pub struct Revealer {
    open: Option<String>,
}

impl Revealer {
    pub fn new() -> Self {
        return Self::default();
    }

    /// Id of the open tile, if any.
    pub fn open_key(&self) -> Option<&str> {
        return self.open.as_deref();
    }

    /// Toggle `tile`. Activating the open tile closes it; any other tile
    /// closes whatever was open and opens itself, filling its well on first
    /// use.
    pub fn activate<T: Transport>(
        &mut self,
        tile: &Handle,
        dossiers: &DossierTable,
        fetcher: &Fetcher<T>,
        contacts: &ContactDirectory,
        config: &Config,
        page: &mut Page,
    ) -> Reveal {
        let (Some(key), Some(parent), Some(child)) = (
            attr(tile, "data-skill-id"),
            attr(tile, "data-skill-name"),
            attr(tile, "data-subskill-name"),
        ) else {
            return Reveal::Ignored;
        };
        let Some(well) = by_class(tile, "subskill-content").into_iter().next() else {
            return Reveal::Ignored;
        };

        if self.open.as_deref() == Some(key.as_str()) && !is_hidden(&well) {
            set_hidden(&well, true);
            self.open = None;
            return Reveal::Closed;
        }

        for other in by_class(page.document(), "subskill-content") {
            if !Rc::ptr_eq(&other, &well) && !is_hidden(&other) {
                set_hidden(&other, true);
            }
        }
        self.open = Some(key.clone());
        set_hidden(&well, false);

        let mut filled = None;
        if !by_class(&well, "subskill-loading").is_empty() {
            let (body, source) = resolve_dossier(&parent, &child, dossiers, fetcher, contacts, config);
            replace_children(&well, vec![body]);
            page.attach_hooks();
            filled = Some(source);
        }
        return Reveal::Opened { key, filled };
    }

    /// A click landed outside every tile: close the open one.
    pub fn click_outside(&mut self, page: &Page) {
        let Some(key) = self.open.take() else { return };
        if let Some(well) = by_id(page.document(), &format!("subskill-content-{key}")) {
            set_hidden(&well, true);
        }
    }

    /// Forget the open tile if a re-render replaced or hid it.
    pub fn sync(&mut self, page: &Page) {
        let Some(key) = self.open.as_deref() else { return };
        let visible = by_id(page.document(), &format!("subskill-content-{key}")).is_some_and(|w| return !is_hidden(&w));
        if !visible {
            self.open = None;
        }
    }
}

/// Find and render a dossier: the side-table first, then the per-dossier
/// fallback file, then a placeholder naming the pair.
pub fn resolve_dossier<T: Transport>(
    parent: &str,
    child: &str,
    dossiers: &DossierTable,
    fetcher: &Fetcher<T>,
    contacts: &ContactDirectory,
    config: &Config,
) -> (Handle, DossierSource) {
    if let Some(body) = dossiers.get(parent, child) {
        return (dossier_body(&parse(body).document), DossierSource::Table);
    }

    let url = fallback_url(&config.subskill_dir, parent, child);
    return match fetcher.fetch_text(&url, false) {
        Ok(text) => (dossier_body(&parse(&contacts.substitute(&text)).document), DossierSource::Fallback),
        Err(e) => {
            log!("reveal"; "no dossier for {parent}/{child}: {e}");
            (dossier_placeholder(parent, child), DossierSource::Placeholder)
        },
    };
}

/// `<dir>/<key>.txt`, with anything outside `[A-Za-z0-9_]` in the key as `_`.
pub fn fallback_url(dir: &str, parent: &str, child: &str) -> String {
    let file: String = dossier_key(parent, child)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    return format!("{}/{file}.txt", dir.trim_end_matches('/'));
}
