//! Wires the pipeline together around one page.

use std::path::Path;
use std::time::Instant;

use markup5ever_rcdom::Handle;

use crate::config::Config;
use crate::contact::ContactDirectory;
use crate::controller::{Outcome, SectionController};
use crate::dom::{attr, by_class, closest, has_class};
use crate::error::Error;
use crate::fetcher::{DirTransport, Fetcher, Transport};
use crate::page::{EmailAction, Hook, Page};
use crate::revealer::{DossierSource, Reveal, Revealer, resolve_dossier};

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Click {
    Email(EmailAction),
    /// Landed on nothing bound; any open dossier was closed.
    Outside,
    Tile(Reveal),
}

/// A page plus every component that drives it.
pub struct Site<T> {
    contacts: ContactDirectory,
    controller: SectionController,
    fetcher: Fetcher<T>,
    page: Page,
    revealer: Revealer,
}

impl Site<DirTransport> {
    /// Load `folio.toml` and the shell from `root`, serving content from the
    /// same directory.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if `root` is not a directory, and config or
    /// shell read errors as they occur.
    pub fn open(root: &Path) -> Result<Self, Error> {
        if !root.is_dir() {
            return Err(Error::NotFound { path: root.to_path_buf() });
        }
        let config = Config::load(root)?;
        let page = Page::open(&root.join(&config.shell), &config.sections)?;
        return Ok(Self::new(config, DirTransport::new(root), page));
    }
}

impl<T: Transport> Site<T> {
    pub fn new(config: Config, transport: T, page: Page) -> Self {
        return Self {
            contacts: ContactDirectory::new(),
            controller: SectionController::new(config),
            fetcher: Fetcher::new(transport),
            page,
            revealer: Revealer::new(),
        };
    }

    /// Load every section, then the contact directory. Sections rendered
    /// before the directory arrived are refreshed once it does.
    /// Returns the final outcome for each section that was loaded.
    pub fn boot(&mut self) -> Vec<(String, Outcome)> {
        let mut outcomes = self.load_all();
        for (id, outcome) in self.load_contacts() {
            if let Some(slot) = outcomes.iter_mut().find(|(done, _)| return *done == id) {
                slot.1 = outcome;
            }
        }
        return outcomes;
    }

    pub fn load_all(&mut self) -> Vec<(String, Outcome)> {
        let outcomes = self.controller.load_all(&self.fetcher, &self.contacts, &mut self.page);
        self.revealer.sync(&self.page);
        return outcomes;
    }

    /// Load the contact directory. On success, shell link anchors are
    /// updated and contact-bound sections re-rendered; their outcomes are
    /// returned. On failure nothing changes.
    pub fn load_contacts(&mut self) -> Vec<(String, Outcome)> {
        let url = self.controller.config().contact_file.clone();
        if !self.contacts.load(&self.fetcher, &url) {
            return Vec::new();
        }
        self.page.apply_link_types(&self.contacts);
        self.page.attach_hooks();
        let outcomes = self.controller.refresh_contact_bound(&self.fetcher, &self.contacts, &mut self.page);
        self.revealer.sync(&self.page);
        return outcomes;
    }

    /// # Errors
    ///
    /// Returns `Error::UnknownSection` for ids outside the configured list.
    pub fn refresh(&mut self, section: &str) -> Result<Outcome, Error> {
        let outcome = self.controller.refresh(section, &self.fetcher, &self.contacts, &mut self.page)?;
        self.revealer.sync(&self.page);
        return Ok(outcome);
    }

    /// Dispatch a click on `target` to the nearest bound element.
    /// Clicks outside every tile close the open dossier.
    ///
    /// # Errors
    ///
    /// Returns `Error::ClipboardUnavailable` if a copy could not be made.
    pub fn click(&mut self, target: &Handle, now: Instant) -> Result<Click, Error> {
        let hooked = self.page.hook_for(target);
        if let Some((tile, Hook::Tile)) = &hooked {
            let reveal = self.revealer.activate(
                tile,
                self.controller.dossiers(),
                &self.fetcher,
                &self.contacts,
                self.controller.config(),
                &mut self.page,
            );
            return Ok(Click::Tile(reveal));
        }

        let in_tile = closest(target, |n| return has_class(n, "skill-file")).is_some();
        if !in_tile {
            self.revealer.click_outside(&self.page);
        }

        let Some((link, Hook::Email(style))) = hooked else {
            return Ok(Click::Outside);
        };
        let address = self.contacts.address();
        let action = self.page.activate_email(&link, style, address.as_deref(), now)?;
        return Ok(Click::Email(action));
    }

    /// Fire due timers.
    pub fn tick(&mut self, now: Instant) -> usize {
        return self.page.advance(now);
    }

    /// Open the dossier for `parent`/`child` and return its rendered body
    /// with where it came from. When the page has a tile for the pair the
    /// tile is clicked, so the body is the one a visitor would see. The
    /// dossier is resolved once either way.
    ///
    /// # Errors
    ///
    /// Returns errors from the click, as `click` does.
    pub fn reveal(&mut self, parent: &str, child: &str, now: Instant) -> Result<(Handle, DossierSource), Error> {
        if let Some(tile) = self.tile(parent, child) {
            let clicked = self.click(&tile, now)?;
            let body = by_class(&tile, "subskill-content")
                .into_iter()
                .next()
                .and_then(|well| {
                    let first = well.children.borrow().first().cloned();
                    return first;
                });
            if let (Click::Tile(Reveal::Opened { filled: Some(source), .. }), Some(body)) = (clicked, body) {
                return Ok((body, source));
            }
        }
        return Ok(resolve_dossier(
            parent,
            child,
            self.controller.dossiers(),
            &self.fetcher,
            &self.contacts,
            self.controller.config(),
        ));
    }

    /// The tile for `parent`/`child`, if one is on the page.
    pub fn tile(&self, parent: &str, child: &str) -> Option<Handle> {
        return by_class(self.page.document(), "skill-file").into_iter().find(|tile| {
            return attr(tile, "data-skill-name").as_deref() == Some(parent)
                && attr(tile, "data-subskill-name").as_deref() == Some(child);
        });
    }

    pub const fn contacts(&self) -> &ContactDirectory {
        return &self.contacts;
    }

    pub const fn controller(&self) -> &SectionController {
        return &self.controller;
    }

    pub const fn fetcher(&self) -> &Fetcher<T> {
        return &self.fetcher;
    }

    pub const fn page(&self) -> &Page {
        return &self.page;
    }

    pub const fn page_mut(&mut self) -> &mut Page {
        return &mut self.page;
    }

    pub const fn revealer(&self) -> &Revealer {
        return &self.revealer;
    }
}
