//! Section lifecycle: fetch, substitute, parse, render, mount.
//!
//! The controller owns the per-section state table and the dossier table.
//! Nothing it does fails upward; a section that cannot load shows an error
//! banner in place and the rest of the page carries on.

use std::collections::HashMap;

use chrono::{DateTime, Local};
use rayon::prelude::*;

use crate::config::Config;
use crate::contact::{ContactDirectory, has_tokens};
use crate::error::Error;
use crate::fetcher::{Fetcher, Transport};
use crate::log;
use crate::page::Page;
use crate::parser::{Discard, DossierTable, Parsed, parse};
use crate::render::{error_banner, footer, render_document};
use crate::types::Document;

/// What the controller knows about one section.
#[derive(Debug, Clone, Default)]
pub struct SectionState {
    /// Blocks dropped by the last successful parse.
    pub discards: Vec<Discard>,
    /// Document from the last successful parse.
    pub document: Option<Document>,
    /// Message shown in the banner when the last load failed.
    pub error: Option<String>,
    pub last_loaded_at: Option<DateTime<Local>>,
    /// Source text as fetched, before substitution.
    pub raw_text: Option<String>,
    /// True once content (or a banner) has been mounted.
    pub rendered: bool,
    /// Rendered while the contact directory was unloaded, with tokens in the
    /// source. Such a section is refreshed once the directory arrives.
    pub unresolved_tokens: bool,
}

/// Result of one section load.
#[derive(Debug)]
pub enum Outcome {
    /// Loading or mounting failed; a banner was shown where possible.
    Failed(Error),
    /// Content mounted.
    Rendered {
        /// Top-level blocks in the document.
        blocks: usize,
    },
}

impl Outcome {
    pub const fn is_rendered(&self) -> bool {
        return matches!(self, Self::Rendered { .. });
    }
}

/// Fetched text and its parse, or the fetch error.
type Loaded = Result<(String, Parsed), Error>;

pub struct SectionController {
    config: Config,
    dossiers: DossierTable,
    states: HashMap<String, SectionState>,
}

impl SectionController {
    pub fn new(config: Config) -> Self {
        let states = config.sections.iter().map(|id| return (id.clone(), SectionState::default())).collect();
        return Self { config, dossiers: DossierTable::default(), states };
    }

    pub const fn config(&self) -> &Config {
        return &self.config;
    }

    /// Dossiers from the last successful load of the dossier section.
    pub const fn dossiers(&self) -> &DossierTable {
        return &self.dossiers;
    }

    pub fn state(&self, section: &str) -> Option<&SectionState> {
        return self.states.get(section);
    }

    /// Sections whose last load failed, in configured order.
    pub fn failed_sections(&self) -> Vec<&str> {
        return self
            .config
            .sections
            .iter()
            .filter(|id| return self.states.get(*id).is_some_and(|s| return s.error.is_some()))
            .map(String::as_str)
            .collect();
    }

    /// Load every configured section. Fetch and parse run in parallel;
    /// mounting happens here, in configured order.
    pub fn load_all<T: Transport>(
        &mut self,
        fetcher: &Fetcher<T>,
        contacts: &ContactDirectory,
        page: &mut Page,
    ) -> Vec<(String, Outcome)> {
        let config = &self.config;
        let loaded: Vec<(String, Loaded)> = config
            .sections
            .par_iter()
            .map(|id| {
                let result = fetcher.fetch_text(&config.section_url(id), false);
                return (id.clone(), result.map(|raw| return prepare(raw, contacts)));
            })
            .collect();

        return loaded
            .into_iter()
            .map(|(id, result)| {
                let outcome = self.settle(&id, result, contacts, page);
                return (id, outcome);
            })
            .collect();
    }

    /// Re-fetch one section past any cache and render it again. Loading the
    /// dossier section replaces the dossier table.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownSection` if `section` is not configured. Load
    /// failures are reported through the returned `Outcome`.
    pub fn refresh<T: Transport>(
        &mut self,
        section: &str,
        fetcher: &Fetcher<T>,
        contacts: &ContactDirectory,
        page: &mut Page,
    ) -> Result<Outcome, Error> {
        if !self.states.contains_key(section) {
            return Err(Error::UnknownSection { id: section.to_string() });
        }
        let url = self.config.section_url(section);
        let result = fetcher.fetch_text(&url, true).map(|raw| return prepare(raw, contacts));
        return Ok(self.settle(section, result, contacts, page));
    }

    /// Refresh the configured contact-bound sections plus any section that
    /// was rendered with tokens before the directory loaded.
    pub fn refresh_contact_bound<T: Transport>(
        &mut self,
        fetcher: &Fetcher<T>,
        contacts: &ContactDirectory,
        page: &mut Page,
    ) -> Vec<(String, Outcome)> {
        let targets: Vec<String> = self
            .config
            .sections
            .iter()
            .filter(|id| {
                let bound = self.config.contact_bound.contains(*id);
                let stale = self.states.get(*id).is_some_and(|s| return s.unresolved_tokens);
                return bound || stale;
            })
            .cloned()
            .collect();

        let mut outcomes = Vec::with_capacity(targets.len());
        for id in targets {
            if let Ok(outcome) = self.refresh(&id, fetcher, contacts, page) {
                outcomes.push((id, outcome));
            }
        }
        return outcomes;
    }

    /// Render a load result into its section and record the new state.
    fn settle(&mut self, section: &str, result: Loaded, contacts: &ContactDirectory, page: &mut Page) -> Outcome {
        let (raw, parsed) = match result {
            Ok(loaded) => loaded,
            Err(e) => return self.fail(section, e, page),
        };

        let blocks = parsed.document.len();
        let stamp = Local::now();
        let mut nodes = render_document(&parsed.document);
        nodes.push(footer(stamp));
        if let Err(e) = page.mount(section, nodes) {
            log!("error"; "{e}");
            self.states.entry(section.to_string()).or_default().error = Some(e.to_string());
            return Outcome::Failed(e);
        }
        page.attach_hooks();

        if section == self.config.dossier_section {
            self.dossiers = parsed.dossiers;
        }

        let state = self.states.entry(section.to_string()).or_default();
        state.unresolved_tokens = !contacts.is_loaded() && has_tokens(&raw);
        state.discards = parsed.discards;
        state.document = Some(parsed.document);
        state.error = None;
        state.last_loaded_at = Some(stamp);
        state.raw_text = Some(raw);
        state.rendered = true;

        log!("render"; "{section}: {blocks} blocks");
        return Outcome::Rendered { blocks };
    }

    fn fail(&mut self, section: &str, error: Error, page: &mut Page) -> Outcome {
        log!("error"; "{section}: {error}");
        let message = error.to_string();
        let mounted = page.mount(section, vec![error_banner(&message)]);
        if let Err(e) = &mounted {
            log!("error"; "{e}");
        } else {
            page.attach_hooks();
        }

        let state = self.states.entry(section.to_string()).or_default();
        state.error = Some(message);
        state.rendered = mounted.is_ok();
        return Outcome::Failed(error);
    }
}

/// Substitute contact tokens, then parse.
fn prepare(raw: String, contacts: &ContactDirectory) -> (String, Parsed) {
    let parsed = parse(&contacts.substitute(&raw));
    return (raw, parsed);
}
