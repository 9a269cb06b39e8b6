//! The live page: shell DOM, event hooks, pending timers, and clipboard.
//!
//! Everything interactive on the page goes through here. Hooks are rebuilt
//! from the DOM after every render, since a render replaces whole subtrees
//! and any handle into the old subtree is dead weight.

use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use markup5ever_rcdom::{Handle, RcDom};

use crate::contact::{ContactDirectory, EMAIL_UNAVAILABLE, UNRESOLVED_LINK};
use crate::dom::{
    El, append, attr, by_class, by_id, closest, descendants, detach, find_all, find_first, has_class, parse_html,
    replace_children, set_attr, tag_name, text, text_content,
};
use crate::error::Error;
use crate::log;

/// How long a copy acknowledgment stays on screen.
pub const COPIED_ACK: Duration = Duration::from_secs(3);

const EMPTY_SHELL: &str = "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>folio</title></head><body></body></html>";

/// Destination for copied text. Hosts without one fall back to a DOM selection.
pub trait Clipboard {
    /// # Errors
    ///
    /// Returns `Error::ClipboardUnavailable` when the platform refuses the write.
    fn write_text(&mut self, text: &str) -> Result<(), Error>;
}

/// The three places an email anchor can live. Each reveals and acknowledges
/// differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailStyle {
    /// `.email-link` inside rendered content.
    Inline,
    /// `.sidemenu-email` in the shell's side menu.
    SideMenu,
    /// `.email-link` inside the shell's `.tui-statusbar`.
    StatusBar,
}

/// Handler bound to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Email(EmailStyle),
    Tile,
}

/// What an email activation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailAction {
    /// Address copied and acknowledged.
    Copied,
    /// Address swapped into the anchor.
    Revealed,
    /// No address to show; the sentinel was displayed instead.
    Unavailable,
}

#[derive(Debug, Clone)]
enum TimerAction {
    ClearIndicator(Handle),
    ResetSideMenu(Handle),
}

#[derive(Debug, Clone)]
struct Timer {
    action: TimerAction,
    due: Instant,
}

/// Shell document plus everything bound to it.
pub struct Page {
    clipboard: Option<Box<dyn Clipboard>>,
    dom: RcDom,
    hooks: Vec<(Handle, Hook)>,
    selection: Option<String>,
    timers: Vec<Timer>,
}

impl Page {
    /// Wrap an already-parsed document.
    pub fn from_dom(dom: RcDom) -> Self {
        return Self { clipboard: None, dom, hooks: Vec::new(), selection: None, timers: Vec::new() };
    }

    /// Parse a shell from HTML text.
    pub fn parse(html: &str) -> Self {
        return Self::from_dom(parse_html(html));
    }

    /// A bare shell with one `<div id=.. class="tui-tab-content">` holding a
    /// `<div class="section-content">` per section id.
    pub fn scaffold<S: AsRef<str>>(sections: &[S]) -> Self {
        let page = Self::parse(EMPTY_SHELL);
        if let Some(body) = page.body() {
            for id in sections {
                let section = El::new("div")
                    .attr("id", id.as_ref())
                    .class("tui-tab-content")
                    .child(El::new("div").class("section-content").build())
                    .build();
                append(&body, section);
            }
        }
        return page;
    }

    /// Read the shell at `path`, or scaffold one when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the shell exists but cannot be read.
    pub fn open<S: AsRef<str>>(path: &Path, sections: &[S]) -> Result<Self, Error> {
        return match std::fs::read_to_string(path) {
            Ok(html) => Ok(Self::parse(&html)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log!("page"; "no shell at {}, scaffolding one", path.display());
                Ok(Self::scaffold(sections))
            },
            Err(e) => Err(Error::Io(e)),
        };
    }

    /// Install a clipboard.
    #[must_use]
    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        return self;
    }

    /// Root document node.
    pub const fn document(&self) -> &Handle {
        return &self.dom.document;
    }

    pub fn body(&self) -> Option<Handle> {
        return find_first(&self.dom.document, |n| return tag_name(n) == Some("body"));
    }

    /// The `.section-content` element inside the section with this id.
    pub fn section_content(&self, section: &str) -> Option<Handle> {
        let container = by_id(&self.dom.document, section)?;
        return by_class(&container, "section-content").into_iter().next();
    }

    /// Replace the contents of a section in one step. Nothing is observable
    /// between the old children leaving and the new ones arriving.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingContainer` if the shell has no container for it.
    pub fn mount(&self, section: &str, nodes: Vec<Handle>) -> Result<(), Error> {
        let container = self
            .section_content(section)
            .ok_or_else(|| return Error::MissingContainer { section: section.to_string() })?;
        replace_children(&container, nodes);
        return Ok(());
    }

    /// Rebind handlers to every email anchor and sub-skill tile currently in
    /// the document, dropping bindings to nodes that were replaced.
    /// Returns the number of bound elements.
    pub fn attach_hooks(&mut self) -> usize {
        self.hooks = descendants(&self.dom.document)
            .into_iter()
            .filter_map(|node| return classify_hook(&node).map(|hook| return (node, hook)))
            .collect();
        return self.hooks.len();
    }

    /// Bound elements, in document order.
    pub fn hooks(&self) -> &[(Handle, Hook)] {
        return &self.hooks;
    }

    /// The nearest bound element at or above `target`.
    pub fn hook_for(&self, target: &Handle) -> Option<(Handle, Hook)> {
        let node = closest(target, |n| return self.hooks.iter().any(|(h, _)| return Rc::ptr_eq(h, n)))?;
        return self.hooks.iter().find(|(h, _)| return Rc::ptr_eq(h, &node)).cloned();
    }

    /// First activation shows the address; later activations copy it and
    /// show a transient acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns `Error::ClipboardUnavailable` when neither the clipboard nor
    /// the selection fallback could take the text.
    pub fn activate_email(
        &mut self,
        link: &Handle,
        style: EmailStyle,
        email: Option<&str>,
        now: Instant,
    ) -> Result<EmailAction, Error> {
        let Some(email) = email else {
            replace_children(link, vec![text(EMAIL_UNAVAILABLE)]);
            return Ok(EmailAction::Unavailable);
        };

        if !text_content(link).contains(email) {
            reveal(link, style, email);
            return Ok(EmailAction::Revealed);
        }

        for stale in by_class(link, "copied-indicator") {
            detach(&stale);
        }
        self.copy_text(email)?;

        match style {
            EmailStyle::Inline => {
                append(link, copied_indicator());
                self.schedule(now, TimerAction::ClearIndicator(link.clone()));
            },
            EmailStyle::StatusBar => {
                let mut children = status_prefix(link);
                children.push(text(email));
                children.push(copied_indicator());
                replace_children(link, children);
                self.schedule(now, TimerAction::ClearIndicator(link.clone()));
            },
            EmailStyle::SideMenu => {
                replace_children(link, vec![
                    red_span("E"),
                    text("mail "),
                    red_span("(Copied!)"),
                ]);
                self.schedule(now, TimerAction::ResetSideMenu(link.clone()));
            },
        }
        return Ok(EmailAction::Copied);
    }

    /// Copy through the clipboard, or through a temporary off-screen
    /// `<textarea>` selection when there is no clipboard or it refuses.
    ///
    /// # Errors
    ///
    /// Returns `Error::ClipboardUnavailable` if the fallback has no `<body>`.
    pub fn copy_text(&mut self, content: &str) -> Result<(), Error> {
        if let Some(clipboard) = self.clipboard.as_mut() {
            match clipboard.write_text(content) {
                Ok(()) => return Ok(()),
                Err(e) => log!("page"; "{e}, falling back to selection"),
            }
        }

        let body = self.body().ok_or(Error::ClipboardUnavailable)?;
        let area = El::new("textarea")
            .attr("style", "position: absolute; left: -9999px;")
            .text(content)
            .build();
        append(&body, area.clone());
        self.selection = Some(text_content(&area));
        detach(&area);
        return Ok(());
    }

    /// Text left selected by the last fallback copy.
    pub fn selection(&self) -> Option<&str> {
        return self.selection.as_deref();
    }

    /// Run every timer due at or before `now`. Returns how many fired.
    pub fn advance(&mut self, now: Instant) -> usize {
        let (due, pending): (Vec<Timer>, Vec<Timer>) = std::mem::take(&mut self.timers)
            .into_iter()
            .partition(|t| return t.due <= now);
        self.timers = pending;

        for timer in &due {
            match &timer.action {
                TimerAction::ClearIndicator(link) => {
                    for indicator in by_class(link, "copied-indicator") {
                        detach(&indicator);
                    }
                },
                TimerAction::ResetSideMenu(link) => replace_children(link, vec![red_span("E"), text("mail")]),
            }
        }
        return due.len();
    }

    /// Timers not yet fired.
    pub fn pending_timers(&self) -> usize {
        return self.timers.len();
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        return crate::dom::inner_html(&self.dom.document);
    }

    /// Point shell anchors tagged `data-link-type="NAME"` at the directory's
    /// URL for `NAME`. Unresolved names keep their markup. Returns how many
    /// anchors were updated.
    pub fn apply_link_types(&self, contacts: &ContactDirectory) -> usize {
        let mut updated = 0;
        for anchor in find_all(&self.dom.document, |n| return attr(n, "data-link-type").is_some()) {
            let Some(name) = attr(&anchor, "data-link-type") else { continue };
            let url = contacts.link(&name);
            if url == UNRESOLVED_LINK {
                continue;
            }
            set_attr(&anchor, "href", url);
            if url.starts_with("http") || url.starts_with("//") {
                set_attr(&anchor, "target", "_blank");
                set_attr(&anchor, "rel", "noopener noreferrer");
            }
            updated += 1;
        }
        return updated;
    }

    fn schedule(&mut self, now: Instant, action: TimerAction) {
        self.timers.push(Timer { action, due: now + COPIED_ACK });
    }
}

fn classify_hook(node: &Handle) -> Option<Hook> {
    if has_class(node, "sidemenu-email") {
        return Some(Hook::Email(EmailStyle::SideMenu));
    }
    if has_class(node, "email-link") {
        let in_statusbar = closest(node, |n| return has_class(n, "tui-statusbar")).is_some();
        let style = if in_statusbar { EmailStyle::StatusBar } else { EmailStyle::Inline };
        return Some(Hook::Email(style));
    }
    if has_class(node, "skill-file") {
        return Some(Hook::Tile);
    }
    return None;
}

/// Swap the address into an anchor for the first time.
fn reveal(link: &Handle, style: EmailStyle, email: &str) {
    match style {
        EmailStyle::Inline => {
            let span = find_first(link, |n| return tag_name(n) == Some("span"));
            let children = match span {
                Some(span) => {
                    let class = attr(&span, "class").unwrap_or_default();
                    let label = text_content(&span);
                    vec![El::new("span").class(&class).text(&label).build(), text(&format!(" {email}"))]
                },
                None => vec![text(email)],
            };
            replace_children(link, children);
        },
        EmailStyle::StatusBar => {
            let mut children = status_prefix(link);
            children.push(text(email));
            replace_children(link, children);
        },
        EmailStyle::SideMenu => replace_children(link, vec![red_span("E"), text(&format!("mail: {email}"))]),
    }
}

/// The key-hint span a status-bar anchor keeps in front of the address.
fn status_prefix(link: &Handle) -> Vec<Handle> {
    let Some(hint) = find_first(link, |n| return tag_name(n) == Some("span") && has_class(n, "red-168-text")) else {
        return Vec::new();
    };
    return vec![red_span(&text_content(&hint)), text(" ")];
}

fn red_span(content: &str) -> Handle {
    return El::new("span").class("red-168-text").text(content).build();
}

fn copied_indicator() -> Handle {
    return El::new("span").class("copied-indicator red-168-text").text(" (Copied!)").build();
}
