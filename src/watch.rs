//! File watcher: renders on startup, then re-renders on content changes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::commands;
use crate::config::{CONFIG_FILE, Config};
use crate::diagnostics;
use crate::error::Error;
use crate::log;

/// Debounce delay between filesystem events and re-render.
const DEBOUNCE_MS: u64 = 100;

/// What a batch of filesystem changes calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Nothing the page depends on eagerly.
    Ignore,
    /// Config, shell, or contact file changed: start over.
    Rebuild,
    /// Re-fetch these sections, in config order.
    Sections(Vec<String>),
}

/// Classify changed paths, given relative to the site root.
/// Dossier fallback files are read on reveal, so they need no action.
pub fn plan(changed: &[PathBuf], config: &Config) -> Change {
    let rebuild_on = [CONFIG_FILE, config.shell.as_str(), config.contact_file.as_str()];
    if changed.iter().any(|p| return rebuild_on.iter().any(|r| return p == Path::new(r))) {
        return Change::Rebuild;
    }

    let content_dir = Path::new(config.content_dir.trim_end_matches('/'));
    let stems: BTreeSet<&str> = changed
        .iter()
        .filter(|p| return p.parent() == Some(content_dir))
        .filter(|p| return p.extension().is_some_and(|ext| return ext == "txt"))
        .filter_map(|p| return p.file_stem().and_then(|s| return s.to_str()))
        .collect();

    let sections: Vec<String> = config
        .sections
        .iter()
        .filter(|id| return stems.contains(config.file_stem(id)))
        .cloned()
        .collect();

    if sections.is_empty() {
        return Change::Ignore;
    }
    return Change::Sections(sections);
}

/// Create a filesystem watcher that sends changed paths on the given channel.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<PathBuf>,
) -> Result<notify::RecommendedWatcher, Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            )
        {
            for path in event.paths {
                let _ = tx.send(path);
            }
        }
    })
    .map_err(|e| {
        return Error::Watch { reason: format!("watcher setup failed: {e}") };
    });
}

/// Entry point for the watch command.
///
/// Renders once, then watches the site root and re-renders on changes.
///
/// # Errors
///
/// Returns errors from the initial render or watcher setup.
pub fn run(root: &Path, out: Option<&Path>) -> Result<ExitCode, Error> {
    if !root.is_dir() {
        return Err(Error::NotFound { path: root.to_path_buf() });
    }
    let root = std::fs::canonicalize(root)?;

    log!("watch"; "initial render");
    let mut site = commands::boot(&root)?;
    commands::write_page(&site, out)?;

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx)?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| return Error::Watch { reason: format!("cannot watch {}: {e}", root.display()) })?;

    log!("watch"; "monitoring {}, press Ctrl+C to stop", root.display());

    let out_abs = out.and_then(|p| return std::fs::canonicalize(p).ok());
    while let Ok(first) = rx.recv() {
        let mut changed = vec![first];
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while let Ok(path) = rx.recv_timeout(debounce) {
            changed.push(path);
        }

        let relative: Vec<PathBuf> = changed
            .iter()
            .filter(|p| return out_abs.as_ref() != Some(*p))
            .filter_map(|p| return p.strip_prefix(&root).ok().map(Path::to_path_buf))
            .collect();

        match plan(&relative, site.controller().config()) {
            Change::Ignore => continue,
            Change::Rebuild => {
                log!("watch"; "site files changed, rebuilding");
                match commands::boot(&root) {
                    Ok(fresh) => site = fresh,
                    Err(e) => {
                        diagnostics::print_error(&e);
                        continue;
                    },
                }
            },
            Change::Sections(sections) => {
                log!("watch"; "refreshing {}", sections.join(", "));
                for section in &sections {
                    if let Err(e) = site.refresh(section) {
                        diagnostics::print_error(&e);
                    }
                }
            },
        }

        if let Err(e) = commands::write_page(&site, out) {
            diagnostics::print_error(&e);
        }
    }

    return Ok(ExitCode::SUCCESS);
}
