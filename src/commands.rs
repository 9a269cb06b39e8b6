use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use walkdir::WalkDir;

use crate::config::Config;
use crate::contact::{ContactDirectory, UNRESOLVED_LINK, link_tokens};
use crate::dom::outer_html;
use crate::error::Error;
use crate::fetcher::{DirTransport, Fetcher};
use crate::log;
use crate::parser::parse;
use crate::revealer::DossierSource;
use crate::site::Site;

/// Open the site at `root` and run the full boot sequence.
///
/// # Errors
///
/// Returns errors from config loading or shell parsing.
pub fn boot(root: &Path) -> Result<Site<DirTransport>, Error> {
    let mut site = Site::open(root)?;
    let outcomes = site.boot();
    let rendered = outcomes.iter().filter(|(_, o)| o.is_rendered()).count();
    log!("render"; "{rendered}/{} sections rendered", outcomes.len());
    return Ok(site);
}

/// Write the page to `out`, or stdout when `None`.
///
/// # Errors
///
/// Returns `Error::Io` if the output file cannot be written.
pub fn write_page(site: &Site<DirTransport>, out: Option<&Path>) -> Result<(), Error> {
    let html = site.page().to_html();
    match out {
        Some(path) => std::fs::write(path, html)?,
        None => println!("{html}"),
    }
    return Ok(());
}

/// Render every section and emit the final document.
/// Exits 1 when any section shows an error banner.
///
/// # Errors
///
/// Returns errors from booting the site or writing the output.
pub fn render(root: &Path, out: Option<&Path>) -> Result<ExitCode, Error> {
    let site = boot(root)?;
    write_page(&site, out)?;

    let failed = site.controller().failed_sections();
    if failed.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    for section in &failed {
        let reason = site
            .controller()
            .state(section)
            .and_then(|s| s.error.clone())
            .unwrap_or_default();
        log!("error"; "{section}: {reason}");
    }
    return Ok(ExitCode::from(1));
}

/// Lint every content file: discarded blocks, rejected skill lines, and
/// link tokens the contact file cannot resolve.
///
/// # Errors
///
/// Returns errors from config loading or reading a content file.
pub fn check(root: &Path) -> Result<ExitCode, Error> {
    let config = Config::load(root)?;
    let fetcher = Fetcher::new(DirTransport::new(root));
    let mut contacts = ContactDirectory::new();
    contacts.load(&fetcher, &config.contact_file);

    let content_root = root.join(&config.content_dir);
    if !content_root.is_dir() {
        return Err(Error::NotFound { path: content_root });
    }

    let mut files: Vec<_> = WalkDir::new(&content_root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| return e.path().extension().is_some_and(|ext| return ext == "txt"))
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();

    let mut problems = 0usize;
    for path in &files {
        let text = std::fs::read_to_string(path)?;
        let shown = path.strip_prefix(root).unwrap_or(path).display();

        for discard in parse(&text).discards {
            problems += 1;
            println!("DISCARD     {shown}:{} ({})", discard.line, discard.kind.describe());
        }
        for (line, name) in link_tokens(&text) {
            if contacts.link(&name) == UNRESOLVED_LINK {
                problems += 1;
                println!("UNRESOLVED  {shown}:{line} (link `{name}`)");
            }
        }
    }

    let total = files.len();
    if problems == 0 {
        println!("All {total} content files clean");
        return Ok(ExitCode::SUCCESS);
    }
    println!();
    println!("{problems} problems in {total} files");
    return Ok(ExitCode::from(1));
}

/// Open the dossier for `parent`/`child` and print its rendered body.
/// Exits 1 when only the placeholder could be shown.
///
/// # Errors
///
/// Returns errors from booting the site.
pub fn reveal(root: &Path, parent: &str, child: &str) -> Result<ExitCode, Error> {
    let mut site = boot(root)?;
    if site.tile(parent, child).is_none() {
        log!("reveal"; "no tile for {parent}/{child} on the page");
    }
    let (body, source) = site.reveal(parent, child, Instant::now())?;
    log!("reveal"; "{parent}/{child} from {source:?}");
    println!("{}", outer_html(&body));

    if source == DossierSource::Placeholder {
        return Ok(ExitCode::from(1));
    }
    return Ok(ExitCode::SUCCESS);
}

/// Output the dialect reference and current site state.
///
/// # Errors
///
/// Returns `Error::Json` if the JSON report cannot be serialized.
pub fn info(root: &Path, json: bool) -> Result<(), Error> {
    return crate::info::run(root, json);
}

