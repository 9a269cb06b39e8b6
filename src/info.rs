use std::path::Path;

use serde::Serialize;

use crate::config::{CONFIG_FILE, Config};
use crate::contact::ContactRecord;
use crate::error::Error;

/// Output the markup dialect reference and the state of the site at `root`.
///
/// # Errors
///
/// Returns `Error::Json` if the JSON report cannot be serialized.
pub fn run(root: &Path, json: bool) -> Result<(), Error> {
    let state = gather_state(root);

    if json {
        return print_json(&state);
    }
    print_markdown(&state);
    return Ok(());
}

// ── State gathering ───────────────────────────────────────────────────

struct CurrentState {
    /// Why `folio.toml` could not be loaded; defaults are shown instead.
    config_error: Option<String>,
    config_found: bool,
    contact_links: Option<Vec<String>>,
    contact_file: String,
    sections: Vec<SectionFile>,
    shell: String,
    shell_found: bool,
}

struct SectionFile {
    exists: bool,
    id: String,
    path: String,
}

fn gather_state(root: &Path) -> CurrentState {
    let config_found = root.join(CONFIG_FILE).exists();
    let (config, config_error) = match Config::load(root) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e.to_string())),
    };

    let sections = config
        .sections
        .iter()
        .map(|id| {
            let path = config.section_url(id);
            SectionFile { exists: root.join(&path).is_file(), id: id.clone(), path }
        })
        .collect();

    let contact_links = std::fs::read_to_string(root.join(&config.contact_file))
        .ok()
        .and_then(|text| serde_json::from_str::<ContactRecord>(&text).ok())
        .map(|record| record.links.into_keys().collect());

    CurrentState {
        config_error,
        config_found,
        contact_links,
        contact_file: config.contact_file.clone(),
        sections,
        shell_found: root.join(&config.shell).is_file(),
        shell: config.shell,
    }
}

// ── Markdown output ───────────────────────────────────────────────────

fn print_markdown(state: &CurrentState) {
    let version = env!("CARGO_PKG_VERSION");
    print_markdown_header(version);
    print_markdown_state(state);
    println!();
    print_markdown_exit_codes();
}

fn print_markdown_header(version: &str) {
    print!(
        "\
# folio {version}

Content pipeline for a terminal-themed portfolio: plain-text sections in a
small markup dialect, joined with a contact directory, rendered to HTML.

## Block Syntax

    # Title / ## Subtitle                 h3 / h4 heading
    ```  ...  ```                         preformatted block
    $green:text                           coloured line
    ---                                   divider
    @table  Key | Value  @end             two-column table
    @panel:Title  description  key: value  @end
    @skill:NAME:YEARS:COLOR[:MAX][@SUB1@SUB2]
    @subskill:PARENT:CHILD  body  @endsubskill

## Inline Syntax

    **bold** / __bold__  *italic* / _italic_  [label](url)

## Contact Tokens

    {{{{email}}}}                             reveal-on-click email link
    {{{{link:NAME}}}}                         URL from the contact file

## Commands

    folio render [--out FILE]             Render every section to one HTML file
    folio check                           Report discarded blocks and unknown links
    folio reveal <PARENT> <CHILD>         Print one sub-skill dossier
    folio watch [--out FILE]              Re-render when content changes

## Configuration ({CONFIG_FILE})

    content_dir = \"content\"
    contact_file = \"contact-info.json\"
    shell = \"index.html\"                  # scaffolded when missing
    sections = [\"about\", \"skills\", \"projects\", \"contact\"]
    contact_bound = [\"contact\"]           # re-rendered once contacts load
    dossier_section = \"skills\"
    subskill_dir = \"content/subskills\"

    [files]
    projects = \"experience\"               # section id -> file stem

## Current State

"
    );
}

fn print_markdown_state(state: &CurrentState) {
    if let Some(reason) = &state.config_error {
        println!("Config:   {CONFIG_FILE} (invalid, showing defaults: {reason})");
    } else if state.config_found {
        println!("Config:   {CONFIG_FILE} (found)");
    } else {
        println!("Config:   {CONFIG_FILE} (not found, using defaults)");
    }

    if state.shell_found {
        println!("Shell:    {} (found)", state.shell);
    } else {
        println!("Shell:    {} (not found, scaffolded)", state.shell);
    }

    match &state.contact_links {
        Some(links) if links.is_empty() => println!("Contacts: {} (no links)", state.contact_file),
        Some(links) => println!("Contacts: {} ({})", state.contact_file, links.join(", ")),
        None => println!("Contacts: {} (not loadable)", state.contact_file),
    }

    println!("Sections:");
    for section in &state.sections {
        let mark = if section.exists { "" } else { " (missing)" };
        println!("  {} -> {}{mark}", section.id, section.path);
    }
}

fn print_markdown_exit_codes() {
    print!(
        "\
## Exit Codes

| Code | Meaning |
|------|---------|
| 0    | Success / content clean |
| 1    | A section failed to render, or check found problems |
| 2    | Runtime error |
"
    );
}

// ── JSON output ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct InfoJson {
    version: String,
    block_directives: Vec<String>,
    exit_codes: Vec<ExitCodeInfo>,
    current_state: StateJson,
}

#[derive(Serialize)]
struct ExitCodeInfo {
    code: u8,
    meaning: String,
}

#[derive(Serialize)]
struct StateJson {
    config_error: Option<String>,
    config_found: bool,
    contact_file: String,
    contact_links: Option<Vec<String>>,
    sections: Vec<SectionJson>,
    shell: String,
    shell_found: bool,
}

#[derive(Serialize)]
struct SectionJson {
    exists: bool,
    id: String,
    path: String,
}

fn print_json(state: &CurrentState) -> Result<(), Error> {
    let info = InfoJson {
        version: env!("CARGO_PKG_VERSION").to_string(),
        block_directives: ["#", "##", "```", "$color:", "---", "@table", "@panel:", "@skill:", "@subskill:", "@end"]
            .map(String::from)
            .to_vec(),
        exit_codes: vec![
            ExitCodeInfo { code: 0, meaning: "Success / content clean".to_string() },
            ExitCodeInfo { code: 1, meaning: "A section failed to render, or check found problems".to_string() },
            ExitCodeInfo { code: 2, meaning: "Runtime error".to_string() },
        ],
        current_state: StateJson {
            config_error: state.config_error.clone(),
            config_found: state.config_found,
            contact_file: state.contact_file.clone(),
            contact_links: state.contact_links.clone(),
            sections: state
                .sections
                .iter()
                .map(|s| SectionJson { exists: s.exists, id: s.id.clone(), path: s.path.clone() })
                .collect(),
            shell: state.shell.clone(),
            shell_found: state.shell_found,
        },
    };

    let json = serde_json::to_string_pretty(&info)?;
    println!("{json}");
    return Ok(());
}
