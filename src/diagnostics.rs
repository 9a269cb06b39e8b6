use std::fmt::Write as _;

use crate::config::CONFIG_FILE;
use crate::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where the author
/// can do something about it, how to fix it.
pub fn render_error(e: &Error) -> String {
    match e {
        Error::Fetch { cause, status, url } => render_fetch(url, *status, cause.as_deref()),
        Error::MissingContainer { section } => render_missing_container(section),
        Error::UnknownSection { id } => render_unknown_section(id),
        Error::TomlDe(inner) => render_bad_config(&inner.to_string()),
        _ => render_generic(e),
    }
}

fn render_generic(e: &Error) -> String {
    match e {
        Error::NotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.

## Fix

Pass the site directory with `--root`:

    folio --root path/to/site render
", path.display()),

        Error::ClipboardUnavailable => "\
# Error: Clipboard Unavailable

Neither the clipboard nor the selection fallback could copy the text.
"
        .to_string(),

        Error::Watch { reason } => format!("\
# Error: Watch Failed

{reason}
"),

        Error::Io(inner) => format!("\
# Error: I/O

{inner}
"),

        Error::Json(inner) => format!("\
# Error: JSON

{inner}
"),

        _ => format!("# Error\n\n{e}\n"),
    }
}

fn render_fetch(url: &str, status: Option<u16>, cause: Option<&str>) -> String {
    let mut out = format!("\
# Error: Fetch Failed

Could not load `{url}`.
");
    if let Some(code) = status {
        let _ = write!(out, "\nStatus: {code}\n");
    }
    if let Some(why) = cause {
        let _ = write!(out, "\nCause: {why}\n");
    }

    let fix = match status {
        Some(404) => "Create the file, or point the section elsewhere in `folio.toml`:\n\n    [files]\n    <section> = \"<file stem>\"\n",
        Some(403) => "Resource paths may not leave the site root.\n",
        _ if cause.is_some() => "Check the file's contents; JSON resources must be a single object.\n",
        _ => "Check that the site root is readable.\n",
    };
    let _ = write!(out, "\n## Fix\n\n{fix}");
    out
}

fn render_missing_container(section: &str) -> String {
    format!(
        "\
# Error: Missing Section Container

The shell has no `.section-content` element for section `{section}`.

## Fix

Add the container to the shell:

    <div id=\"{section}\" class=\"tui-tab-content\">
      <div class=\"section-content\"></div>
    </div>

Or delete the shell file to use the scaffolded layout.
"
    )
}

fn render_unknown_section(id: &str) -> String {
    format!(
        "\
# Error: Unknown Section

Section `{id}` is not configured.

## Fix

Add it to `{CONFIG_FILE}`:

    sections = [\"about\", \"skills\", \"projects\", \"contact\", \"{id}\"]
"
    )
}

fn render_bad_config(reason: &str) -> String {
    format!(
        "\
# Error: Invalid Config

`{CONFIG_FILE}` could not be read:

{reason}

## Fix

Valid keys are `content_dir`, `contact_file`, `shell`, `sections`,
`contact_bound`, `dossier_section`, `subskill_dir`, and the `[files]` table.
"
    )
}
