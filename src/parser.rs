//! Line-oriented parser for the content dialect.
//!
//! One pass, top to bottom. Lines are trimmed before classification.
//! `@subskill:` regions are peeled off first and never reach the document;
//! everything else becomes a flat sequence of blocks.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::inline::{format_inline, split_outside_links};
use crate::types::{Block, DEFAULT_MAX_YEARS, Document, HeadingLevel, Panel, PanelItem, Skill, TableRow};

const SUBSKILL_OPEN: &str = "@subskill:";
const SUBSKILL_CLOSE: &str = "@endsubskill";
const CODE_FENCE: &str = "```";
const TABLE_OPEN: &str = "@table";
const PANEL_OPEN: &str = "@panel:";
const SKILL_OPEN: &str = "@skill:";
const BLOCK_CLOSE: &str = "@end";

static COLORED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$([a-z]+):(.*)").expect("valid regex"));
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Replace each run of whitespace with one underscore. Case is kept.
pub fn normalize(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s, "_").into_owned()
}

/// Side-table key for a dossier: `normalize(parent) + "_" + normalize(child)`.
pub fn dossier_key(parent: &str, child: &str) -> String {
    format!("{}_{}", normalize(parent), normalize(child))
}

/// Raw dossier bodies keyed by `dossier_key`. Bodies stay unparsed until a
/// tile is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DossierTable {
    entries: HashMap<String, String>,
}

impl DossierTable {
    /// Body recorded for `parent`/`child`, if any.
    pub fn get(&self, parent: &str, child: &str) -> Option<&str> {
        self.entries.get(&dossier_key(parent, child)).map(String::as_str)
    }

    /// Record a body. A later definition of the same key replaces the earlier one.
    pub fn insert(&mut self, parent: &str, child: &str, body: String) {
        self.entries.insert(dossier_key(parent, child), body);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Why a piece of source produced no node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardKind {
    /// `@skill:` line that does not fit `NAME:YEARS:COLOR[:MAX][@SUB...]`.
    RejectedSkill,
    /// Code fence without a closing fence.
    UnclosedCode,
    /// `@panel:` without `@end`.
    UnclosedPanel,
    /// `@table` without `@end`.
    UnclosedTable,
}

impl DiscardKind {
    /// Short human description used in diagnostics.
    pub const fn describe(self) -> &'static str {
        match self {
            Self::RejectedSkill => "malformed @skill line",
            Self::UnclosedCode => "unclosed code fence",
            Self::UnclosedPanel => "unclosed @panel",
            Self::UnclosedTable => "unclosed @table",
        }
    }
}

/// A discarded block and the one-based line that opened it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discard {
    pub kind: DiscardKind,
    pub line: u32,
}

/// Everything one parse produces.
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    /// Dropped blocks, in source order. Purely informational.
    pub discards: Vec<Discard>,
    /// Main document; dossier lines never appear here.
    pub document: Document,
    /// Dossier bodies found in the text.
    pub dossiers: DossierTable,
}

/// What the parser is inside of.
enum Mode {
    Code { lines: Vec<String>, opened: u32 },
    Flow,
    Panel { lines: Vec<String>, opened: u32, title: String },
    Table { opened: u32, rows: Vec<TableRow> },
}

/// An open `@subskill:` region.
struct Capture {
    body: String,
    child: String,
    parent: String,
}

/// Parse content text into a document plus the dossier side-table.
/// Total: any input yields a finite document and never panics.
pub fn parse(text: &str) -> Parsed {
    let mut blocks = Vec::new();
    let mut discards = Vec::new();
    let mut dossiers = DossierTable::default();
    let mut capture: Option<Capture> = None;
    let mut mode = Mode::Flow;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = u32::try_from(idx).unwrap_or(u32::MAX).saturating_add(1);
        let line = raw.trim();

        if let Some(header) = line.strip_prefix(SUBSKILL_OPEN) {
            close_capture(&mut capture, &mut dossiers);
            capture = open_capture(header);
            continue;
        }
        if line == SUBSKILL_CLOSE {
            close_capture(&mut capture, &mut dossiers);
            continue;
        }
        if let Some(open) = capture.as_mut() {
            open.body.push_str(line);
            open.body.push('\n');
            continue;
        }

        mode = step(mode, line, line_no, &mut blocks, &mut discards);
    }

    close_capture(&mut capture, &mut dossiers);
    match mode {
        Mode::Code { opened, .. } => discards.push(Discard { kind: DiscardKind::UnclosedCode, line: opened }),
        Mode::Panel { opened, .. } => discards.push(Discard { kind: DiscardKind::UnclosedPanel, line: opened }),
        Mode::Table { opened, .. } => discards.push(Discard { kind: DiscardKind::UnclosedTable, line: opened }),
        Mode::Flow => {},
    }

    Parsed { discards, document: Document { blocks }, dossiers }
}

/// Record the open dossier region, if any.
fn close_capture(capture: &mut Option<Capture>, dossiers: &mut DossierTable) {
    if let Some(done) = capture.take() {
        dossiers.insert(&done.parent, &done.child, done.body);
    }
}

/// Start a dossier region from `PARENT:CHILD`. A header missing either
/// name opens nothing.
fn open_capture(header: &str) -> Option<Capture> {
    let mut names = header.split(':');
    let parent = names.next()?.trim();
    let child = names.next()?.trim();
    if parent.is_empty() || child.is_empty() {
        return None;
    }
    Some(Capture { body: String::new(), child: child.to_string(), parent: parent.to_string() })
}

/// Feed one line to the current mode and return the next mode.
fn step(mode: Mode, line: &str, line_no: u32, blocks: &mut Vec<Block>, discards: &mut Vec<Discard>) -> Mode {
    match mode {
        Mode::Code { mut lines, opened } => {
            if line == CODE_FENCE {
                blocks.push(Block::CodeBlock(lines));
                return Mode::Flow;
            }
            lines.push(line.to_string());
            Mode::Code { lines, opened }
        },
        Mode::Table { opened, mut rows } => {
            if line == BLOCK_CLOSE {
                blocks.push(Block::Table(rows));
                return Mode::Flow;
            }
            rows.extend(parse_table_row(line));
            Mode::Table { opened, rows }
        },
        Mode::Panel { mut lines, opened, title } => {
            if line == BLOCK_CLOSE {
                blocks.push(Block::Panel(build_panel(title, &lines)));
                return Mode::Flow;
            }
            lines.push(line.to_string());
            Mode::Panel { lines, opened, title }
        },
        Mode::Flow => classify_flow_line(line, line_no, blocks, discards),
    }
}

/// Classify a line outside any block, in rule order.
fn classify_flow_line(line: &str, line_no: u32, blocks: &mut Vec<Block>, discards: &mut Vec<Discard>) -> Mode {
    if line == CODE_FENCE {
        return Mode::Code { lines: Vec::new(), opened: line_no };
    }
    if line == TABLE_OPEN {
        return Mode::Table { opened: line_no, rows: Vec::new() };
    }
    if let Some(title) = line.strip_prefix(PANEL_OPEN) {
        return Mode::Panel { lines: Vec::new(), opened: line_no, title: title.trim().to_string() };
    }

    let block = if let Some(payload) = line.strip_prefix(SKILL_OPEN) {
        let Some(skill) = parse_skill(payload) else {
            discards.push(Discard { kind: DiscardKind::RejectedSkill, line: line_no });
            return Mode::Flow;
        };
        Block::Skill(skill)
    } else if let Some(text) = line.strip_prefix("# ") {
        Block::Heading { level: HeadingLevel::One, text: text.to_string() }
    } else if let Some(text) = line.strip_prefix("## ") {
        Block::Heading { level: HeadingLevel::Two, text: text.to_string() }
    } else if line == "---" {
        Block::Divider
    } else if let Some(cap) = COLORED_LINE.captures(line) {
        Block::ColoredLine { color: cap[1].to_string(), text: cap[2].to_string() }
    } else if line.is_empty() {
        Block::Break
    } else {
        Block::Paragraph(format_inline(line))
    };

    blocks.push(block);
    Mode::Flow
}

/// `left|right`; cells past the second are dropped, lines without `|` ignored.
fn parse_table_row(line: &str) -> Option<TableRow> {
    let mut cells = line.split('|');
    let left = cells.next()?;
    let right = cells.next()?;
    Some(TableRow { left: format_inline(left.trim()), right: format_inline(right.trim()) })
}

/// First non-empty line describes the panel; the rest are items, split on
/// the first `:` outside a link.
fn build_panel(title: String, lines: &[String]) -> Panel {
    let mut body = lines.iter().map(String::as_str).filter(|l| !l.is_empty());
    let description = body.next().map(format_inline).unwrap_or_default();
    let items = body
        .map(|line| match split_outside_links(line, ':') {
            Some((key, value)) => PanelItem { key: Some(key.trim().to_string()), value: value.trim().to_string() },
            None => PanelItem { key: None, value: line.to_string() },
        })
        .collect();
    Panel { description, items, title }
}

/// Parse the payload after `@skill:`.
///
/// `NAME:YEARS:COLOR[:MAX][@SUB1@SUB2...]`. When the fourth segment holds
/// `@`, anything before the first `@` must be a leading number (the maximum)
/// and the rest are sub-skills. A fifth `@`-list segment is appended to the
/// sub-skills. Anything else is rejected.
pub fn parse_skill(payload: &str) -> Option<Skill> {
    let segments: Vec<&str> = payload.split(':').collect();
    let [name, years, color, rest @ ..] = segments.as_slice() else {
        return None;
    };

    let years = leading_number(years)?;
    let mut max_years = DEFAULT_MAX_YEARS;
    let mut subskills = Vec::new();

    if let Some(fourth) = rest.first() {
        if fourth.contains('@') {
            let mut pieces = fourth.split('@');
            let head = pieces.next().unwrap_or_default().trim();
            if !head.is_empty() {
                max_years = leading_number(head)?;
            }
            subskills.extend(subskill_names(pieces));
        } else if !fourth.trim().is_empty() {
            max_years = fourth.trim().parse().ok()?;
        }
    }

    if let Some(fifth) = rest.get(1)
        && fifth.contains('@')
    {
        subskills.extend(subskill_names(fifth.split('@')));
    }

    Some(Skill {
        color: color.trim().to_string(),
        max_years,
        name: name.trim().to_string(),
        subskills,
        years,
    })
}

fn subskill_names<'a>(pieces: impl Iterator<Item = &'a str>) -> impl Iterator<Item = String> {
    pieces.map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}

/// Digits at the start of `s` (after leading whitespace), like `parseInt`.
fn leading_number(s: &str) -> Option<u32> {
    let s = s.trim_start();
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.get(..end).filter(|d| !d.is_empty())?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Inline;

    fn blocks(text: &str) -> Vec<Block> {
        parse(text).document.blocks
    }

    #[test]
    fn heading_levels() {
        assert_eq!(
            blocks("# Hello\n"),
            vec![Block::Heading { level: HeadingLevel::One, text: "Hello".into() }]
        );
        assert_eq!(
            blocks("## Sub\n"),
            vec![Block::Heading { level: HeadingLevel::Two, text: "Sub".into() }]
        );
        assert_eq!(blocks("#nospace"), vec![Block::Paragraph(vec![Inline::Text("#nospace".into())])]);
    }

    #[test]
    fn skill_with_max_and_subskills() {
        assert_eq!(
            blocks("@skill:JavaScript:7:cyan:10@DOM@Node\n"),
            vec![Block::Skill(Skill {
                color: "cyan".into(),
                max_years: 10,
                name: "JavaScript".into(),
                subskills: vec!["DOM".into(), "Node".into()],
                years: 7,
            })]
        );
    }

    #[test]
    fn skill_segment_variants() {
        let plain = parse_skill("Rust:3:red").unwrap();
        assert_eq!((plain.max_years, plain.subskills.len()), (DEFAULT_MAX_YEARS, 0));

        let max_only = parse_skill("Rust:3:red:15").unwrap();
        assert_eq!(max_only.max_years, 15);

        let subs_only = parse_skill("Rust:3:red:@Tokio@Serde").unwrap();
        assert_eq!(subs_only.max_years, DEFAULT_MAX_YEARS);
        assert_eq!(subs_only.subskills, vec!["Tokio", "Serde"]);

        let legacy = parse_skill("Node:5:green:10:@Express@Koa").unwrap();
        assert_eq!(legacy.subskills, vec!["Express", "Koa"]);
    }

    #[test]
    fn skill_rejections_are_reported() {
        assert!(parse_skill("Rust:3").is_none());
        assert!(parse_skill("Rust:many:red").is_none());
        assert!(parse_skill("Rust:3:red:DOM@10@Node").is_none());
        assert!(parse_skill("Rust:3:red:lots").is_none());

        let parsed = parse("intro\n@skill:Rust:x:red\n");
        assert_eq!(parsed.document.len(), 1);
        assert_eq!(parsed.discards, vec![Discard { kind: DiscardKind::RejectedSkill, line: 2 }]);
    }

    #[test]
    fn panel_with_description_and_items() {
        assert_eq!(
            blocks("@panel:Proj\nA short description\nRole: Lead\nYear: 2021\n@end\n"),
            vec![Block::Panel(Panel {
                description: vec![Inline::Text("A short description".into())],
                items: vec![
                    PanelItem { key: Some("Role".into()), value: "Lead".into() },
                    PanelItem { key: Some("Year".into()), value: "2021".into() },
                ],
                title: "Proj".into(),
            })]
        );
    }

    #[test]
    fn panel_items_split_on_first_colon_only() {
        let parsed = blocks("@panel:P\n\nDesc\nLink: https://x.io\nno key here\n@end");
        let [Block::Panel(panel)] = parsed.as_slice() else {
            panic!("expected one panel, got {parsed:?}");
        };
        assert_eq!(panel.description, vec![Inline::Text("Desc".into())]);
        assert_eq!(panel.items[0], PanelItem { key: Some("Link".into()), value: "https://x.io".into() });
        assert_eq!(panel.items[1], PanelItem { key: None, value: "no key here".into() });
    }

    #[test]
    fn panel_item_that_is_only_a_link_has_no_key() {
        let parsed = blocks("@panel:P\nDesc\n[Click to reveal email](email:reveal)\n@end");
        let [Block::Panel(panel)] = parsed.as_slice() else {
            panic!("expected one panel, got {parsed:?}");
        };
        assert_eq!(panel.items, vec![PanelItem { key: None, value: "[Click to reveal email](email:reveal)".into() }]);
    }

    #[test]
    fn table_rows_keep_two_cells() {
        let parsed = blocks("@table\nEmail|{{x}}\nGitHub|[gh](https://github.com)|extra\nno pipe\n@end\n");
        let [Block::Table(rows)] = parsed.as_slice() else {
            panic!("expected one table, got {parsed:?}");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].left, vec![Inline::Text("GitHub".into())]);
        assert!(matches!(rows[1].right.as_slice(), [Inline::Link { external: true, .. }]));
    }

    #[test]
    fn code_block_is_verbatim() {
        assert_eq!(
            blocks("```\nline1\nline2\n```\n"),
            vec![Block::CodeBlock(vec!["line1".into(), "line2".into()])]
        );
        assert_eq!(
            blocks("```\n# not a heading\n@table\n\n```"),
            vec![Block::CodeBlock(vec!["# not a heading".into(), "@table".into(), String::new()])]
        );
    }

    #[test]
    fn unclosed_blocks_are_discarded() {
        for (text, kind) in [
            ("# Keep\n@panel:P\nDesc\n", DiscardKind::UnclosedPanel),
            ("# Keep\n@table\na|b\n", DiscardKind::UnclosedTable),
            ("# Keep\n```\ncode\n", DiscardKind::UnclosedCode),
        ] {
            let parsed = parse(text);
            assert_eq!(
                parsed.document.blocks,
                vec![Block::Heading { level: HeadingLevel::One, text: "Keep".into() }]
            );
            assert_eq!(parsed.discards, vec![Discard { kind, line: 2 }]);
        }
    }

    #[test]
    fn blocks_do_not_nest() {
        let parsed = blocks("@table\n@panel:X\na|b\n@end\n@end\n");
        assert_eq!(parsed.len(), 2);
        assert!(matches!(parsed[0], Block::Table(ref rows) if rows.len() == 1));
        assert_eq!(parsed[1], Block::Paragraph(vec![Inline::Text("@end".into())]));
    }

    #[test]
    fn divider_colored_break_paragraph() {
        assert_eq!(
            blocks("---\n$green:All good: yes\n\n**Hi** there"),
            vec![
                Block::Divider,
                Block::ColoredLine { color: "green".into(), text: "All good: yes".into() },
                Block::Break,
                Block::Paragraph(vec![Inline::Strong("Hi".into()), Inline::Text(" there".into())]),
            ]
        );
        assert!(matches!(blocks("$Green:x")[0], Block::Paragraph(_)));
    }

    #[test]
    fn crlf_lines_are_trimmed() {
        assert_eq!(
            blocks("  # Title  \r\n---\r\n"),
            vec![Block::Heading { level: HeadingLevel::One, text: "Title".into() }, Block::Divider]
        );
    }

    #[test]
    fn dossiers_are_separated_from_document() {
        let parsed = parse("@subskill:Node:Express\nUsed for APIs\n@endsubskill\n@skill:Node:5:green:10@Express\n");
        assert_eq!(parsed.document.len(), 1);
        assert!(matches!(parsed.document.blocks[0], Block::Skill(_)));
        assert_eq!(parsed.dossiers.get("Node", "Express"), Some("Used for APIs\n"));
        assert_eq!(parsed.dossiers.keys(), vec!["Node_Express"]);
    }

    #[test]
    fn dossier_regions_close_implicitly() {
        let parsed = parse("@subskill:Web Dev:React\n# Hooks\n@subskill:Web Dev:Vue\nOptions API\n");
        assert!(parsed.document.is_empty());
        assert_eq!(parsed.dossiers.get("Web Dev", "React"), Some("# Hooks\n"));
        assert_eq!(parsed.dossiers.get("Web  Dev", "Vue"), Some("Options API\n"));
        assert_eq!(parsed.dossiers.keys(), vec!["Web_Dev_React", "Web_Dev_Vue"]);
    }

    #[test]
    fn duplicate_dossier_last_write_wins() {
        let parsed = parse("@subskill:A:B\nfirst\n@endsubskill\n@subskill:A:B\nsecond\n@endsubskill\n");
        assert_eq!(parsed.dossiers.len(), 1);
        assert_eq!(parsed.dossiers.get("A", "B"), Some("second\n"));
    }

    #[test]
    fn dossier_capture_precedes_open_blocks() {
        let parsed = parse("```\ncode\n@subskill:A:B\nbody\n@endsubskill\n```\n");
        assert_eq!(parsed.document.blocks, vec![Block::CodeBlock(vec!["code".into()])]);
        assert_eq!(parsed.dossiers.get("A", "B"), Some("body\n"));
    }

    #[test]
    fn malformed_dossier_header_opens_nothing() {
        let parsed = parse("@subskill:OnlyParent\nvisible\n");
        assert!(parsed.dossiers.is_empty());
        assert_eq!(parsed.document.blocks, vec![Block::Paragraph(vec![Inline::Text("visible".into())])]);
    }

    #[test]
    fn parser_is_total_on_odd_input() {
        for text in ["", "\n\n\n", "@", "@end", "```", "@skill:", "@panel:", "|||", "\u{feff}# x", "$:", "@subskill:"] {
            let parsed = parse(text);
            assert!(parsed.document.len() <= text.lines().count().max(1));
        }
    }

    #[test]
    fn normalize_collapses_whitespace_runs() {
        assert_eq!(normalize("Machine   Learning\tOps"), "Machine_Learning_Ops");
        assert_eq!(dossier_key("Web Dev", "React Native"), "Web_Dev_React_Native");
    }
}
