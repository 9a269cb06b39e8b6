//! Core document model: block nodes, inline fragments, skills, and panels.

/// Scale used for the skill meter when a `@skill:` line names no maximum.
pub const DEFAULT_MAX_YEARS: u32 = 10;

/// One fragment of inline-formatted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// `*x*` or `_x_`.
    Emphasis(String),
    /// `[label](url)`. External links open in a new window without a referrer.
    Link {
        /// True when the URL starts with `http://`, `https://`, or `//`.
        external: bool,
        /// Visible link text.
        label: String,
        /// Link target as written in the source.
        url: String,
    },
    /// `**x**` or `__x__`.
    Strong(String),
    /// Unformatted text.
    Text(String),
}

/// `# ` headings render one level down from the page title, `## ` two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    /// `# TEXT`
    One,
    /// `## TEXT`
    Two,
}

/// A `@skill:` line: a years-of-experience meter plus optional sub-skill tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    /// Stylesheet color token for the filled part of the meter.
    pub color: String,
    /// Meter scale; `DEFAULT_MAX_YEARS` unless the line gives one.
    pub max_years: u32,
    /// Display name, also the dossier parent.
    pub name: String,
    /// Sub-skill names in source order; each becomes a tile.
    pub subskills: Vec<String>,
    /// Filled cells of the meter.
    pub years: u32,
}

/// One `key: value` (or bare value) line inside a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelItem {
    /// Text before the first `:`, absent for value-only lines.
    pub key: Option<String>,
    /// Text after the first `:`, or the whole line.
    pub value: String,
}

/// A `@panel:TITLE ... @end` card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    /// First non-empty line of the body, inline-formatted.
    pub description: Vec<Inline>,
    /// Remaining non-empty lines.
    pub items: Vec<PanelItem>,
    /// Text after `@panel:`.
    pub title: String,
}

/// One `left|right` row of a `@table` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// First cell, inline-formatted.
    pub left: Vec<Inline>,
    /// Second cell, inline-formatted. Further cells are dropped.
    pub right: Vec<Inline>,
}

/// Parser output unit. The set is closed; the renderer matches it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Blank line outside any block.
    Break,
    /// Lines between two ``` fences, verbatim.
    CodeBlock(Vec<String>),
    /// `$color:text`.
    ColoredLine {
        /// Lowercase stylesheet color token.
        color: String,
        /// Everything after the first `:`.
        text: String,
    },
    /// `---`.
    Divider,
    /// `# text` or `## text`.
    Heading {
        /// Which marker opened the heading.
        level: HeadingLevel,
        /// Text after the marker.
        text: String,
    },
    /// `@panel:` card.
    Panel(Panel),
    /// Any other non-empty line.
    Paragraph(Vec<Inline>),
    /// `@skill:` meter.
    Skill(Skill),
    /// `@table` block.
    Table(Vec<TableRow>),
}

/// Ordered block sequence produced by one parse. Never mutated after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Blocks in source order.
    pub blocks: Vec<Block>,
}

impl Document {
    /// True when the parse produced no blocks at all.
    pub fn is_empty(&self) -> bool {
        return self.blocks.is_empty();
    }

    /// Number of top-level blocks.
    pub fn len(&self) -> usize {
        return self.blocks.len();
    }
}
