//! Maps parsed blocks onto DOM subtrees.
//!
//! Class names here are the contract with the site stylesheet; changing one
//! breaks the look of the page, not the build.

use chrono::{DateTime, Local};
use markup5ever_rcdom::Handle;

use crate::contact::EMAIL_REVEAL_HREF;
use crate::dom::{El, HIDDEN_STYLE, text};
use crate::inline::format_links;
use crate::types::{Block, Document, HeadingLevel, Inline, Panel, Skill, TableRow};

/// Glyph for a filled meter cell.
pub const METER_FILLED: char = '█';
/// Glyph for an empty meter cell.
pub const METER_EMPTY: char = '▒';
/// Longest meter drawn. Larger years or maximums are cut to this many cells;
/// the label still shows the real count.
pub const MAX_METER_CELLS: u32 = 100;
/// Text of the well inside a tile that has not been opened yet.
pub const LOADING_TEXT: &str = "Loading...";

const TILE_COLORS: [&str; 2] = ["cyan", "green"];

/// Render a whole document into a flat list of top-level nodes.
pub fn render_document(document: &Document) -> Vec<Handle> {
    return document.blocks.iter().map(render_block).collect();
}

/// Render one block.
pub fn render_block(block: &Block) -> Handle {
    return match block {
        Block::Break => El::new("br").build(),
        Block::CodeBlock(lines) => {
            let body: String = lines.iter().map(|l| return format!("{l}\n")).collect();
            El::new("pre").class("white-255-text").text(&body).build()
        },
        Block::ColoredLine { color, text } => El::new("div")
            .class(&format!("{color}-168-text"))
            .children(render_inline(&format_links(text)))
            .build(),
        Block::Divider => El::new("div").class("tui-divider").build(),
        Block::Heading { level, text } => {
            let tag = match level {
                HeadingLevel::One => "h3",
                HeadingLevel::Two => "h4",
            };
            El::new(tag).class("cyan-168-text").children(render_inline(&format_links(text))).build()
        },
        Block::Panel(panel) => render_panel(panel),
        Block::Paragraph(fragments) => El::new("p").children(render_inline(fragments)).build(),
        Block::Skill(skill) => render_skill(skill),
        Block::Table(rows) => render_table(rows),
    };
}

/// Render inline fragments. Links pointing at the email reveal target become
/// reveal anchors.
pub fn render_inline(fragments: &[Inline]) -> Vec<Handle> {
    return fragments
        .iter()
        .map(|fragment| {
            return match fragment {
                Inline::Emphasis(t) => El::new("em").text(t).build(),
                Inline::Link { url, label, .. } if url == EMAIL_REVEAL_HREF => {
                    El::new("a").attr("href", "#").class("email-link").text(label).build()
                },
                Inline::Link { external: true, label, url } => El::new("a")
                    .attr("href", url)
                    .attr("target", "_blank")
                    .attr("rel", "noopener noreferrer")
                    .text(label)
                    .build(),
                Inline::Link { external: false, label, url } => El::new("a").attr("href", url).text(label).build(),
                Inline::Strong(t) => El::new("strong").text(t).build(),
                Inline::Text(t) => text(t),
            };
        })
        .collect();
}

fn render_table(rows: &[TableRow]) -> Handle {
    let body = rows.iter().map(|row| {
        return El::new("tr")
            .child(El::new("td").class("yellow-168-text").children(render_inline(&row.left)).build())
            .child(El::new("td").children(render_inline(&row.right)).build())
            .build();
    });
    return El::new("table")
        .class("tui-table contact-table")
        .child(El::new("tbody").children(body).build())
        .build();
}

fn render_panel(panel: &Panel) -> Handle {
    let mut content = El::new("div").class("tui-panel-content black-255-text");
    if !panel.description.is_empty() {
        content = content
            .child(El::new("p").children(render_inline(&panel.description)).build())
            .child(El::new("br").build());
    }
    for item in &panel.items {
        let line = match &item.key {
            Some(key) => El::new("div")
                .child(El::new("span").class("red-168-text").text(&format!("{key}:")).build())
                .text(" ")
                .children(render_inline(&format_links(&item.value))),
            None => El::new("div").children(render_inline(&format_links(&item.value))),
        };
        content = content.child(line.build());
    }

    let header = El::new("div")
        .class("tui-panel-header")
        .child(El::new("span").class("tui-panel-title blue-255-text").text(&panel.title).build());
    return El::new("div")
        .class("project-card tui-panel white-168")
        .child(header.build())
        .child(content.build())
        .build();
}

/// The `[████▒▒]` meter text: `years` filled cells, then the remainder of
/// `max_years` as empty cells. A skill past its maximum shows no empty cells.
/// Both counts are clamped to `MAX_METER_CELLS`.
pub fn meter(years: u32, max_years: u32) -> (String, String) {
    let filled_cells = years.min(MAX_METER_CELLS);
    let empty_cells = max_years.min(MAX_METER_CELLS).saturating_sub(filled_cells);
    let filled = std::iter::repeat_n(METER_FILLED, filled_cells as usize).collect();
    let empty = std::iter::repeat_n(METER_EMPTY, empty_cells as usize).collect();
    return (filled, empty);
}

/// Render a skill meter, plus its tile listing when it has sub-skills.
pub fn render_skill(skill: &Skill) -> Handle {
    let (filled, empty) = meter(skill.years, skill.max_years);
    let bar = El::new("span")
        .class(&format!("skill-year-bar {}-168-text", skill.color))
        .text(&format!("[{filled}"))
        .child(El::new("span").class("white-168-text").text(&empty).build())
        .text("]")
        .build();
    let label = El::new("span")
        .class("skill-year-label cyan-168-text")
        .text(&format!("{} Years", skill.years))
        .build();

    let info = El::new("div")
        .class("skill-info")
        .child(El::new("div").class("yellow-168-text skill-name").text(&skill.name).build())
        .child(
            El::new("div")
                .class("skill-year-container")
                .child(El::new("div").class("skill-meter").child(bar).child(label).build())
                .build(),
        )
        .build();

    let mut skill_bar = El::new("div").class("skill-bar").child(info);
    if !skill.subskills.is_empty() {
        skill_bar = skill_bar.child(render_tiles(&skill.name, &skill.subskills));
    }
    return skill_bar.build();
}

/// DOS-style directory listing, one tile per sub-skill.
fn render_tiles(skill_name: &str, subskills: &[String]) -> Handle {
    let heading = El::new("div")
        .class("white-168-text")
        .text(&format!("Directory of C:\\{}", volume_name(skill_name)))
        .build();

    let tiles = subskills.iter().enumerate().map(|(i, sub)| {
        let color = TILE_COLORS[i % TILE_COLORS.len()];
        let sub = sub.trim();
        let file = file_name(sub);
        let id = skill_id(skill_name, &file);

        let well = El::new("div")
            .class("subskill-content")
            .attr("id", &format!("subskill-content-{id}"))
            .attr("style", HIDDEN_STYLE)
            .child(El::new("div").class("subskill-loading").text(LOADING_TEXT).build())
            .build();

        return El::new("div")
            .class("skill-file")
            .attr("data-skill-id", &id)
            .attr("data-skill-name", skill_name)
            .attr("data-subskill-name", sub)
            .child(El::new("span").class(&format!("{color}-168-text skill-file-icon")).text("■").build())
            .child(El::new("span").class(&format!("{color}-168-text skill-file-name")).text(&file).build())
            .child(well)
            .build();
    });

    let list = El::new("div").class("skill-files-list").child(heading).children(tiles).build();
    return El::new("div").class("skill-files").child(list).build();
}

/// Uppercased skill name with whitespace runs as `_` and anything else
/// outside `[A-Z0-9_]` dropped.
pub fn volume_name(skill_name: &str) -> String {
    return crate::parser::normalize(&skill_name.to_uppercase())
        .chars()
        .filter(|c| return c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '_')
        .collect();
}

/// DOS file name for a tile: uppercased, anything outside `[A-Z0-9]` as `_`.
pub fn file_name(subskill: &str) -> String {
    return subskill
        .trim()
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_uppercase() || c.is_ascii_digit() { c } else { '_' })
        .collect();
}

/// Stable id for a tile, used for its well's element id.
pub fn skill_id(skill_name: &str, file_name: &str) -> String {
    return format!("{}_{file_name}", crate::parser::normalize(skill_name))
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
}

/// `Last updated: <local time>` trailer appended under every section.
pub fn footer(stamp: DateTime<Local>) -> Handle {
    return El::new("div")
        .class("content-footer")
        .text(&format!("Last updated: {}", stamp.format("%Y-%m-%d %H:%M:%S")))
        .build();
}

/// Banner shown in place of a section that failed to load.
pub fn error_banner(message: &str) -> Handle {
    return El::new("div").class("error").text(&format!("Failed to load content: {message}")).build();
}

/// Content well body for a resolved dossier.
pub fn dossier_body(document: &Document) -> Handle {
    return El::new("div")
        .class("subskill-content-inner white-168-text")
        .children(render_document(document))
        .build();
}

/// Content well body when no dossier exists for `parent`/`child`.
pub fn dossier_placeholder(parent: &str, child: &str) -> Handle {
    return El::new("div")
        .class("subskill-content-inner")
        .child(El::new("p").class("cyan-168-text").text(child).build())
        .child(
            El::new("p")
                .class("white-168-text")
                .text(&format!("Detailed information about {child} within {parent}."))
                .build(),
        )
        .child(
            El::new("p")
                .class("yellow-168-text")
                .text(&format!("Add content using the @subskill:{parent}:{child} format in skills.txt"))
                .build(),
        )
        .build();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{by_class, outer_html, text_content};
    use crate::parser::parse;

    fn html(source: &str) -> String {
        return render_document(&parse(source).document).iter().map(outer_html).collect();
    }

    #[test]
    fn heading_renders_as_h3() {
        assert_eq!(html("# Hello\n"), r#"<h3 class="cyan-168-text">Hello</h3>"#);
        assert_eq!(html("## Sub"), r#"<h4 class="cyan-168-text">Sub</h4>"#);
    }

    #[test]
    fn code_block_keeps_one_newline_per_line() {
        assert_eq!(html("```\nline1\nline2\n```\n"), "<pre class=\"white-255-text\">line1\nline2\n</pre>");
    }

    #[test]
    fn meter_counts_cells() {
        let node = render_document(&parse("@skill:JavaScript:7:cyan:10@DOM@Node\n").document).remove(0);
        let bar = by_class(&node, "skill-year-bar").remove(0);
        assert_eq!(text_content(&bar), "[███████▒▒▒]");
        assert!(crate::dom::has_class(&bar, "cyan-168-text"));
        let label = by_class(&node, "skill-year-label").remove(0);
        assert_eq!(text_content(&label), "7 Years");
        assert_eq!(meter(12, 10), ("█".repeat(12), String::new()));
    }

    #[test]
    fn huge_years_are_clamped() {
        let node = render_document(&parse("@skill:Rust:4000000000:red\n").document).remove(0);
        let bar = by_class(&node, "skill-year-bar").remove(0);
        assert_eq!(text_content(&bar), format!("[{}]", "█".repeat(100)));
        let label = by_class(&node, "skill-year-label").remove(0);
        assert_eq!(text_content(&label), "4000000000 Years");

        assert_eq!(meter(5, u32::MAX), ("█".repeat(5), "▒".repeat(95)));
    }

    #[test]
    fn tiles_carry_data_attributes_and_hidden_well() {
        let node = render_skill(&Skill {
            color: "green".into(),
            max_years: 10,
            name: "Web Dev".into(),
            subskills: vec!["React Native".into(), "C#".into()],
            years: 5,
        });
        let tiles = by_class(&node, "skill-file");
        assert_eq!(tiles.len(), 2);
        assert_eq!(crate::dom::attr(&tiles[0], "data-skill-id").as_deref(), Some("Web_Dev_REACT_NATIVE"));
        assert_eq!(crate::dom::attr(&tiles[0], "data-skill-name").as_deref(), Some("Web Dev"));
        assert_eq!(crate::dom::attr(&tiles[0], "data-subskill-name").as_deref(), Some("React Native"));
        assert_eq!(crate::dom::attr(&tiles[1], "data-skill-id").as_deref(), Some("Web_Dev_C_"));

        let wells = by_class(&node, "subskill-content");
        assert!(wells.iter().all(crate::dom::is_hidden));
        assert_eq!(crate::dom::attr(&wells[0], "id").as_deref(), Some("subskill-content-Web_Dev_REACT_NATIVE"));

        let listing = by_class(&node, "skill-files-list").remove(0);
        assert!(text_content(&listing).starts_with("Directory of C:\\WEB_DEV"));
        assert!(crate::dom::has_class(&by_class(&tiles[1], "skill-file-icon")[0], "green-168-text"));
    }

    #[test]
    fn skill_without_subskills_has_no_listing() {
        let node = render_document(&parse("@skill:Go:2:blue").document).remove(0);
        assert!(by_class(&node, "skill-files").is_empty());
    }

    #[test]
    fn panel_markup() {
        assert_eq!(
            html("@panel:Proj\nA short description\nRole: Lead\nfreeform\n@end\n"),
            concat!(
                r#"<div class="project-card tui-panel white-168">"#,
                r#"<div class="tui-panel-header"><span class="tui-panel-title blue-255-text">Proj</span></div>"#,
                r#"<div class="tui-panel-content black-255-text"><p>A short description</p><br>"#,
                r#"<div><span class="red-168-text">Role:</span> Lead</div><div>freeform</div></div></div>"#,
            )
        );
    }

    #[test]
    fn table_markup() {
        assert_eq!(
            html("@table\nSite|[me](https://me.dev)\n@end"),
            concat!(
                r#"<table class="tui-table contact-table"><tbody><tr><td class="yellow-168-text">Site</td>"#,
                r#"<td><a href="https://me.dev" target="_blank" rel="noopener noreferrer">me</a></td>"#,
                r#"</tr></tbody></table>"#,
            )
        );
    }

    #[test]
    fn email_reveal_link_becomes_anchor() {
        assert_eq!(
            html("Reach me at [Click to reveal email](email:reveal)"),
            r##"<p>Reach me at <a href="#" class="email-link">Click to reveal email</a></p>"##
        );
    }

    #[test]
    fn links_render_in_every_text_block() {
        assert_eq!(
            html("## Mail [Click to reveal email](email:reveal)"),
            r##"<h4 class="cyan-168-text">Mail <a href="#" class="email-link">Click to reveal email</a></h4>"##
        );
        assert_eq!(
            html("$green:Mail: [Click to reveal email](email:reveal)"),
            r##"<div class="green-168-text">Mail: <a href="#" class="email-link">Click to reveal email</a></div>"##
        );
        let panel = html("@panel:Contact\nReach out\nEmail: [Click to reveal email](email:reveal)\nCode: [gh](https://github.com/wm)\n@end");
        assert!(panel.contains(
            r##"<div><span class="red-168-text">Email:</span> <a href="#" class="email-link">Click to reveal email</a></div>"##
        ));
        assert!(panel.contains(r#"<a href="https://github.com/wm" target="_blank" rel="noopener noreferrer">gh</a>"#));
    }

    #[test]
    fn headings_keep_emphasis_markers_literal() {
        assert_eq!(html("# *Hello*"), r#"<h3 class="cyan-168-text">*Hello*</h3>"#);
    }

    #[test]
    fn small_blocks() {
        assert_eq!(
            html("---\n$red:Alert\n\n*a* **b**"),
            concat!(
                r#"<div class="tui-divider"></div><div class="red-168-text">Alert</div><br>"#,
                r#"<p><em>a</em> <strong>b</strong></p>"#,
            )
        );
    }

    #[test]
    fn names_for_tiles() {
        assert_eq!(volume_name("Machine Learning & AI"), "MACHINE_LEARNING__AI");
        assert_eq!(file_name(" node.js "), "NODE_JS");
        assert_eq!(skill_id("C++ Dev", "STL"), "C___Dev_STL");
    }

    #[test]
    fn placeholder_names_the_pair() {
        let node = dossier_placeholder("Node", "Koa");
        assert_eq!(
            text_content(&node),
            "KoaDetailed information about Koa within Node.Add content using the @subskill:Node:Koa format in skills.txt"
        );
    }
}
