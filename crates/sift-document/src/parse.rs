//! The structural Markdown parser.
//!
//! Walks the pulldown-cmark event stream in document order, maintaining a
//! stack of open heading sections. Headings become [`Section`] nodes linked
//! by id; paragraphs, lists, code blocks, quotes and tables become
//! [`ContentBlock`]s attached to the nearest preceding heading (or to a
//! lazily created synthetic body root when they precede every heading).
//! Alongside the tree the parser accumulates the per-field text projections
//! that the storage layer indexes.
//!
//! Start/End events are tracked with a frame stack rather than by matching
//! end-tag payloads, so nesting depth is always exact: only the outermost
//! open block produces a content block, and everything inside it flows into
//! that block's text.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

use crate::{
    FieldKind,
    section::{BlockKind, ContentBlock, Outline, Section, Span},
};

/// Options controlling the structural parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Whether fenced/indented code blocks contribute content blocks and
    /// body projection text.
    pub include_code_blocks: bool,
}

/// Per-field text projections of one document.
///
/// Heading projections are the heading texts of that level, newline-joined
/// in document order. The first h1 feeds `title` instead of `h1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projections {
    /// Document title: the first h1.
    pub title: String,
    /// h1..h6 projections, indexed by level - 1.
    pub headings: [String; 6],
    /// Block texts, newline-joined in document order.
    pub body: String,
}

impl Projections {
    /// The projection text for a field.
    pub fn field(&self, kind: FieldKind) -> &str {
        match kind {
            FieldKind::Title => &self.title,
            FieldKind::Body => &self.body,
            heading => {
                let level = heading.level().unwrap_or(1);
                &self.headings[usize::from(level) - 1]
            }
        }
    }
}

/// Result of a structural parse.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    /// Per-field projections.
    pub projections: Projections,
    /// Section forest and flat index.
    pub outline: Outline,
}

impl ParsedDocument {
    /// The document title (first h1), empty if the document has none.
    pub fn title(&self) -> &str {
        &self.projections.title
    }
}

/// What a Start event pushed; popped by the matching End event.
enum Frame {
    /// A heading whose text is being captured.
    Heading,
    /// The outermost open block.
    Block,
    /// Anything nested inside an open heading or block, or ignorable.
    Other,
}

/// Parser state while walking the event stream.
struct Walker {
    options: ParseOptions,
    frames: Vec<Frame>,
    /// Open heading capture: (level, start offset, text).
    heading: Option<(u8, usize, String)>,
    /// Open outermost block capture: (kind, start offset, text).
    block: Option<(BlockKind, usize, String)>,
    /// Stack of open heading section ids.
    stack: Vec<String>,
    /// Most recently created heading section id.
    current: Option<String>,
    /// Synthetic body root id, created lazily.
    body_root: Option<String>,
    next_section: usize,
    projections: Projections,
    outline: Outline,
}

/// Parses Markdown text into its section forest and field projections.
pub fn parse_markdown(source: &str, options: ParseOptions) -> ParsedDocument {
    let mut walker = Walker {
        options,
        frames: Vec::new(),
        heading: None,
        block: None,
        stack: Vec::new(),
        current: None,
        body_root: None,
        next_section: 0,
        projections: Projections::default(),
        outline: Outline::default(),
    };

    let parser = Parser::new_ext(source, Options::ENABLE_TABLES);
    for (event, range) in parser.into_offset_iter() {
        walker.on_event(event, range.start, range.end);
    }

    ParsedDocument {
        projections: walker.projections,
        outline: walker.outline,
    }
}

impl Walker {
    fn on_event(&mut self, event: Event<'_>, start: usize, end: usize) {
        match event {
            Event::Start(tag) => self.on_start(&tag, start),
            Event::End(_) => self.on_end(end),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => self.push_text(&code),
            Event::SoftBreak | Event::HardBreak => self.push_break(),
            // Raw HTML, rules and footnote markers carry no indexable text.
            _ => {}
        }
    }

    fn on_start(&mut self, tag: &Tag<'_>, start: usize) {
        if self.heading.is_none() && self.block.is_none() {
            if let Tag::Heading { level, .. } = tag {
                self.frames.push(Frame::Heading);
                self.heading = Some((heading_depth(*level), start, String::new()));
                return;
            }
            if let Some(kind) = block_kind(tag) {
                self.frames.push(Frame::Block);
                self.block = Some((kind, start, String::new()));
                return;
            }
        } else if let Some(sep) = nested_separator(tag)
            && let Some((_, _, text)) = self.block.as_mut()
            && !text.is_empty()
            && !text.ends_with(sep)
        {
            text.push(sep);
        }
        self.frames.push(Frame::Other);
    }

    fn on_end(&mut self, end: usize) {
        match self.frames.pop() {
            Some(Frame::Heading) => self.finish_heading(end),
            Some(Frame::Block) => self.finish_block(end),
            Some(Frame::Other) | None => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some((_, _, buffer)) = self.heading.as_mut() {
            buffer.push_str(text);
        } else if let Some((_, _, buffer)) = self.block.as_mut() {
            buffer.push_str(text);
        }
    }

    fn push_break(&mut self) {
        if let Some((_, _, buffer)) = self.heading.as_mut() {
            buffer.push(' ');
        } else if let Some((_, _, buffer)) = self.block.as_mut() {
            buffer.push('\n');
        }
    }

    fn next_id(&mut self) -> String {
        let id = format!("s{}", self.next_section);
        self.next_section += 1;
        id
    }

    /// Closes the open heading: links the new section into the tree and
    /// appends its text to the level projection.
    fn finish_heading(&mut self, end: usize) {
        let Some((depth, start, text)) = self.heading.take() else {
            return;
        };
        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }

        while let Some(top) = self.stack.last() {
            let open = self
                .outline
                .sections
                .get(top)
                .is_some_and(|s| s.depth >= depth);
            if open {
                self.stack.pop();
            } else {
                break;
            }
        }

        let id = self.next_id();
        let parent_id = self.stack.last().cloned();
        match &parent_id {
            Some(pid) => {
                if let Some(parent) = self.outline.sections.get_mut(pid) {
                    parent.children_ids.push(id.clone());
                }
            }
            None => self.outline.structure.push(id.clone()),
        }

        let section = Section {
            id: id.clone(),
            kind: FieldKind::heading(depth),
            depth,
            text: text.clone(),
            position: Span::new(start, end),
            parent_id,
            children_ids: Vec::new(),
            content: Vec::new(),
        };
        self.outline.sections.insert(id.clone(), section);
        self.stack.push(id.clone());
        self.current = Some(id);

        if depth == 1 && self.projections.title.is_empty() {
            self.projections.title = text;
        } else {
            append_line(
                &mut self.projections.headings[usize::from(depth) - 1],
                &text,
            );
        }
    }

    /// Closes the outermost open block: attaches it to the owning section
    /// and appends its text to the body projection.
    fn finish_block(&mut self, end: usize) {
        let Some((kind, start, text)) = self.block.take() else {
            return;
        };
        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }
        if matches!(kind, BlockKind::Code { .. }) && !self.options.include_code_blocks {
            return;
        }

        let owner = match &self.current {
            Some(id) => id.clone(),
            None => self.ensure_body_root(),
        };

        if let Some(section) = self.outline.sections.get_mut(&owner) {
            section.content.push(ContentBlock {
                kind,
                text: text.clone(),
                position: Span::new(start, end),
            });
            if section.depth == 0 {
                section.position.end = end;
            }
        }

        append_line(&mut self.projections.body, &text);
    }

    /// Creates the synthetic body root on first use.
    fn ensure_body_root(&mut self) -> String {
        if let Some(id) = &self.body_root {
            return id.clone();
        }
        let id = self.next_id();
        let root = Section {
            id: id.clone(),
            kind: FieldKind::Body,
            depth: 0,
            text: String::new(),
            position: Span::new(0, 0),
            parent_id: None,
            children_ids: Vec::new(),
            content: Vec::new(),
        };
        self.outline.sections.insert(id.clone(), root);
        self.outline.structure.insert(0, id.clone());
        self.body_root = Some(id.clone());
        id
    }
}

/// Appends a line to a newline-joined projection.
fn append_line(projection: &mut String, text: &str) {
    if !projection.is_empty() {
        projection.push('\n');
    }
    projection.push_str(text);
}

/// Numeric depth of a pulldown heading level.
fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// The content-block kind for a block-level tag, `None` for anything else.
fn block_kind(tag: &Tag<'_>) -> Option<BlockKind> {
    match tag {
        Tag::Paragraph => Some(BlockKind::Paragraph),
        Tag::List(_) => Some(BlockKind::List),
        Tag::BlockQuote(_) => Some(BlockKind::Quote),
        Tag::Table(_) => Some(BlockKind::Table),
        Tag::CodeBlock(kind) => {
            let language = match kind {
                CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                _ => None,
            };
            Some(BlockKind::Code { language })
        }
        _ => None,
    }
}

/// Separator inserted before a container nested in an open block.
fn nested_separator(tag: &Tag<'_>) -> Option<char> {
    match tag {
        Tag::Item
        | Tag::Paragraph
        | Tag::CodeBlock(_)
        | Tag::BlockQuote(_)
        | Tag::TableHead
        | Tag::TableRow => Some('\n'),
        Tag::TableCell => Some(' '),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParsedDocument {
        parse_markdown(source, ParseOptions::default())
    }

    #[test]
    fn builds_sibling_and_child_links() {
        let doc = parse("# A\n\n## B\n\n### C\n\n### D\n\n## E\n");
        let outline = &doc.outline;

        assert_eq!(outline.structure, vec!["s0"]);
        let a = outline.section("s0").unwrap();
        assert_eq!(a.text, "A");
        assert_eq!(a.children_ids, vec!["s1", "s4"]);

        let b = outline.section("s1").unwrap();
        assert_eq!(b.text, "B");
        assert_eq!(b.children_ids, vec!["s2", "s3"]);
        assert_eq!(b.parent_id.as_deref(), Some("s0"));

        let c = outline.section("s2").unwrap();
        assert_eq!(c.text, "C");
        assert_eq!(c.kind, FieldKind::H3);
        assert!(c.children_ids.is_empty());

        let e = outline.section("s4").unwrap();
        assert_eq!(e.text, "E");
        assert_eq!(e.parent_id.as_deref(), Some("s0"));
    }

    #[test]
    fn first_h1_is_title_only() {
        let doc = parse("# First\n\n# Second\n\n# Third\n");
        assert_eq!(doc.title(), "First");
        assert_eq!(doc.projections.headings[0], "Second\nThird");
    }

    #[test]
    fn heading_projections_are_newline_joined() {
        let doc = parse("## One\n\n### Deep\n\n## Two\n");
        assert_eq!(doc.projections.headings[1], "One\nTwo");
        assert_eq!(doc.projections.headings[2], "Deep");
        assert_eq!(doc.projections.field(FieldKind::H2), "One\nTwo");
    }

    #[test]
    fn content_attaches_to_nearest_heading() {
        let doc = parse("# A\n\nalpha text.\n\n## B\n\nbeta text.\n\nmore beta.\n");
        let outline = &doc.outline;

        let a = outline.find_heading(FieldKind::H1, "A").unwrap();
        assert_eq!(a.content.len(), 1);
        assert_eq!(a.content[0].text, "alpha text.");

        let b = outline.find_heading(FieldKind::H2, "B").unwrap();
        assert_eq!(b.content.len(), 2);
        assert_eq!(b.content[1].text, "more beta.");
    }

    #[test]
    fn preamble_creates_body_root() {
        let doc = parse("intro paragraph.\n\n# A\n\ncontent.\n");
        let outline = &doc.outline;

        let root = outline.first_root().unwrap();
        assert_eq!(root.kind, FieldKind::Body);
        assert_eq!(root.depth, 0);
        assert_eq!(root.text, "");
        assert_eq!(root.content.len(), 1);
        assert_eq!(root.content[0].text, "intro paragraph.");

        // Heading content still goes to the heading.
        let a = outline.find_heading(FieldKind::H1, "A").unwrap();
        assert_eq!(a.content[0].text, "content.");
        // The body root sits at the head of structure.
        assert_eq!(outline.structure[0], root.id);
    }

    #[test]
    fn no_body_root_without_preamble() {
        let doc = parse("# A\n\ntext\n");
        assert!(
            doc.outline
                .sections
                .values()
                .all(|s| s.kind != FieldKind::Body)
        );
    }

    #[test]
    fn empty_heading_is_ignored() {
        let doc = parse("#\n\ntext under nothing\n\n## Real\n");
        let outline = &doc.outline;
        // Only the real heading and the body root for the orphan paragraph.
        assert!(outline.find_heading(FieldKind::H2, "Real").is_some());
        assert!(outline.sections.values().all(|s| s.text != "#"));
    }

    #[test]
    fn inline_formatting_is_stripped() {
        let doc = parse("# **Bold** and `code` title\n");
        assert_eq!(doc.title(), "Bold and code title");
    }

    #[test]
    fn image_alt_text_is_preserved() {
        let doc = parse("## Logo ![alt text](img.png) end\n");
        let h = doc.outline.in_document_order()[0];
        assert_eq!(h.text, "Logo alt text end");
    }

    #[test]
    fn heading_positions_cover_heading_syntax() {
        let source = "intro.\n\n# Alpha\n\nbody.\n";
        let doc = parse(source);
        let a = doc.outline.find_heading(FieldKind::H1, "Alpha").unwrap();
        assert_eq!(&source[a.position.start..a.position.start + 7], "# Alpha");
    }

    #[test]
    fn content_blocks_follow_their_heading() {
        // I5: every content block starts at or after the heading's end.
        let source = "# A\n\npara one.\n\n- item 1\n- item 2\n\n## B\n\nafter.\n";
        let doc = parse(source);
        for section in doc.outline.sections.values() {
            for block in &section.content {
                assert!(block.position.start >= section.position.end);
            }
        }
    }

    #[test]
    fn list_becomes_single_block() {
        let doc = parse("# A\n\n- one\n- two\n- three\n");
        let a = doc.outline.find_heading(FieldKind::H1, "A").unwrap();
        assert_eq!(a.content.len(), 1);
        assert_eq!(a.content[0].kind, BlockKind::List);
        assert_eq!(a.content[0].text, "one\ntwo\nthree");
    }

    #[test]
    fn code_blocks_skipped_by_default() {
        let source = "# A\n\n```rust\nfn main() {}\n```\n\nprose.\n";
        let doc = parse(source);
        let a = doc.outline.find_heading(FieldKind::H1, "A").unwrap();
        assert_eq!(a.content.len(), 1);
        assert_eq!(a.content[0].text, "prose.");
        assert!(!doc.projections.body.contains("fn main"));
    }

    #[test]
    fn code_blocks_included_on_request() {
        let source = "# A\n\n```rust\nfn main() {}\n```\n";
        let doc = parse_markdown(
            source,
            ParseOptions {
                include_code_blocks: true,
            },
        );
        let a = doc.outline.find_heading(FieldKind::H1, "A").unwrap();
        assert_eq!(a.content.len(), 1);
        assert_eq!(
            a.content[0].kind,
            BlockKind::Code {
                language: Some("rust".into())
            }
        );
        assert!(doc.projections.body.contains("fn main"));
    }

    #[test]
    fn body_projection_joins_blocks() {
        let doc = parse("first.\n\n# A\n\nsecond.\n");
        assert_eq!(doc.projections.body, "first.\nsecond.");
    }

    #[test]
    fn quoted_heading_does_not_become_section() {
        let doc = parse("> # Quoted\n> text\n\n# Real\n");
        assert!(doc.outline.find_heading(FieldKind::H1, "Quoted").is_none());
        // The quote itself is content under the body root.
        let root = doc.outline.first_root().unwrap();
        assert_eq!(root.kind, FieldKind::Body);
        assert!(root.content.iter().any(|b| b.kind == BlockKind::Quote));
    }

    #[test]
    fn tree_integrity_holds() {
        // P3: ids resolve, parent links are acyclic, depth increases.
        let source = "pre.\n\n# A\n\n## B\n\n#### Deep\n\n## C\n\n# D\n\n### E\n";
        let doc = parse(source);
        let outline = &doc.outline;

        for section in outline.sections.values() {
            if let Some(parent_id) = &section.parent_id {
                let parent = outline.section(parent_id).expect("parent resolves");
                assert!(parent.depth < section.depth);
                assert!(parent.children_ids.contains(&section.id));
            }
            for child_id in &section.children_ids {
                assert!(outline.section(child_id).is_some());
            }
            // Walking up terminates (acyclic).
            assert!(outline.ancestors(&section.id).len() < outline.len());
        }
        for root_id in &outline.structure {
            assert!(outline.section(root_id).is_some());
        }
    }

    #[test]
    fn empty_document() {
        let doc = parse("");
        assert!(doc.outline.is_empty());
        assert_eq!(doc.title(), "");
        assert!(doc.projections.body.is_empty());
    }

    #[test]
    fn skipping_levels_links_to_nearest_shallower() {
        let doc = parse("# A\n\n#### Deep\n\n## B\n");
        let deep = doc.outline.find_heading(FieldKind::H4, "Deep").unwrap();
        assert_eq!(deep.parent_id.as_deref(), Some("s0"));
        let b = doc.outline.find_heading(FieldKind::H2, "B").unwrap();
        assert_eq!(b.parent_id.as_deref(), Some("s0"));
    }
}
