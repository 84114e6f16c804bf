//! Snippet navigation.
//!
//! Snippets are plain data; traversal resolves against the stored document
//! through an explicit [`StructureSource`] and caches the loaded record on
//! the snippet, so repeated calls on one snippet hit storage once.

use serde::Serialize;

use sift_document::{BlockKind, ContentBlock, Section, SectionSummary};

use crate::{
    IndexError,
    record::DocumentRecord,
    snippet::Snippet,
    store::StructureSource,
};

/// Options for range-mode extended text.
#[derive(Debug, Clone, Copy)]
pub struct ExtendOptions {
    /// Number of bytes to return.
    pub length: usize,
    /// Signed offset from the snippet position.
    pub offset: i64,
}

impl Default for ExtendOptions {
    fn default() -> Self {
        Self {
            length: 5000,
            offset: 0,
        }
    }
}

/// A section with resolved parent and children summaries.
#[derive(Debug, Clone, Serialize)]
pub struct SectionDetails {
    /// The section itself.
    #[serde(flatten)]
    pub section: Section,
    /// Summary of the parent section.
    pub parent: Option<SectionSummary>,
    /// Summaries of the children in order.
    pub children: Vec<SectionSummary>,
    /// Number of content blocks.
    pub content_count: usize,
}

/// Builds the detail view of a section within its document.
pub fn section_details(record: &DocumentRecord, section: &Section) -> SectionDetails {
    let parent = section
        .parent_id
        .as_deref()
        .and_then(|id| record.outline.section(id))
        .map(Section::summary);
    let children = section
        .children_ids
        .iter()
        .filter_map(|id| record.outline.section(id))
        .map(Section::summary)
        .collect();

    SectionDetails {
        section: section.clone(),
        parent,
        children,
        content_count: section.content.len(),
    }
}

impl Snippet {
    /// The backing record, loaded on first use and cached on the snippet.
    fn load<'a>(
        &'a self,
        source: &dyn StructureSource,
    ) -> Result<Option<&'a DocumentRecord>, IndexError> {
        if self.document.get().is_none() {
            let loaded = source.load_document(&self.document_path)?;
            let _ = self.document.set(loaded);
        }
        Ok(self
            .document
            .get()
            .and_then(|slot| slot.as_ref())
            .map(AsRef::as_ref))
    }

    /// The snippet's own section, if attributed and resolvable.
    fn own_section<'a>(
        &self,
        record: &'a DocumentRecord,
    ) -> Option<&'a Section> {
        self.section_id
            .as_deref()
            .and_then(|id| record.outline.section(id))
    }

    /// True if the owning section has a parent.
    pub fn has_parent(&self) -> bool {
        self.parent_id.is_some()
    }

    /// True if the owning section has children.
    pub fn has_children(&self) -> bool {
        !self.children_ids.is_empty()
    }

    /// True if the owning section has content blocks.
    pub fn has_content(&self) -> bool {
        self.content_count > 0
    }

    /// The parent section, or `None` at a root.
    pub fn parent(&self, source: &dyn StructureSource) -> Result<Option<Section>, IndexError> {
        let Some(record) = self.load(source)? else {
            return Ok(None);
        };
        Ok(self
            .parent_id
            .as_deref()
            .and_then(|id| record.outline.section(id))
            .cloned())
    }

    /// The child sections in document order.
    pub fn children(&self, source: &dyn StructureSource) -> Result<Vec<Section>, IndexError> {
        let Some(record) = self.load(source)? else {
            return Ok(Vec::new());
        };
        Ok(self
            .children_ids
            .iter()
            .filter_map(|id| record.outline.section(id))
            .cloned()
            .collect())
    }

    /// The i-th child section.
    pub fn child(
        &self,
        source: &dyn StructureSource,
        index: usize,
    ) -> Result<Option<Section>, IndexError> {
        Ok(self.children(source)?.into_iter().nth(index))
    }

    /// The owning section's content blocks.
    pub fn content(&self, source: &dyn StructureSource) -> Result<Vec<ContentBlock>, IndexError> {
        let Some(record) = self.load(source)? else {
            return Ok(Vec::new());
        };
        Ok(self
            .own_section(record)
            .map(|s| s.content.clone())
            .unwrap_or_default())
    }

    /// The full owning section with resolved parent and children summaries.
    pub fn details(
        &self,
        source: &dyn StructureSource,
    ) -> Result<Option<SectionDetails>, IndexError> {
        let Some(record) = self.load(source)? else {
            return Ok(None);
        };
        Ok(self
            .own_section(record)
            .map(|section| section_details(record, section)))
    }

    /// The root-to-self path of sections.
    pub fn breadcrumbs(
        &self,
        source: &dyn StructureSource,
    ) -> Result<Vec<SectionSummary>, IndexError> {
        let Some(record) = self.load(source)? else {
            return Ok(Vec::new());
        };
        let Some(section) = self.own_section(record) else {
            return Ok(Vec::new());
        };

        let mut path: Vec<SectionSummary> = record
            .outline
            .ancestors(&section.id)
            .into_iter()
            .map(Section::summary)
            .collect();
        path.push(section.summary());
        Ok(path)
    }

    /// The breadcrumb path joined by `sep` (default " > ").
    ///
    /// The synthetic body root has no text and is skipped.
    pub fn breadcrumbs_text(
        &self,
        source: &dyn StructureSource,
        sep: Option<&str>,
    ) -> Result<String, IndexError> {
        let parts: Vec<String> = self
            .breadcrumbs(source)?
            .into_iter()
            .filter(|s| !s.text.is_empty())
            .map(|s| s.text)
            .collect();
        Ok(parts.join(sep.unwrap_or(" > ")))
    }

    /// Walks parents until a section of the given depth, `None` if the
    /// chain never reaches it.
    pub fn ancestor_at_depth(
        &self,
        source: &dyn StructureSource,
        depth: u8,
    ) -> Result<Option<Section>, IndexError> {
        let Some(record) = self.load(source)? else {
            return Ok(None);
        };
        let Some(section) = self.own_section(record) else {
            return Ok(None);
        };
        if section.depth == depth {
            return Ok(Some(section.clone()));
        }
        Ok(record
            .outline
            .ancestors(&section.id)
            .into_iter()
            .find(|s| s.depth == depth)
            .cloned())
    }

    /// The siblings under the same parent, excluding self. Empty for roots.
    pub fn siblings(&self, source: &dyn StructureSource) -> Result<Vec<Section>, IndexError> {
        let Some(record) = self.load(source)? else {
            return Ok(Vec::new());
        };
        let Some(section) = self.own_section(record) else {
            return Ok(Vec::new());
        };
        let Some(parent) = section
            .parent_id
            .as_deref()
            .and_then(|id| record.outline.section(id))
        else {
            return Ok(Vec::new());
        };

        Ok(parent
            .children_ids
            .iter()
            .filter(|id| id.as_str() != section.id)
            .filter_map(|id| record.outline.section(id))
            .cloned()
            .collect())
    }

    /// Extended text around the snippet.
    ///
    /// Section mode renders the owning section as Markdown when it has
    /// content blocks; range mode slices the original body text around the
    /// snippet position. With no resolvable document the snippet's own text
    /// comes back.
    pub fn extended_text(
        &self,
        source: &dyn StructureSource,
        options: ExtendOptions,
    ) -> Result<String, IndexError> {
        let Some(record) = self.load(source)? else {
            return Ok(self.text.clone());
        };

        if self.has_content()
            && let Some(section) = self.own_section(record)
            && !section.content.is_empty()
        {
            return Ok(render_section(section));
        }

        Ok(range_text(record.body(), self.position, options))
    }
}

/// Renders a section back to Markdown: heading line, blank line, blocks
/// separated by blank lines, code refenced with its language.
fn render_section(section: &Section) -> String {
    let mut parts: Vec<String> = Vec::new();

    if section.depth > 0 {
        parts.push(format!(
            "{} {}",
            "#".repeat(usize::from(section.depth)),
            section.text
        ));
    }

    for block in &section.content {
        match &block.kind {
            BlockKind::Code { language } => {
                let lang = language.as_deref().unwrap_or("");
                parts.push(format!("```{lang}\n{}\n```", block.text));
            }
            _ => parts.push(block.text.clone()),
        }
    }

    parts.join("\n\n")
}

/// Slices `body[clamp(p+offset) .. clamp(p+offset+length)]` on char
/// boundaries.
fn range_text(body: &str, position: usize, options: ExtendOptions) -> String {
    let len = body.len() as i64;
    let start = (position as i64 + options.offset).clamp(0, len) as usize;
    let end = (start as i64 + options.length as i64).clamp(0, len) as usize;

    let start = floor_char_boundary(body, start);
    let end = floor_char_boundary(body, end);
    body[start..end].to_string()
}

/// The nearest char boundary at or below `index`.
fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    index = index.min(s.len());
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
