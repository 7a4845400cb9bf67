use std::fmt;

use super::region::{parse_marker, Marker, Region, RegionKind};

/// Contiguous piece of a section body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Unmanaged bytes, passed through verbatim.
    Text(String),
    Region(Region),
}

/// A level-2 heading and everything up to the next one.
///
/// The text before the first heading is kept as a section without a heading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    heading: Option<String>,
    blocks: Vec<Block>,
}

/// Where a region that does not exist yet gets appended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor<'a> {
    /// End of the section with this heading title.
    SectionEnd(&'a str),
    DocumentEnd,
}

/// Markdown document parsed into sections and managed regions.
///
/// `Document::parse(text).to_string() == text` for every input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    sections: Vec<Section>,
}

fn strip_terminator(line: &str) -> &str {
    match line.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => line,
    }
}

/// Title of a `## ` heading line, `None` for anything else (including `###`).
pub fn heading_title(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("##")?;
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some(rest.trim())
}

fn find_end(lines: &[&str], kind: RegionKind) -> Option<usize> {
    lines
        .iter()
        .position(|line| parse_marker(strip_terminator(line)) == Some(Marker::End(kind)))
}

impl Section {
    fn with_heading(line: &str) -> Self {
        Self {
            heading: Some(line.to_string()),
            blocks: Vec::new(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.heading
            .as_deref()
            .and_then(|h| heading_title(strip_terminator(h)))
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Everything after the heading line, regions included.
    pub fn body(&self) -> String {
        self.blocks.iter().map(block_text).collect()
    }

    /// Unmanaged lines of the body, terminators stripped.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Text(text) => Some(text.as_str()),
                Block::Region(_) => None,
            })
            .flat_map(|text| text.split_inclusive('\n').map(strip_terminator))
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Region(region) => Some(region),
            Block::Text(_) => None,
        })
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.blocks.iter().any(|block| match block {
            Block::Text(text) => text.contains(needle),
            Block::Region(region) => region.to_string().contains(needle),
        })
    }

    /// Rewrite the first unmanaged line matching `predicate`, keeping its
    /// line terminator. Returns whether a line matched.
    pub fn rewrite_first_line<P, F>(&mut self, predicate: P, rewrite: F) -> bool
    where
        P: Fn(&str) -> bool,
        F: FnOnce(&str) -> String,
    {
        for block in &mut self.blocks {
            let Block::Text(text) = block else {
                continue;
            };
            let mut offset = 0;
            let mut found = None;
            for line in text.split_inclusive('\n') {
                let bare = strip_terminator(line);
                if predicate(bare) {
                    found = Some((offset, bare.len()));
                    break;
                }
                offset += line.len();
            }
            if let Some((start, len)) = found {
                let replacement = rewrite(&text[start..start + len]);
                text.replace_range(start..start + len, &replacement);
                return true;
            }
        }
        false
    }

    /// Insert text directly after the heading line.
    pub fn prepend_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.terminate_heading();
        match self.blocks.first_mut() {
            Some(Block::Text(existing)) => existing.insert_str(0, text),
            _ => self.blocks.insert(0, Block::Text(text.to_string())),
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.blocks.last_mut() {
            Some(Block::Text(existing)) => existing.push_str(text),
            _ => self.blocks.push(Block::Text(text.to_string())),
        }
    }

    fn terminate_heading(&mut self) {
        if let Some(heading) = &mut self.heading {
            if !heading.ends_with('\n') {
                heading.push('\n');
            }
        }
    }

    fn trim_trailing_whitespace(&mut self) {
        while let Some(Block::Text(text)) = self.blocks.last_mut() {
            let kept = text.trim_end().len();
            text.truncate(kept);
            if !text.is_empty() {
                break;
            }
            self.blocks.pop();
        }
    }

    /// Append a region after the last non-blank content, one blank line
    /// apart. `followed` adds a blank line before whatever comes next.
    fn append_region(&mut self, region: Region, followed: bool, heading_is_content: bool) {
        self.trim_trailing_whitespace();
        let heading_only = heading_is_content && self.blocks.is_empty() && self.heading.is_some();
        if heading_only {
            if let Some(heading) = &mut self.heading {
                let kept = heading.trim_end().len();
                heading.truncate(kept);
            }
        } else {
            self.terminate_heading();
        }
        if heading_only || !self.blocks.is_empty() {
            self.push_text("\n\n");
        }
        self.blocks.push(Block::Region(region));
        self.push_text(if followed { "\n\n" } else { "\n" });
    }
}

fn block_text(block: &Block) -> String {
    match block {
        Block::Text(text) => text.clone(),
        Block::Region(region) => region.to_string(),
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(heading) = &self.heading {
            f.write_str(heading)?;
        }
        for block in &self.blocks {
            match block {
                Block::Text(text) => f.write_str(text)?,
                Block::Region(region) => write!(f, "{region}")?,
            }
        }
        Ok(())
    }
}

impl Document {
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let mut sections = Vec::new();
        let mut current = Section::default();

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            let bare = strip_terminator(line);

            if let Some(Marker::Begin { kind, attrs }) = parse_marker(bare) {
                if let Some(end) = find_end(&lines[i + 1..], kind).map(|offset| i + 1 + offset) {
                    let end_line = lines[end];
                    let end_bare = strip_terminator(end_line);
                    current.blocks.push(Block::Region(Region::parsed(
                        kind,
                        attrs,
                        line.to_string(),
                        lines[i + 1..end].concat(),
                        end_bare.to_string(),
                    )));
                    current.push_text(&end_line[end_bare.len()..]);
                    i = end + 1;
                    continue;
                }
            }

            if heading_title(bare).is_some() {
                sections.push(std::mem::replace(&mut current, Section::with_heading(line)));
            } else {
                current.push_text(line);
            }
            i += 1;
        }
        sections.push(current);

        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title() == Some(title))
    }

    pub fn section_mut(&mut self, title: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.title() == Some(title))
    }

    /// Trimmed body of a section, empty when the section is absent.
    pub fn section_body(&self, title: &str) -> String {
        self.section(title)
            .map(|s| s.body().trim().to_string())
            .unwrap_or_default()
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.sections.iter().flat_map(Section::regions)
    }

    pub fn find_region(&self, kind: RegionKind, key: Option<&str>) -> Option<&Region> {
        self.regions().find(|r| r.matches(kind, key))
    }

    /// Replace the region with the same kind and key wherever it is, or
    /// append it at `anchor`. Returns `false` only when the anchor section
    /// does not exist, leaving the document untouched.
    pub fn upsert_region(&mut self, region: Region, anchor: Anchor<'_>) -> bool {
        let key = region.key().map(str::to_string);
        for section in &mut self.sections {
            for block in &mut section.blocks {
                if let Block::Region(existing) = block {
                    if existing.matches(region.kind(), key.as_deref()) {
                        *existing = region;
                        return true;
                    }
                }
            }
        }

        match anchor {
            Anchor::SectionEnd(title) => {
                let Some(idx) = self.sections.iter().position(|s| s.title() == Some(title)) else {
                    return false;
                };
                let followed = idx + 1 < self.sections.len();
                self.sections[idx].append_region(region, followed, false);
            }
            Anchor::DocumentEnd => {
                if self.sections.is_empty() {
                    self.sections.push(Section::default());
                }
                if let Some(last) = self.sections.last_mut() {
                    last.append_region(region, false, true);
                }
            }
        }
        true
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            write!(f, "{section}")?;
        }
        Ok(())
    }
}
