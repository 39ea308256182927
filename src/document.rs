//! Toolkit-neutral document tree.
//!
//! Report and view code build these values; [`crate::render`] turns them into
//! terminal text or HTML.

/// Outcome marker attached to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Pass,
    Fail,
}

impl Mark {
    /// Marker for a count: pass/fail when non-zero, nothing otherwise.
    pub fn when_nonzero(self, value: u64) -> Option<Mark> {
        (value != 0).then_some(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Plain(String),
    /// A shortened list with a control revealing the full text.
    Truncated {
        shown: String,
        more: String,
        full: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub title: String,
    pub value: FieldValue,
    pub mark: Option<Mark>,
}

impl Field {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: FieldValue::Plain(value.into()),
            mark: None,
        }
    }

    pub fn marked(mut self, mark: Option<Mark>) -> Self {
        self.mark = mark;
        self
    }

    /// The text currently shown for this field.
    pub fn display_value(&self) -> String {
        match &self.value {
            FieldValue::Plain(v) => v.clone(),
            FieldValue::Truncated { shown, more, .. } => format!("{} {}", shown, more),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub mark: Option<Mark>,
    pub colspan: usize,
    pub rowspan: usize,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mark: None,
            colspan: 1,
            rowspan: 1,
        }
    }

    pub fn marked(mut self, mark: Option<Mark>) -> Self {
        self.mark = mark;
        self
    }

    pub fn span(mut self, colspan: usize, rowspan: usize) -> Self {
        self.colspan = colspan.max(1);
        self.rowspan = rowspan.max(1);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub caption: Option<String>,
    pub head: Vec<Vec<Cell>>,
    pub body: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    Preformatted(String),
    /// Thematic break.
    Rule,
    Fields(Vec<Field>),
    Table(Table),
    /// Inline error status.
    Error(String),
    /// A named panel grouping other blocks.
    Section { name: String, blocks: Vec<Block> },
}

impl Block {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level,
            text: text.into(),
        }
    }

    pub fn section(name: impl Into<String>, blocks: Vec<Block>) -> Self {
        Block::Section {
            name: name.into(),
            blocks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Depth-first search for the first section with the given name.
    pub fn section(&self, name: &str) -> Option<&[Block]> {
        fn find<'a>(blocks: &'a [Block], name: &str) -> Option<&'a [Block]> {
            blocks.iter().find_map(|b| match b {
                Block::Section { name: n, blocks } if n == name => Some(blocks.as_slice()),
                Block::Section { blocks, .. } => find(blocks, name),
                _ => None,
            })
        }
        find(&self.blocks, name)
    }
}
