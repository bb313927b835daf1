use std::fmt;

use datasheet_common::cell_to_a1;
use datasheet_parse::ASTNode;
use datasheet_store::DataRegion;
use rustc_hash::FxHashSet;

/// Engine-internal vertex identity. Stable while a vertex lives, including
/// across moves and sheet renames.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct VertexId(pub(crate) u32);

/// What a vertex stands for: a cell or a named variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VertexKey {
    Cell { sheet: String, row: u32, col: u32 },
    Named(String),
}

impl VertexKey {
    pub fn cell(sheet: impl Into<String>, row: u32, col: u32) -> Self {
        VertexKey::Cell {
            sheet: sheet.into(),
            row,
            col,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        VertexKey::Named(name.into())
    }

    pub fn sheet(&self) -> Option<&str> {
        match self {
            VertexKey::Cell { sheet, .. } => Some(sheet),
            VertexKey::Named(_) => None,
        }
    }

    pub fn position(&self) -> Option<(u32, u32)> {
        match self {
            VertexKey::Cell { row, col, .. } => Some((*row, *col)),
            VertexKey::Named(_) => None,
        }
    }

    /// Sheet that unqualified references in this vertex's formula point at.
    pub(crate) fn home_sheet(&self) -> &str {
        self.sheet().unwrap_or("")
    }
}

impl fmt::Display for VertexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexKey::Cell { sheet, row, col } => write!(f, "{sheet}!{}", cell_to_a1(*row, *col)),
            VertexKey::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexKind {
    Cell,
    Named,
}

/// A node of the dependency graph.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub(crate) key: VertexKey,
    pub(crate) formula: Option<ASTNode>,
    pub(crate) volatile: bool,
    /// Cells and names referenced one by one.
    pub(crate) dependencies: FxHashSet<VertexId>,
    pub(crate) dependents: FxHashSet<VertexId>,
    /// Multi-cell references, as registered in the sheet's range index.
    pub(crate) range_refs: Vec<(String, DataRegion<VertexId>)>,
}

impl Vertex {
    pub(crate) fn new(key: VertexKey) -> Self {
        Self {
            key,
            formula: None,
            volatile: false,
            dependencies: FxHashSet::default(),
            dependents: FxHashSet::default(),
            range_refs: Vec::new(),
        }
    }

    pub fn key(&self) -> &VertexKey {
        &self.key
    }

    pub fn kind(&self) -> VertexKind {
        match self.key {
            VertexKey::Cell { .. } => VertexKind::Cell,
            VertexKey::Named(_) => VertexKind::Named,
        }
    }

    pub fn formula(&self) -> Option<&ASTNode> {
        self.formula.as_ref()
    }

    pub fn is_volatile(&self) -> bool {
        self.volatile
    }

    /// A vertex with no formula and nothing depending on it can be dropped.
    pub(crate) fn is_orphan(&self) -> bool {
        self.formula.is_none()
            && self.dependents.is_empty()
            && self.dependencies.is_empty()
            && self.range_refs.is_empty()
    }
}
