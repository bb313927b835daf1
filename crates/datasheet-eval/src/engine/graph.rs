use std::collections::BTreeMap;

use datasheet_common::{Axis, Region, UNBOUNDED};
use datasheet_parse::{ASTNode, ReferenceType};
use datasheet_store::{DataRegion, OverlapPolicy, RegionDataStore, RegionStore};
use rustc_hash::{FxHashMap, FxHashSet};

use super::error::EngineError;
use super::vertex::{Vertex, VertexId, VertexKey};

/// Cell vertices of one sheet plus the index of range references into it.
#[derive(Debug)]
struct SheetVertices {
    name: String,
    cells: BTreeMap<(u32, u32), VertexId>,
    /// Multi-cell references pointing into this sheet, tagged with the
    /// referencing vertex.
    ranges: RegionDataStore<VertexId>,
}

impl SheetVertices {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: BTreeMap::new(),
            ranges: RegionDataStore::new(OverlapPolicy::Allow, false),
        }
    }
}

/// One reversible step of a graph mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphChange {
    Formula {
        key: VertexKey,
        previous: Option<ASTNode>,
    },
    RowsCols {
        sheet: String,
        axis: Axis,
        index: u32,
        count: u32,
        removed: bool,
        /// Formulas whose references moved, keyed by their position after
        /// the edit.
        rewritten: Vec<(VertexKey, ASTNode)>,
        /// Formulas that lived in removed rows/columns.
        cleared: Vec<(VertexKey, ASTNode)>,
    },
    SheetRemoved {
        name: String,
        index: usize,
    },
    SheetRenamed {
        old: String,
        new: String,
        /// Formulas whose sheet prefixes were rewritten, keyed under `old`.
        formulas: Vec<(VertexKey, ASTNode)>,
    },
}

/// Inverse of one graph mutation. Changes are undone last to first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphRestoreData {
    changes: Vec<GraphChange>,
}

impl GraphRestoreData {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[GraphChange] {
        &self.changes
    }

    fn push(&mut self, change: GraphChange) {
        self.changes.push(change);
    }
}

/// Formula dependencies between cells and named variables.
///
/// Direct references (single cells, names) are edges between vertices,
/// created on demand; a referenced cell without a formula is a placeholder
/// vertex that disappears once nothing references it. Range references are
/// kept in a per-sheet region index instead, so a range over a million rows
/// costs one entry.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    vertices: FxHashMap<VertexId, Vertex>,
    sheets: Vec<SheetVertices>,
    names: FxHashMap<String, VertexId>,
    /// Formulas referencing a sheet that does not exist (yet).
    unresolved: FxHashSet<VertexId>,
    next_id: u32,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /* ───────────────────────────── sheets ───────────────────────────── */

    fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Registered spelling of `name`, matched without case.
    pub fn canonical_sheet(&self, name: &str) -> Option<&str> {
        self.sheet_index(name).map(|i| self.sheets[i].name.as_str())
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheet_index(name).is_some()
    }

    pub fn add_sheet(&mut self, name: &str) -> Result<(), EngineError> {
        self.insert_sheet(name, self.sheets.len())
    }

    fn insert_sheet(&mut self, name: &str, index: usize) -> Result<(), EngineError> {
        if self.has_sheet(name) {
            return Err(EngineError::DuplicateSheet(name.to_string()));
        }
        let index = index.min(self.sheets.len());
        self.sheets.insert(index, SheetVertices::new(name));
        let pending: Vec<VertexId> = self.unresolved.iter().copied().collect();
        self.relink(&pending);
        Ok(())
    }

    /// Drops every vertex of the sheet. References into it from other sheets
    /// become `#REF!`.
    pub fn remove_sheet(&mut self, name: &str) -> Result<GraphRestoreData, EngineError> {
        let index = self
            .sheet_index(name)
            .ok_or_else(|| EngineError::UnknownSheet(name.to_string()))?;
        let name = self.sheets[index].name.clone();
        let mut restore = GraphRestoreData::default();

        for id in self.formula_ids() {
            let vertex = &self.vertices[&id];
            let on_sheet = vertex
                .key
                .sheet()
                .is_some_and(|s| s.eq_ignore_ascii_case(&name));
            let Some(formula) = vertex.formula.clone() else {
                continue;
            };
            let key = vertex.key.clone();
            if on_sheet {
                let previous = self.assign(&key, None);
                restore.push(GraphChange::Formula { key, previous });
                continue;
            }
            let mut rewritten = formula.clone();
            if rewritten.invalidate_sheet(key.home_sheet(), &name) {
                self.assign(&key, Some(rewritten));
                restore.push(GraphChange::Formula {
                    key,
                    previous: Some(formula),
                });
            }
        }

        let leftovers: Vec<VertexId> = self.sheets[index].cells.values().copied().collect();
        let mut released = Vec::new();
        for id in leftovers {
            released.extend(self.detach(id));
        }
        self.collect_garbage(released);
        self.sheets.remove(index);
        restore.push(GraphChange::SheetRemoved { name, index });
        Ok(restore)
    }

    pub fn rename_sheet(&mut self, old: &str, new: &str) -> Result<GraphRestoreData, EngineError> {
        let index = self
            .sheet_index(old)
            .ok_or_else(|| EngineError::UnknownSheet(old.to_string()))?;
        if let Some(other) = self.sheet_index(new)
            && other != index
        {
            return Err(EngineError::DuplicateSheet(new.to_string()));
        }
        let old = self.sheets[index].name.clone();
        self.rekey_sheet(index, new);

        let mut formulas = Vec::new();
        for id in self.formula_ids() {
            let Some(vertex) = self.vertices.get_mut(&id) else {
                continue;
            };
            let Some(formula) = vertex.formula.as_mut() else {
                continue;
            };
            let previous = formula.clone();
            if formula.rename_sheet(&old, new) {
                let key = match &vertex.key {
                    VertexKey::Cell { sheet, row, col } if sheet.as_str() == new => {
                        VertexKey::cell(old.clone(), *row, *col)
                    }
                    other => other.clone(),
                };
                formulas.push((key, previous));
            }
        }
        let touched = self.referencing_sheet(new);
        self.relink(&touched);

        let mut restore = GraphRestoreData::default();
        restore.push(GraphChange::SheetRenamed {
            old,
            new: new.to_string(),
            formulas,
        });
        Ok(restore)
    }

    fn rekey_sheet(&mut self, index: usize, new: &str) {
        let sheet = &mut self.sheets[index];
        let old = std::mem::replace(&mut sheet.name, new.to_string());
        for (&(row, col), id) in &sheet.cells {
            if let Some(v) = self.vertices.get_mut(id) {
                v.key = VertexKey::cell(new, row, col);
            }
        }
        for v in self.vertices.values_mut() {
            for (sheet, _) in v.range_refs.iter_mut() {
                if *sheet == old {
                    *sheet = new.to_string();
                }
            }
        }
    }

    /// Formula vertices with an explicit reference to `sheet`.
    pub(crate) fn referencing_sheet(&self, sheet: &str) -> Vec<VertexId> {
        self.formula_ids()
            .into_iter()
            .filter(|id| {
                self.vertices[id].formula.as_ref().is_some_and(|f| {
                    f.get_dependencies()
                        .iter()
                        .any(|r| r.sheet().is_some_and(|s| s.eq_ignore_ascii_case(sheet)))
                })
            })
            .collect()
    }

    /* ──────────────────────────── vertices ──────────────────────────── */

    pub fn vertex_id(&self, key: &VertexKey) -> Option<VertexId> {
        match key {
            VertexKey::Cell { sheet, row, col } => self
                .sheet_index(sheet)
                .and_then(|i| self.sheets[i].cells.get(&(*row, *col)).copied()),
            VertexKey::Named(name) => self.names.get(name).copied(),
        }
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    pub fn key_of(&self, id: VertexId) -> Option<&VertexKey> {
        self.vertices.get(&id).map(|v| &v.key)
    }

    pub fn formula(&self, key: &VertexKey) -> Option<&ASTNode> {
        self.vertex_id(key)
            .and_then(|id| self.vertices.get(&id))
            .and_then(|v| v.formula.as_ref())
    }

    /// Names that have a vertex, whether bound to a formula or only referenced.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Every vertex id in creation order.
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        let mut ids: Vec<VertexId> = self.vertices.keys().copied().collect();
        ids.sort();
        ids
    }

    fn formula_ids(&self) -> Vec<VertexId> {
        let mut ids: Vec<VertexId> = self
            .vertices
            .iter()
            .filter(|(_, v)| v.formula.is_some())
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn volatile_ids(&self) -> Vec<VertexId> {
        let mut ids: Vec<VertexId> = self
            .vertices
            .iter()
            .filter(|(_, v)| v.volatile)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    fn get_or_create(&mut self, key: VertexKey) -> VertexId {
        if let Some(id) = self.vertex_id(&key) {
            return id;
        }
        let id = VertexId(self.next_id);
        self.next_id += 1;
        match &key {
            VertexKey::Cell { sheet, row, col } => {
                if let Some(i) = self.sheet_index(sheet) {
                    self.sheets[i].cells.insert((*row, *col), id);
                }
            }
            VertexKey::Named(name) => {
                self.names.insert(name.clone(), id);
            }
        }
        self.vertices.insert(id, Vertex::new(key));
        id
    }

    /// Removes a vertex and every edge touching it, returning the vertices
    /// it depended on.
    fn detach(&mut self, id: VertexId) -> Vec<VertexId> {
        let released = self.unlink(id);
        let Some(vertex) = self.vertices.remove(&id) else {
            return released;
        };
        for dependent in vertex.dependents {
            if let Some(v) = self.vertices.get_mut(&dependent) {
                v.dependencies.remove(&id);
            }
        }
        self.forget_key(&vertex.key, id);
        self.unresolved.remove(&id);
        released
    }

    fn forget_key(&mut self, key: &VertexKey, id: VertexId) {
        match key {
            VertexKey::Cell { sheet, row, col } => {
                if let Some(i) = self.sheet_index(sheet)
                    && self.sheets[i].cells.get(&(*row, *col)) == Some(&id)
                {
                    self.sheets[i].cells.remove(&(*row, *col));
                }
            }
            VertexKey::Named(name) => {
                if self.names.get(name) == Some(&id) {
                    self.names.remove(name);
                }
            }
        }
    }

    fn collect_garbage(&mut self, candidates: impl IntoIterator<Item = VertexId>) {
        for id in candidates {
            if self.vertices.get(&id).is_some_and(Vertex::is_orphan) {
                self.detach(id);
            }
        }
    }

    /* ────────────────────────────── edges ───────────────────────────── */

    /// Drops the outgoing edges and range registrations of `id`, returning
    /// the vertices it depended on.
    fn unlink(&mut self, id: VertexId) -> Vec<VertexId> {
        let Some(vertex) = self.vertices.get_mut(&id) else {
            return Vec::new();
        };
        let dependencies: Vec<VertexId> = vertex.dependencies.drain().collect();
        let ranges = std::mem::take(&mut vertex.range_refs);
        for d in &dependencies {
            if let Some(v) = self.vertices.get_mut(d) {
                v.dependents.remove(&id);
            }
        }
        for (sheet, entry) in ranges {
            if let Some(i) = self.sheet_index(&sheet) {
                let _ = self.sheets[i].ranges.delete(&entry);
            }
        }
        self.unresolved.remove(&id);
        dependencies
    }

    /// Adds the edges implied by the formula of `id`.
    fn link(&mut self, id: VertexId) {
        let Some(vertex) = self.vertices.get(&id) else {
            return;
        };
        let Some(formula) = vertex.formula.clone() else {
            return;
        };
        let home = vertex.key.home_sheet().to_string();

        for reference in formula.get_dependencies() {
            if let ReferenceType::Named(name) = reference {
                let target = self.get_or_create(VertexKey::named(name.as_str()));
                self.add_edge(id, target);
                continue;
            }
            let sheet_name = reference.sheet().unwrap_or(&home);
            let (Some(index), Some(region)) = (self.sheet_index(sheet_name), reference.region())
            else {
                self.unresolved.insert(id);
                continue;
            };
            let sheet = self.sheets[index].name.clone();
            match reference {
                ReferenceType::Cell { row, col, .. } => {
                    let target = self.get_or_create(VertexKey::cell(sheet, *row, *col));
                    self.add_edge(id, target);
                }
                _ => {
                    let entry = DataRegion::new(region, id);
                    let registered = self.vertices[&id]
                        .range_refs
                        .iter()
                        .any(|(s, e)| *s == sheet && *e == entry);
                    if registered {
                        continue;
                    }
                    self.sheets[index].ranges.add(region, id);
                    if let Some(v) = self.vertices.get_mut(&id) {
                        v.range_refs.push((sheet, entry));
                    }
                }
            }
        }
    }

    fn add_edge(&mut self, dependent: VertexId, dependency: VertexId) {
        if let Some(v) = self.vertices.get_mut(&dependent) {
            v.dependencies.insert(dependency);
        }
        if let Some(v) = self.vertices.get_mut(&dependency) {
            v.dependents.insert(dependent);
        }
    }

    fn relink(&mut self, ids: &[VertexId]) {
        let mut released = Vec::new();
        for &id in ids {
            released.extend(self.unlink(id));
            self.link(id);
        }
        self.collect_garbage(released);
    }

    /* ──────────────────────────── formulas ──────────────────────────── */

    /// Replace the formula of `key`, rebuilding its edges. `None` clears it.
    pub fn set_formula(
        &mut self,
        key: &VertexKey,
        formula: Option<ASTNode>,
    ) -> Result<GraphRestoreData, EngineError> {
        if let Some(sheet) = key.sheet()
            && !self.has_sheet(sheet)
        {
            return Err(EngineError::UnknownSheet(sheet.to_string()));
        }
        let key = self.normalize(key);
        let previous = self.assign(&key, formula);
        let mut restore = GraphRestoreData::default();
        restore.push(GraphChange::Formula { key, previous });
        Ok(restore)
    }

    fn normalize(&self, key: &VertexKey) -> VertexKey {
        match key {
            VertexKey::Cell { sheet, row, col } => VertexKey::cell(
                self.canonical_sheet(sheet).unwrap_or(sheet.as_str()),
                *row,
                *col,
            ),
            named => named.clone(),
        }
    }

    /// Swap in a formula and return the one it replaced.
    fn assign(&mut self, key: &VertexKey, formula: Option<ASTNode>) -> Option<ASTNode> {
        let id = match (&formula, self.vertex_id(key)) {
            (_, Some(id)) => id,
            (Some(_), None) => self.get_or_create(key.clone()),
            (None, None) => return None,
        };
        let released = self.unlink(id);
        let vertex = self.vertices.get_mut(&id)?;
        vertex.volatile = formula.as_ref().is_some_and(ASTNode::contains_volatile);
        let previous = std::mem::replace(&mut vertex.formula, formula);
        self.link(id);
        self.collect_garbage(released.into_iter().chain([id]));
        previous
    }

    /* ─────────────────────────── structure ──────────────────────────── */

    fn along(axis: Axis, pos: (u32, u32)) -> u32 {
        match axis {
            Axis::Row => pos.0,
            Axis::Col => pos.1,
        }
    }

    /// Moves every cell vertex of the sheet at or after `from` by `delta`.
    fn shift_cells(&mut self, index: usize, axis: Axis, from: u32, delta: i64) {
        let sheet = &mut self.sheets[index];
        let moved: Vec<((u32, u32), VertexId)> = sheet
            .cells
            .iter()
            .filter(|(pos, _)| Self::along(axis, **pos) >= from)
            .map(|(pos, id)| (*pos, *id))
            .collect();
        for (pos, _) in &moved {
            sheet.cells.remove(pos);
        }
        for ((row, col), id) in moved {
            let step = |v: u32| {
                i64::from(v)
                    .checked_add(delta)
                    .map_or(UNBOUNDED - 1, |n| n.clamp(0, i64::from(UNBOUNDED - 1)) as u32)
            };
            let pos = match axis {
                Axis::Row => (step(row), col),
                Axis::Col => (row, step(col)),
            };
            sheet.cells.insert(pos, id);
            if let Some(v) = self.vertices.get_mut(&id) {
                v.key = VertexKey::cell(sheet.name.as_str(), pos.0, pos.1);
            }
        }
    }

    /// `count` rows/columns were inserted at `index` on `sheet`.
    pub fn insert_rows_cols(
        &mut self,
        sheet: &str,
        axis: Axis,
        index: u32,
        count: u32,
    ) -> Result<GraphRestoreData, EngineError> {
        self.edit_rows_cols(sheet, axis, index, count, false)
    }

    /// `count` rows/columns starting at `index` were removed from `sheet`.
    /// Formulas living there are dropped; references into the span become
    /// `#REF!`.
    pub fn remove_rows_cols(
        &mut self,
        sheet: &str,
        axis: Axis,
        index: u32,
        count: u32,
    ) -> Result<GraphRestoreData, EngineError> {
        self.edit_rows_cols(sheet, axis, index, count, true)
    }

    fn edit_rows_cols(
        &mut self,
        sheet: &str,
        axis: Axis,
        index: u32,
        count: u32,
        removed: bool,
    ) -> Result<GraphRestoreData, EngineError> {
        let sheet_index = self
            .sheet_index(sheet)
            .ok_or_else(|| EngineError::UnknownSheet(sheet.to_string()))?;
        let mut restore = GraphRestoreData::default();
        if count == 0 {
            return Ok(restore);
        }
        let sheet = self.sheets[sheet_index].name.clone();
        let end = index.saturating_add(count);

        // Rewrite references in place; edges are rebuilt once vertices moved.
        let mut changed: Vec<(VertexId, ASTNode)> = Vec::new();
        for id in self.formula_ids() {
            let Some(vertex) = self.vertices.get_mut(&id) else {
                continue;
            };
            let home = vertex.key.home_sheet().to_string();
            let Some(formula) = vertex.formula.as_mut() else {
                continue;
            };
            let previous = formula.clone();
            let touched = if removed {
                formula.adjust_for_remove(&home, &sheet, axis, index, count)
            } else {
                formula.adjust_for_insert(&home, &sheet, axis, index, count)
            };
            if touched {
                changed.push((id, previous));
            }
        }
        let mut released = Vec::new();
        for (id, _) in &changed {
            released.extend(self.unlink(*id));
        }

        let mut cleared = Vec::new();
        if removed {
            let doomed: Vec<((u32, u32), VertexId)> = self.sheets[sheet_index]
                .cells
                .iter()
                .filter(|(pos, _)| (index..end).contains(&Self::along(axis, **pos)))
                .map(|(pos, id)| (*pos, *id))
                .collect();
            for (_, id) in doomed {
                let original = changed
                    .iter()
                    .position(|(c, _)| *c == id)
                    .map(|i| changed.remove(i).1)
                    .or_else(|| self.vertices.get(&id).and_then(|v| v.formula.clone()));
                if let (Some(formula), Some(v)) = (original, self.vertices.get(&id)) {
                    cleared.push((v.key.clone(), formula));
                }
                released.extend(self.detach(id));
            }
            self.shift_cells(sheet_index, axis, end, -(count as i64));
        } else {
            self.shift_cells(sheet_index, axis, index, count as i64);
        }

        let ids: Vec<VertexId> = changed.iter().map(|(id, _)| *id).collect();
        for &id in &ids {
            self.link(id);
        }
        self.collect_garbage(released);

        let rewritten = changed
            .into_iter()
            .filter_map(|(id, previous)| self.key_of(id).map(|k| (k.clone(), previous)))
            .collect();
        restore.push(GraphChange::RowsCols {
            sheet,
            axis,
            index,
            count,
            removed,
            rewritten,
            cleared,
        });
        Ok(restore)
    }

    fn undo_rows_cols(
        &mut self,
        sheet: &str,
        axis: Axis,
        index: u32,
        count: u32,
        removed: bool,
        rewritten: Vec<(VertexKey, ASTNode)>,
        cleared: Vec<(VertexKey, ASTNode)>,
    ) {
        let Some(sheet_index) = self.sheet_index(sheet) else {
            return;
        };
        let mut ids = Vec::new();
        let mut released = Vec::new();
        for (key, previous) in rewritten {
            let Some(id) = self.vertex_id(&key) else {
                continue;
            };
            released.extend(self.unlink(id));
            if let Some(v) = self.vertices.get_mut(&id) {
                v.formula = Some(previous);
            }
            ids.push(id);
        }
        if removed {
            self.shift_cells(sheet_index, axis, index, count as i64);
        } else {
            self.shift_cells(sheet_index, axis, index.saturating_add(count), -(count as i64));
        }
        for &id in &ids {
            self.link(id);
        }
        for (key, formula) in cleared {
            self.assign(&key, Some(formula));
        }
        self.collect_garbage(released);
    }

    /// Reverts the mutation that produced `data`.
    pub fn restore(&mut self, data: GraphRestoreData) {
        for change in data.changes.into_iter().rev() {
            match change {
                GraphChange::Formula { key, previous } => {
                    self.assign(&key, previous);
                }
                GraphChange::RowsCols {
                    sheet,
                    axis,
                    index,
                    count,
                    removed,
                    rewritten,
                    cleared,
                } => self.undo_rows_cols(&sheet, axis, index, count, removed, rewritten, cleared),
                GraphChange::SheetRemoved { name, index } => {
                    let _ = self.insert_sheet(&name, index);
                }
                GraphChange::SheetRenamed { old, new, formulas } => {
                    if let Some(index) = self.sheet_index(&new) {
                        self.rekey_sheet(index, &old);
                    }
                    for (key, previous) in formulas {
                        if let Some(v) = self.vertex_id(&key).and_then(|id| self.vertices.get_mut(&id))
                        {
                            v.formula = Some(previous);
                        }
                    }
                    let mut touched = self.referencing_sheet(&new);
                    touched.extend(self.referencing_sheet(&old));
                    touched.sort();
                    touched.dedup();
                    self.relink(&touched);
                }
            }
        }
    }

    /* ──────────────────────────── queries ───────────────────────────── */

    /// Vertices whose formula references `id`, directly or through a range.
    pub fn get_direct_dependents(&self, id: VertexId) -> Vec<VertexId> {
        let Some(vertex) = self.vertices.get(&id) else {
            return Vec::new();
        };
        let mut out: Vec<VertexId> = vertex.dependents.iter().copied().collect();
        if let VertexKey::Cell { sheet, row, col } = &vertex.key
            && let Some(i) = self.sheet_index(sheet)
        {
            out.extend(
                self.sheets[i]
                    .ranges
                    .get_data_regions_at(*row, *col)
                    .into_iter()
                    .map(|e| e.data),
            );
        }
        out.sort();
        out.dedup();
        out
    }

    /// Vertices `id` references, by key. Range references are not included.
    pub fn get_dependencies(&self, id: VertexId) -> Vec<VertexId> {
        let mut out: Vec<VertexId> = self
            .vertices
            .get(&id)
            .map(|v| v.dependencies.iter().copied().collect())
            .unwrap_or_default();
        out.sort();
        out
    }

    /// Formula vertices with a reference that intersects `region` on `sheet`.
    pub fn find_dependent_formula(&self, region: &Region, sheet: &str) -> Vec<VertexId> {
        let Some(i) = self.sheet_index(sheet) else {
            return Vec::new();
        };
        let sheet = &self.sheets[i];
        let mut out: Vec<VertexId> = sheet
            .ranges
            .get_data_regions(region)
            .into_iter()
            .map(|e| e.data)
            .collect();
        for (_, id) in sheet
            .cells
            .range((region.top, 0)..)
            .take_while(|((row, _), _)| *row <= region.bottom)
            .filter(|((row, col), _)| region.contains(*row, *col))
        {
            if let Some(v) = self.vertices.get(id) {
                out.extend(v.dependents.iter().copied());
            }
        }
        out.sort();
        out.dedup();
        out
    }

    pub(crate) fn depends_on_self(&self, id: VertexId) -> bool {
        let Some(vertex) = self.vertices.get(&id) else {
            return false;
        };
        if vertex.dependencies.contains(&id) {
            return true;
        }
        match &vertex.key {
            VertexKey::Cell { sheet, row, col } => vertex
                .range_refs
                .iter()
                .any(|(s, e)| s == sheet && e.region.contains(*row, *col)),
            VertexKey::Named(_) => false,
        }
    }
}
