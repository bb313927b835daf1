use std::time::{SystemTime, UNIX_EPOCH};

use datasheet_common::{Axis, CellError, CellValue, ErrorKind, Region};
use datasheet_parse::{ASTNode, ParserError, ReferenceType, parse_with_volatility_classifier};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use rustc_hash::FxHashSet;

use super::graph::{DependencyGraph, GraphChange, GraphRestoreData};
use super::scheduler::Scheduler;
use super::vertex::{VertexId, VertexKey};
use super::{EngineConfig, EngineError};
use crate::context::{ExecutionContext, GroupMember};
use crate::function_registry::FunctionRegistry;
use crate::interpreter::{Interpreter, shape_result};
use crate::traits::Environment;

/// What a named variable is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    Value(CellValue),
    Formula(ASTNode),
}

/// One row of [`FormulaEngine::variables`].
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    /// Formula text with the leading `=`, for formula-bound variables.
    pub formula: Option<String>,
    pub value: Option<CellValue>,
}

/// Owns the dependency graph and function registry and drives
/// recalculation against an [`Environment`].
///
/// The host reports edits through explicit calls (`set_formula`,
/// `on_cells_changed`, `on_rows_cols_inserted`, ...); the engine collects the
/// affected vertices and evaluates them on the next [`calculate`].
///
/// [`calculate`]: FormulaEngine::calculate
#[derive(Debug)]
pub struct FormulaEngine {
    config: EngineConfig,
    graph: DependencyGraph,
    functions: FunctionRegistry,
    requires_calculation: FxHashSet<VertexId>,
    is_calculating: bool,
    rng: SmallRng,
}

impl Default for FormulaEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl FormulaEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(config, FunctionRegistry::with_builtins())
    }

    pub fn with_registry(config: EngineConfig, functions: FunctionRegistry) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self {
            config,
            graph: DependencyGraph::new(),
            functions,
            requires_calculation: FxHashSet::default(),
            is_calculating: false,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Fix the seed volatile functions draw from.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    pub fn is_calculating(&self) -> bool {
        self.is_calculating
    }

    /// Vertices waiting for the next pass, by key.
    pub fn pending(&self) -> Vec<VertexKey> {
        let mut ids: Vec<VertexId> = self.requires_calculation.iter().copied().collect();
        ids.sort();
        self.keys(ids)
    }

    /// Parse formula text, flagging calls to volatile functions.
    pub fn parse_formula(&self, text: &str) -> Result<ASTNode, ParserError> {
        parse_with_volatility_classifier(text, self.functions.volatility_classifier())
    }

    /* ───────────────────────────── sheets ───────────────────────────── */

    pub fn add_sheet(&mut self, name: &str) -> Result<(), EngineError> {
        self.graph.add_sheet(name)?;
        let pending = self.graph.referencing_sheet(name);
        self.requires_calculation.extend(pending);
        Ok(())
    }

    pub fn remove_sheet(&mut self, name: &str) -> Result<GraphRestoreData, EngineError> {
        let restore = self.graph.remove_sheet(name)?;
        self.mark_changed(&restore);
        Ok(restore)
    }

    pub fn rename_sheet(&mut self, old: &str, new: &str) -> Result<GraphRestoreData, EngineError> {
        let restore = self.graph.rename_sheet(old, new)?;
        let touched = self.graph.referencing_sheet(new);
        self.requires_calculation.extend(touched);
        Ok(restore)
    }

    /* ──────────────────────────── formulas ──────────────────────────── */

    /// Assign or clear (`None`) the formula of a cell or variable.
    pub fn set_formula(
        &mut self,
        key: &VertexKey,
        formula: Option<ASTNode>,
    ) -> Result<GraphRestoreData, EngineError> {
        let restore = self.graph.set_formula(key, formula)?;
        self.mark_changed(&restore);
        Ok(restore)
    }

    /// Revert a change made through this engine.
    pub fn restore(&mut self, data: GraphRestoreData) {
        let structural = data
            .changes()
            .iter()
            .any(|c| !matches!(c, GraphChange::Formula { .. }));
        let keys: Vec<VertexKey> = data
            .changes()
            .iter()
            .filter_map(|c| match c {
                GraphChange::Formula { key, .. } => Some(key.clone()),
                _ => None,
            })
            .collect();
        self.graph.restore(data);
        if structural {
            let all = self.graph.vertex_ids();
            self.requires_calculation.extend(all);
        } else {
            for key in keys {
                self.mark_key(&key);
            }
        }
    }

    fn mark_key(&mut self, key: &VertexKey) {
        if let Some(id) = self.graph.vertex_id(key) {
            self.requires_calculation.insert(id);
        }
    }

    fn mark_changed(&mut self, data: &GraphRestoreData) {
        for change in data.changes() {
            match change {
                GraphChange::Formula { key, .. } => self.mark_key(key),
                GraphChange::RowsCols { rewritten, .. } => {
                    for (key, _) in rewritten {
                        self.mark_key(key);
                    }
                }
                GraphChange::SheetRemoved { .. } | GraphChange::SheetRenamed { .. } => {}
            }
        }
    }

    /* ──────────────────────────── notifications ─────────────────────── */

    /// Plain values changed at `positions` and over `regions` of `sheet`.
    /// Ignored while a pass is writing its own results.
    pub fn on_cells_changed(&mut self, sheet: &str, positions: &[(u32, u32)], regions: &[Region]) {
        if self.is_calculating {
            return;
        }
        let cells = positions.iter().map(|&(row, col)| Region::cell(row, col));
        for region in cells.chain(regions.iter().copied()) {
            let hits = self.graph.find_dependent_formula(&region, sheet);
            self.requires_calculation.extend(hits);
        }
    }

    pub fn on_rows_cols_inserted(
        &mut self,
        sheet: &str,
        axis: Axis,
        index: u32,
        count: u32,
    ) -> Result<GraphRestoreData, EngineError> {
        let restore = self.graph.insert_rows_cols(sheet, axis, index, count)?;
        self.mark_changed(&restore);
        Ok(restore)
    }

    pub fn on_rows_cols_removed(
        &mut self,
        sheet: &str,
        axis: Axis,
        index: u32,
        count: u32,
    ) -> Result<GraphRestoreData, EngineError> {
        let restore = self.graph.remove_rows_cols(sheet, axis, index, count)?;
        self.mark_changed(&restore);
        Ok(restore)
    }

    /* ──────────────────────────── queries ───────────────────────────── */

    fn keys(&self, ids: impl IntoIterator<Item = VertexId>) -> Vec<VertexKey> {
        ids.into_iter()
            .filter_map(|id| self.graph.key_of(id).cloned())
            .collect()
    }

    pub fn get_direct_dependents(&self, key: &VertexKey) -> Vec<VertexKey> {
        match self.graph.vertex_id(key) {
            Some(id) => self.keys(self.graph.get_direct_dependents(id)),
            None => Vec::new(),
        }
    }

    pub fn find_dependent_formula(&self, region: &Region, sheet: &str) -> Vec<VertexKey> {
        self.keys(self.graph.find_dependent_formula(region, sheet))
    }

    fn schedule(&self, roots: Option<&[VertexId]>) -> Vec<Vec<VertexId>> {
        let all;
        let roots = match roots {
            Some(r) => r,
            None => {
                all = self.graph.vertex_ids();
                &all
            }
        };
        Scheduler::new(&self.graph).tarjan_scc(roots)
    }

    /// Components reachable from `dirty` (or the whole graph), dependencies
    /// first.
    pub fn get_calculation_order(&self, dirty: Option<&[VertexKey]>) -> Vec<Vec<VertexKey>> {
        let roots: Option<Vec<VertexId>> = dirty.map(|keys| {
            let mut ids: Vec<VertexId> =
                keys.iter().filter_map(|k| self.graph.vertex_id(k)).collect();
            ids.sort();
            ids.dedup();
            ids
        });
        self.schedule(roots.as_deref())
            .into_iter()
            .map(|scc| self.keys(scc))
            .collect()
    }

    /* ──────────────────────────── evaluation ────────────────────────── */

    /// Evaluate a formula that is not part of the graph.
    pub fn evaluate(&mut self, formula: &ASTNode, sheet: &str, env: &dyn Environment) -> CellValue {
        let context = ExecutionContext::new(self.rng.next_u64());
        Interpreter::new(env, &self.functions, &context, sheet)
            .with_max_depth(self.config.max_iterations_per_group)
            .evaluate(formula)
    }

    /// Run one recalculation pass: every pending and volatile vertex and
    /// everything depending on them, or the whole graph when `calculate_all`.
    pub fn calculate(&mut self, env: &mut dyn Environment, calculate_all: bool) {
        if self.is_calculating {
            return;
        }
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "calculate",
            all = calculate_all,
            pending = self.requires_calculation.len()
        )
        .entered();

        self.is_calculating = true;
        let roots = (!calculate_all).then(|| {
            let mut ids: Vec<VertexId> = self
                .requires_calculation
                .iter()
                .copied()
                .chain(self.graph.volatile_ids())
                .collect();
            ids.sort();
            ids.dedup();
            ids
        });
        let order = self.schedule(roots.as_deref());
        let mut context = ExecutionContext::new(self.rng.next_u64());

        for scc in order {
            let circular = Scheduler::new(&self.graph).is_circular(&scc);
            let group: Vec<GroupMember> = if circular {
                scc.iter()
                    .filter_map(|&id| {
                        let v = self.graph.vertex(id)?;
                        Some(GroupMember {
                            key: v.key().clone(),
                            formula: v.formula()?.clone(),
                        })
                    })
                    .collect()
            } else {
                Vec::new()
            };
            #[cfg(feature = "tracing")]
            if circular {
                tracing::debug!(members = group.len(), "evaluating circular group");
            }
            context.set_current_group(group);

            let mut given_up = false;
            for id in scc {
                let Some(vertex) = self.graph.vertex(id) else {
                    continue;
                };
                let Some(formula) = vertex.formula() else {
                    continue;
                };
                let key = vertex.key().clone();

                let value = if given_up {
                    CellValue::Error(CellError::new(ErrorKind::Circular))
                } else if let Some(done) = context.try_get_executed(&key) {
                    done
                } else {
                    context.push_executing(key.clone());
                    let raw = Interpreter::new(&*env, &self.functions, &context, key.home_sheet())
                        .with_max_depth(self.config.max_iterations_per_group)
                        .evaluate(formula);
                    context.pop_executing();
                    let value = shape_result(raw, &key);
                    context.record_executed(key.clone(), value.clone());
                    value
                };
                context.clear_executing();

                #[cfg(feature = "tracing")]
                tracing::trace!(vertex = %key, value = %value, "evaluated");

                if circular && value.as_error().is_some_and(CellError::is_circular) {
                    given_up = true;
                }
                match &key {
                    VertexKey::Cell { sheet, row, col } => {
                        env.set_cell_value(*row, *col, sheet, value)
                    }
                    VertexKey::Named(name) => env.set_variable(name, value),
                }
            }
        }

        self.requires_calculation.clear();
        self.is_calculating = false;
    }

    fn calculate_if_auto(&mut self, env: &mut dyn Environment) {
        if self.config.auto_calculate {
            self.calculate(env, false);
        }
    }

    /* ──────────────────────────── variables ─────────────────────────── */

    /// Bind a workbook-level variable. Cell and range references inside a
    /// variable formula must name their sheet.
    pub fn set_variable(
        &mut self,
        env: &mut dyn Environment,
        name: &str,
        value: VariableValue,
    ) -> Result<(), EngineError> {
        if !matches!(ReferenceType::from_string(name), Ok(ReferenceType::Named(_))) {
            return Err(EngineError::InvalidName(name.to_string()));
        }
        let key = VertexKey::named(name);
        match value {
            VariableValue::Formula(formula) => {
                if let Some(reference) = formula
                    .get_dependencies()
                    .into_iter()
                    .find(|r| !matches!(r, ReferenceType::Named(_)) && r.sheet().is_none())
                {
                    return Err(EngineError::ImplicitSheetInVariable {
                        name: name.to_string(),
                        reference: reference.to_string(),
                    });
                }
                self.set_formula(&key, Some(formula))?;
            }
            VariableValue::Value(value) => {
                if self.graph.formula(&key).is_some() {
                    self.graph.set_formula(&key, None)?;
                }
                env.set_variable(name, value);
                self.mark_key(&key);
            }
        }
        self.calculate_if_auto(env);
        Ok(())
    }

    pub fn get_variable(&self, env: &dyn Environment, name: &str) -> Option<CellValue> {
        env.get_variable(name)
    }

    pub fn clear_variable(&mut self, env: &mut dyn Environment, name: &str) {
        let key = VertexKey::named(name);
        if self.graph.formula(&key).is_some() {
            // Clearing a formula on an existing sheet-less key cannot fail.
            let _ = self.graph.set_formula(&key, None);
        }
        env.clear_variable(name);
        self.mark_key(&key);
        self.calculate_if_auto(env);
    }

    /// Every variable with a value or a formula, sorted by name.
    pub fn variables(&self, env: &dyn Environment) -> Vec<VariableInfo> {
        let mut names: Vec<String> = env.variable_names();
        names.extend(self.graph.variable_names().map(str::to_string));
        names.sort();
        names.dedup();
        names
            .into_iter()
            .filter_map(|name| {
                let formula = self
                    .graph
                    .formula(&VertexKey::named(name.as_str()))
                    .map(ASTNode::to_formula);
                let value = env.get_variable(&name);
                (formula.is_some() || value.is_some()).then_some(VariableInfo {
                    name,
                    formula,
                    value,
                })
            })
            .collect()
    }
}
