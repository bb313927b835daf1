//! Per-pass evaluation state.

use std::cell::RefCell;

use datasheet_common::{CellValue, Region};
use datasheet_parse::{ASTNode, ReferenceType};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rustc_hash::FxHashMap;

use crate::engine::VertexKey;

/// A formula vertex of the circular group being evaluated.
#[derive(Debug, Clone)]
pub struct GroupMember {
    pub key: VertexKey,
    pub formula: ASTNode,
}

/// Memo of results computed this pass, the stack of formulas currently being
/// evaluated, and the circular group the engine is working through.
///
/// Created fresh for every recalculation pass.
#[derive(Debug)]
pub struct ExecutionContext {
    executed: RefCell<FxHashMap<VertexKey, CellValue>>,
    executing: RefCell<Vec<VertexKey>>,
    group: Vec<GroupMember>,
    rng: RefCell<SmallRng>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ExecutionContext {
    pub fn new(seed: u64) -> Self {
        Self {
            executed: RefCell::new(FxHashMap::default()),
            executing: RefCell::new(Vec::new()),
            group: Vec::new(),
            rng: RefCell::new(SmallRng::seed_from_u64(seed)),
        }
    }

    pub(crate) fn rng(&self) -> &RefCell<SmallRng> {
        &self.rng
    }

    /// Only circular groups are registered; for anything else pass an empty vec.
    pub fn set_current_group(&mut self, group: Vec<GroupMember>) {
        self.group = group;
    }

    pub fn current_group(&self) -> &[GroupMember] {
        &self.group
    }

    /// Whether `reference`, read from a formula on `home`, touches a member
    /// of the current circular group.
    pub fn is_in_scc_group(&self, reference: &ReferenceType, home: &str) -> bool {
        match reference {
            ReferenceType::Named(name) => self.named_member(name).is_some(),
            other => {
                let sheet = other.sheet().unwrap_or(home);
                other
                    .region()
                    .is_some_and(|region| !self.members_in(sheet, &region).is_empty())
            }
        }
    }

    pub(crate) fn named_member(&self, name: &str) -> Option<&GroupMember> {
        self.group
            .iter()
            .find(|m| matches!(&m.key, VertexKey::Named(n) if n == name))
    }

    pub(crate) fn members_in(&self, sheet: &str, region: &Region) -> Vec<&GroupMember> {
        self.group
            .iter()
            .filter(|m| match &m.key {
                VertexKey::Cell { sheet: s, row, col } => {
                    s.eq_ignore_ascii_case(sheet) && region.contains(*row, *col)
                }
                VertexKey::Named(_) => false,
            })
            .collect()
    }

    pub fn try_get_executed(&self, key: &VertexKey) -> Option<CellValue> {
        self.executed.borrow().get(key).cloned()
    }

    /// Keeps the first value recorded for a key.
    pub fn record_executed(&self, key: VertexKey, value: CellValue) {
        self.executed.borrow_mut().entry(key).or_insert(value);
    }

    pub fn is_executing(&self, key: &VertexKey) -> bool {
        self.executing.borrow().contains(key)
    }

    pub fn depth(&self) -> usize {
        self.executing.borrow().len()
    }

    pub(crate) fn push_executing(&self, key: VertexKey) {
        self.executing.borrow_mut().push(key);
    }

    pub(crate) fn pop_executing(&self) {
        self.executing.borrow_mut().pop();
    }

    pub fn clear_executing(&self) {
        self.executing.borrow_mut().clear();
    }

    pub fn clear(&self) {
        self.executing.borrow_mut().clear();
        self.executed.borrow_mut().clear();
    }
}
