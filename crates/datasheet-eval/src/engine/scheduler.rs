use rustc_hash::{FxHashMap, FxHashSet};

use super::graph::DependencyGraph;
use super::vertex::VertexId;

/// Strongly connected components of the graph, ordered so that every
/// component comes after the components it depends on.
pub struct Scheduler<'a> {
    graph: &'a DependencyGraph,
}

struct Frame {
    vertex: VertexId,
    successors: Vec<VertexId>,
    next: usize,
}

impl<'a> Scheduler<'a> {
    pub fn new(graph: &'a DependencyGraph) -> Self {
        Self { graph }
    }

    fn successors(&self, id: VertexId) -> Vec<VertexId> {
        self.graph.get_direct_dependents(id)
    }

    /// Tarjan over the subgraph reachable from `roots` through dependents,
    /// with an explicit stack in place of recursion.
    pub fn tarjan_scc(&self, roots: &[VertexId]) -> Vec<Vec<VertexId>> {
        let mut index_counter = 0usize;
        let mut indices: FxHashMap<VertexId, usize> = FxHashMap::default();
        let mut lowlinks: FxHashMap<VertexId, usize> = FxHashMap::default();
        let mut stack: Vec<VertexId> = Vec::new();
        let mut on_stack: FxHashSet<VertexId> = FxHashSet::default();
        let mut sccs = Vec::new();

        for &root in roots {
            if indices.contains_key(&root) {
                continue;
            }
            let mut work = vec![self.enter(
                root,
                &mut index_counter,
                &mut indices,
                &mut lowlinks,
                &mut stack,
                &mut on_stack,
            )];

            while let Some(frame) = work.last_mut() {
                if let Some(&next) = frame.successors.get(frame.next) {
                    frame.next += 1;
                    let v = frame.vertex;
                    if !indices.contains_key(&next) {
                        let child = self.enter(
                            next,
                            &mut index_counter,
                            &mut indices,
                            &mut lowlinks,
                            &mut stack,
                            &mut on_stack,
                        );
                        work.push(child);
                    } else if on_stack.contains(&next) {
                        let low = lowlinks[&v].min(indices[&next]);
                        lowlinks.insert(v, low);
                    }
                    continue;
                }

                let v = frame.vertex;
                work.pop();
                if let Some(parent) = work.last() {
                    let low = lowlinks[&parent.vertex].min(lowlinks[&v]);
                    lowlinks.insert(parent.vertex, low);
                }
                if lowlinks[&v] == indices[&v] {
                    let mut scc = Vec::new();
                    while let Some(w) = stack.pop() {
                        on_stack.remove(&w);
                        scc.push(w);
                        if w == v {
                            break;
                        }
                    }
                    scc.sort();
                    sccs.push(scc);
                }
            }
        }

        // Tarjan completes dependents first.
        sccs.reverse();
        sccs
    }

    fn enter(
        &self,
        vertex: VertexId,
        index_counter: &mut usize,
        indices: &mut FxHashMap<VertexId, usize>,
        lowlinks: &mut FxHashMap<VertexId, usize>,
        stack: &mut Vec<VertexId>,
        on_stack: &mut FxHashSet<VertexId>,
    ) -> Frame {
        indices.insert(vertex, *index_counter);
        lowlinks.insert(vertex, *index_counter);
        *index_counter += 1;
        stack.push(vertex);
        on_stack.insert(vertex);
        Frame {
            vertex,
            successors: self.successors(vertex),
            next: 0,
        }
    }

    /// A component is circular when it has several members or one member
    /// that references itself.
    pub fn is_circular(&self, scc: &[VertexId]) -> bool {
        match scc {
            [single] => self.graph.depends_on_self(*single),
            _ => scc.len() > 1,
        }
    }
}
