//! Cycle detection over the `child_groups` graph.
//!
//! The graph is a DAG with shared children, so every traversal carries a
//! visited set. Cost is bounded by the edges reachable from the start group,
//! never by the total group count.

use rustc_hash::{FxHashMap, FxHashSet};

use super::{GroupId, Hierarchy};

impl Hierarchy {
    /// Every group reachable from `id` through `child_groups` edges,
    /// excluding `id` itself unless the graph is already cyclic.
    #[must_use]
    pub fn descendants(&self, id: GroupId) -> FxHashSet<GroupId> {
        let mut visited = FxHashSet::default();
        let mut stack: Vec<GroupId> = self
            .groups
            .get(&id)
            .map(|g| g.child_groups.clone())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(g) = self.groups.get(&current) {
                stack.extend(
                    g.child_groups.iter().filter(|c| !visited.contains(c)),
                );
            }
        }
        visited
    }

    /// Whether `ancestor` can reach `descendant` by one or more edges.
    #[must_use]
    pub fn is_descendant(
        &self,
        ancestor: GroupId,
        descendant: GroupId,
    ) -> bool {
        let mut visited = FxHashSet::default();
        let mut stack = vec![ancestor];
        while let Some(current) = stack.pop() {
            let Some(g) = self.groups.get(&current) else {
                continue;
            };
            for &child in &g.child_groups {
                if child == descendant {
                    return true;
                }
                if visited.insert(child) {
                    stack.push(child);
                }
            }
        }
        false
    }

    /// Whether adding the edge `proposed_parent -> proposed_child` would
    /// close a cycle: true iff the parent is the child itself or already
    /// lies below it.
    #[must_use]
    pub fn would_create_cycle(
        &self,
        proposed_parent: GroupId,
        proposed_child: GroupId,
    ) -> bool {
        proposed_parent == proposed_child
            || self.is_descendant(proposed_child, proposed_parent)
    }

    /// First cycle found in the graph, as the path of ids that closes it
    /// (first and last entries equal). `None` when the graph is acyclic.
    ///
    /// Only loaded data can contain a cycle; live mutations reject them.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<GroupId>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            InProgress,
            Done,
        }

        let mut marks = FxHashMap::default();
        let mut roots: Vec<_> = self.groups.keys().copied().collect();
        roots.sort_unstable();

        for root in roots {
            if marks.contains_key(&root) {
                continue;
            }
            // (group, index of the next child to visit)
            let mut path: Vec<(GroupId, usize)> = vec![(root, 0)];
            let _ = marks.insert(root, Mark::InProgress);
            while let Some(top) = path.last_mut() {
                let (current, next) = *top;
                top.1 += 1;
                let children = self
                    .groups
                    .get(&current)
                    .map_or(&[][..], |g| g.child_groups.as_slice());
                if let Some(&child) = children.get(next) {
                    match marks.get(&child) {
                        Some(Mark::InProgress) => {
                            let start = path
                                .iter()
                                .position(|&(id, _)| id == child)
                                .unwrap_or(0);
                            let mut cycle: Vec<_> = path[start..]
                                .iter()
                                .map(|&(id, _)| id)
                                .collect();
                            cycle.push(child);
                            return Some(cycle);
                        }
                        Some(Mark::Done) => {}
                        None => {
                            let _ = marks.insert(child, Mark::InProgress);
                            path.push((child, 0));
                        }
                    }
                } else {
                    let _ = marks.insert(current, Mark::Done);
                    let _ = path.pop();
                }
            }
        }
        None
    }
}
