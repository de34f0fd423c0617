// Identifier-keyed task dependency graph

use super::task::{Task, TaskId};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DagError {
    #[error("task {0} is not registered in the graph")]
    UnknownTask(TaskId),

    #[error("task {parent} has no dependency {dep}")]
    UnknownDependency { parent: TaskId, dep: TaskId },

    #[error("making {dep} a dependency of {parent} would close a cycle")]
    WouldCycle { parent: TaskId, dep: TaskId },

    #[error("the graph contains a cycle")]
    Cycle,
}

struct DagNode {
    task: Task,
    /// Number of direct dependencies of this task.
    in_degree: usize,
}

/// Registry of tasks keyed by identifier, with per-task dependency lists and
/// in-degree bookkeeping.
///
/// Every identifier appearing in a dependency list is also a key of the task
/// map. Edges that would close a cycle are rejected, and [`TaskDag::sorted`]
/// yields an execution order with dependencies ahead of their dependents.
pub struct TaskDag {
    tasks: HashMap<TaskId, DagNode>,
    deps: HashMap<TaskId, Vec<TaskId>>,
}

impl TaskDag {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            deps: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Direct dependency count of `id`.
    pub fn in_degree(&self, id: TaskId) -> Option<usize> {
        self.tasks.get(&id).map(|node| node.in_degree)
    }

    /// Direct dependencies of `id`.
    pub fn dependencies(&self, id: TaskId) -> Option<&[TaskId]> {
        self.deps.get(&id).map(|list| list.as_slice())
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id).map(|node| &mut node.task)
    }

    /// Register a task. An identifier already present keeps its existing
    /// entry; the incoming task is dropped.
    pub fn add_task(&mut self, task: Task) -> TaskId {
        let id = task.id();
        if !self.tasks.contains_key(&id) {
            self.tasks.insert(id, DagNode { task, in_degree: 0 });
            self.deps.insert(id, Vec::new());
        } else {
            crate::log_info!("task {} is already added earlier", id);
        }
        id
    }

    /// Register `dep` and record it as a direct dependency of `parent_id`.
    pub fn add_dependency(&mut self, parent_id: TaskId, dep: Task) -> Result<(), DagError> {
        if !self.tasks.contains_key(&parent_id) {
            return Err(DagError::UnknownTask(parent_id));
        }
        let dep_id = dep.id();
        if !self.tasks.contains_key(&dep_id) {
            self.tasks.insert(
                dep_id,
                DagNode {
                    task: dep,
                    in_degree: 0,
                },
            );
            self.deps.insert(dep_id, Vec::new());
        }
        self.add_dependency_edge(parent_id, dep_id)
    }

    /// Record an edge between two registered tasks: `parent_id` depends on
    /// `dep_id`. A duplicate edge is a no-op; an edge that would make the
    /// parent reachable from its own dependency is rejected.
    pub fn add_dependency_edge(&mut self, parent_id: TaskId, dep_id: TaskId) -> Result<(), DagError> {
        if !self.tasks.contains_key(&parent_id) {
            return Err(DagError::UnknownTask(parent_id));
        }
        if !self.tasks.contains_key(&dep_id) {
            return Err(DagError::UnknownTask(dep_id));
        }
        if self
            .deps
            .get(&parent_id)
            .is_some_and(|list| list.contains(&dep_id))
        {
            crate::log_info!("dependency {} has already been added", dep_id);
            return Ok(());
        }
        if dep_id == parent_id || self.reaches(dep_id, parent_id) {
            return Err(DagError::WouldCycle {
                parent: parent_id,
                dep: dep_id,
            });
        }

        self.deps.get_mut(&parent_id).unwrap().push(dep_id);
        self.tasks.get_mut(&parent_id).unwrap().in_degree += 1;
        Ok(())
    }

    /// Remove the dependency `dep_id` of `parent_id`, recursively removing
    /// the dependency's own dependencies first. Leaves are erased from both
    /// maps and the parent's in-degree is decremented.
    pub fn remove_dependency(&mut self, parent_id: TaskId, dep_id: TaskId) -> Result<(), DagError> {
        if !self.tasks.contains_key(&parent_id) {
            return Err(DagError::UnknownTask(parent_id));
        }
        if !self
            .deps
            .get(&parent_id)
            .is_some_and(|list| list.contains(&dep_id))
        {
            return Err(DagError::UnknownDependency {
                parent: parent_id,
                dep: dep_id,
            });
        }
        self.remove_recursive(parent_id, dep_id);
        Ok(())
    }

    fn remove_recursive(&mut self, parent_id: TaskId, dep_id: TaskId) {
        let children = self.deps.get(&dep_id).cloned().unwrap_or_default();
        for child in children {
            self.remove_recursive(dep_id, child);
        }
        // Now a leaf: erase it and settle the parent's bookkeeping.
        self.deps.remove(&dep_id);
        self.tasks.remove(&dep_id);
        if let Some(list) = self.deps.get_mut(&parent_id) {
            list.retain(|id| *id != dep_id);
        }
        if let Some(parent) = self.tasks.get_mut(&parent_id) {
            parent.in_degree = parent.in_degree.saturating_sub(1);
        }
    }

    /// True when `target` is reachable from `from` along dependency edges.
    fn reaches(&self, from: TaskId, target: TaskId) -> bool {
        let mut pending = vec![from];
        let mut seen = Vec::new();
        while let Some(id) = pending.pop() {
            if id == target {
                return true;
            }
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);
            if let Some(children) = self.deps.get(&id) {
                pending.extend(children.iter().copied());
            }
        }
        false
    }

    /// Topologically-sorted identifiers, dependencies ahead of dependents.
    /// Ties are broken by ascending identifier for a stable order.
    pub fn sorted(&self) -> Result<Vec<TaskId>, DagError> {
        let mut remaining: HashMap<TaskId, usize> = self
            .tasks
            .iter()
            .map(|(id, node)| (*id, node.in_degree))
            .collect();

        // Reverse adjacency: dependency -> the tasks that depend on it.
        let mut dependents: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
        for (parent, list) in &self.deps {
            for dep in list {
                dependents.entry(*dep).or_default().push(*parent);
            }
        }

        let mut frontier: Vec<TaskId> = remaining
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        frontier.sort_unstable();
        let mut frontier: VecDeque<TaskId> = frontier.into();

        let mut order = Vec::with_capacity(self.tasks.len());
        while let Some(id) = frontier.pop_front() {
            order.push(id);
            if let Some(parents) = dependents.get(&id) {
                let mut unlocked: Vec<TaskId> = Vec::new();
                for parent in parents {
                    let degree = remaining.get_mut(parent).unwrap();
                    *degree -= 1;
                    if *degree == 0 {
                        unlocked.push(*parent);
                    }
                }
                unlocked.sort_unstable();
                frontier.extend(unlocked);
            }
        }

        if order.len() != self.tasks.len() {
            return Err(DagError::Cycle);
        }
        Ok(order)
    }
}

impl Default for TaskDag {
    fn default() -> Self {
        Self::new()
    }
}
