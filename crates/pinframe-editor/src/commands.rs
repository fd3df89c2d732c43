//! Undo/Redo command stack.
//!
//! Store edits return whole trees that share unchanged records, so every
//! history entry is a pair of tree snapshots. Undo swaps in `before`, redo
//! swaps in `after`; there is no inverse-mutation chain to keep in sync.
//!
//! Gestures and multi-node edits (`Session::apply_all`) use **batching**: the
//! tree is captured when the outermost batch opens and compared when it
//! closes, so the whole batch undoes in a single step.

use pinframe_core::tree::SceneTree;

/// One undoable step.
#[derive(Debug, Clone)]
pub struct Command {
    pub before: SceneTree,
    pub after: SceneTree,
    pub description: String,
}

/// Manages undo/redo stacks with batch grouping for gestures.
#[derive(Debug)]
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Tree captured when the outermost batch opened.
    batch_snapshot: Option<SceneTree>,
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(64)),
            redo_stack: Vec::new(),
            max_depth,
            batch_depth: 0,
            batch_snapshot: None,
        }
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Start a batch group. Edits recorded until the matching `end_batch`
    /// collapse into one undo step.
    pub fn begin_batch(&mut self, tree: &SceneTree) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(tree.clone());
        }
        self.batch_depth += 1;
    }

    /// End a batch group. When the outermost batch closes and the tree
    /// actually changed, push one snapshot command.
    pub fn end_batch(&mut self, tree: &SceneTree, description: &str) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return;
        }
        if let Some(before) = self.batch_snapshot.take() {
            self.push(before, tree.clone(), description);
        }
    }

    /// Record an edit that turned `before` into `after`. Inside a batch this
    /// is a no-op: the batch snapshot covers it.
    pub fn record(&mut self, before: SceneTree, after: &SceneTree, description: &str) {
        if self.is_batching() {
            return;
        }
        self.push(before, after.clone(), description);
    }

    fn push(&mut self, before: SceneTree, after: SceneTree, description: &str) {
        if before == after {
            log::debug!("history: '{description}' changed nothing, not recorded");
            return;
        }
        self.undo_stack.push(Command {
            before,
            after,
            description: description.to_string(),
        });
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
    }

    /// Undo the last command, writing its `before` snapshot into `tree`.
    pub fn undo(&mut self, tree: &mut SceneTree) -> Option<String> {
        let cmd = self.undo_stack.pop()?;
        *tree = cmd.before.clone();
        let desc = cmd.description.clone();
        self.redo_stack.push(cmd);
        Some(desc)
    }

    /// Redo the last undone command, writing its `after` snapshot into `tree`.
    pub fn redo(&mut self, tree: &mut SceneTree) -> Option<String> {
        let cmd = self.redo_stack.pop()?;
        *tree = cmd.after.clone();
        let desc = cmd.description.clone();
        self.undo_stack.push(cmd);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }
}
