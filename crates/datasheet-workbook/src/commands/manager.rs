use std::collections::VecDeque;

use super::{Command, CommandGroup, CommandState};
use crate::data::WorkbookData;

#[derive(Debug)]
struct Entry {
    command: Box<dyn Command>,
    state: CommandState,
}

/// Runs commands and keeps the undo and redo history.
///
/// The undo history is bounded; once full, the oldest command is dropped.
/// Running a new command (anything but a redo) clears the redo stack.
#[derive(Debug)]
pub struct CommandManager {
    undo: VecDeque<Entry>,
    redo: Vec<Entry>,
    max_history: usize,
    is_executing: bool,
    /// Commands collected between `begin_command_group` and the matching
    /// `end_command_group`.
    group: Option<CommandGroup>,
    group_depth: usize,
}

impl CommandManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_history,
            is_executing: false,
            group: None,
            group_depth: 0,
        }
    }

    pub fn is_executing(&self) -> bool {
        self.is_executing
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Name of the command `undo` would revert.
    pub fn undo_name(&self) -> Option<&str> {
        self.undo.back().map(|e| e.command.name())
    }

    pub fn redo_name(&self) -> Option<&str> {
        self.redo.last().map(|e| e.command.name())
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Run `command`. With `use_undo` it is recorded for undo, unless a
    /// command group is open, in which case it joins the group. Returns
    /// `false`, with nothing changed, when the command refuses to run.
    pub fn execute_command(
        &mut self,
        data: &mut WorkbookData,
        mut command: Box<dyn Command>,
        is_redo: bool,
        use_undo: bool,
    ) -> bool {
        if !self.run(data, command.as_mut(), is_redo) {
            return false;
        }
        if use_undo {
            self.keep(command, is_redo);
        }
        true
    }

    fn run(&mut self, data: &mut WorkbookData, command: &mut dyn Command, is_redo: bool) -> bool {
        if self.is_executing || !command.can_execute(data) {
            return false;
        }
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("command", name = command.name(), is_redo).entered();
        #[cfg(not(feature = "tracing"))]
        let _ = is_redo;

        self.is_executing = true;
        let ok = command.execute(data);
        self.is_executing = false;
        ok
    }

    fn keep(&mut self, command: Box<dyn Command>, is_redo: bool) {
        match self.group.as_mut() {
            Some(group) => group.push_executed(command),
            None => self.record(command, is_redo),
        }
    }

    fn record(&mut self, command: Box<dyn Command>, is_redo: bool) {
        if !is_redo {
            self.redo.clear();
        }
        if self.max_history == 0 {
            return;
        }
        while self.undo.len() >= self.max_history {
            self.undo.pop_front();
        }
        self.undo.push_back(Entry {
            command,
            state: CommandState::Executed,
        });
    }

    /// Revert the most recent command. A command that fails to revert stays
    /// on the undo stack.
    pub fn undo(&mut self, data: &mut WorkbookData) -> bool {
        if self.is_executing || self.group.is_some() {
            return false;
        }
        let Some(mut entry) = self.undo.pop_back() else {
            return false;
        };
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("undo", name = entry.command.name()).entered();

        self.is_executing = true;
        let ok = entry.state == CommandState::Executed && entry.command.undo(data);
        self.is_executing = false;
        if ok {
            entry.state = CommandState::Undone;
            self.redo.push(entry);
        } else {
            self.undo.push_back(entry);
        }
        ok
    }

    /// Re-run the most recently undone command. A command that fails to
    /// re-run stays on the redo stack.
    pub fn redo(&mut self, data: &mut WorkbookData) -> bool {
        if self.is_executing || self.group.is_some() {
            return false;
        }
        let Some(mut entry) = self.redo.pop() else {
            return false;
        };
        debug_assert_eq!(entry.state, CommandState::Undone);
        if self.run(data, entry.command.as_mut(), true) {
            self.keep(entry.command, true);
            true
        } else {
            self.redo.push(entry);
            false
        }
    }

    /// Open a command group. Commands executed until the matching
    /// [`end_command_group`](Self::end_command_group) are undone together.
    /// Groups nest; only the outermost one is recorded.
    pub fn begin_command_group(&mut self, data: &mut WorkbookData, name: &str) {
        if self.group_depth == 0 {
            self.group = Some(CommandGroup::new(name));
        }
        self.group_depth += 1;
        data.begin_batch();
    }

    /// Close a command group. Returns `false` when none was open.
    pub fn end_command_group(&mut self, data: &mut WorkbookData) -> bool {
        if self.group_depth == 0 {
            return false;
        }
        self.group_depth -= 1;
        data.end_batch();
        if self.group_depth == 0
            && let Some(group) = self.group.take()
            && !group.is_empty()
        {
            self.record(Box::new(group), false);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::SetCellValue;
    use crate::config::WorkbookConfig;
    use datasheet_common::CellValue;
    use datasheet_eval::FormulaEngine;

    fn data() -> WorkbookData {
        let mut data = WorkbookData::new(WorkbookConfig::default(), FormulaEngine::default());
        data.add_sheet("Sheet1").unwrap();
        data
    }

    fn a1(data: &WorkbookData) -> CellValue {
        data.sheet("Sheet1").unwrap().get_value(0, 0)
    }

    fn set(value: f64) -> Box<dyn Command> {
        Box::new(SetCellValue::new("Sheet1", 0, 0, value))
    }

    #[test]
    fn history_is_bounded() {
        let mut data = data();
        let mut manager = CommandManager::new(2);
        for v in 1..=3 {
            assert!(manager.execute_command(&mut data, set(v as f64), false, true));
        }
        assert_eq!(manager.undo_len(), 2);
        assert!(manager.undo(&mut data));
        assert!(manager.undo(&mut data));
        assert!(!manager.undo(&mut data));
        assert_eq!(a1(&data), CellValue::Number(1.0));
    }

    #[test]
    fn new_command_clears_redo() {
        let mut data = data();
        let mut manager = CommandManager::new(10);
        manager.execute_command(&mut data, set(1.0), false, true);
        manager.undo(&mut data);
        assert!(manager.can_redo());
        manager.execute_command(&mut data, set(2.0), false, true);
        assert!(!manager.can_redo());
    }

    #[test]
    fn redo_reapplies_and_keeps_redo_stack() {
        let mut data = data();
        let mut manager = CommandManager::new(10);
        manager.execute_command(&mut data, set(1.0), false, true);
        manager.execute_command(&mut data, set(2.0), false, true);
        manager.undo(&mut data);
        manager.undo(&mut data);
        assert_eq!(a1(&data), CellValue::Empty);
        assert!(manager.redo(&mut data));
        assert_eq!(a1(&data), CellValue::Number(1.0));
        assert_eq!(manager.redo_len(), 1);
        assert!(manager.redo(&mut data));
        assert_eq!(a1(&data), CellValue::Number(2.0));
    }

    #[test]
    fn unrecorded_commands_cannot_be_undone() {
        let mut data = data();
        let mut manager = CommandManager::new(10);
        assert!(manager.execute_command(&mut data, set(1.0), false, false));
        assert!(!manager.can_undo());
        assert_eq!(a1(&data), CellValue::Number(1.0));
    }

    #[test]
    fn grouped_commands_undo_together() {
        let mut data = data();
        let mut manager = CommandManager::new(10);
        manager.begin_command_group(&mut data, "typing");
        manager.execute_command(&mut data, set(1.0), false, true);
        manager.execute_command(
            &mut data,
            Box::new(SetCellValue::new("Sheet1", 1, 0, "b")),
            false,
            true,
        );
        assert!(!manager.undo(&mut data));
        assert!(manager.end_command_group(&mut data));
        assert_eq!(manager.undo_len(), 1);
        assert_eq!(manager.undo_name(), Some("typing"));

        assert!(manager.undo(&mut data));
        assert_eq!(a1(&data), CellValue::Empty);
        assert_eq!(data.sheet("Sheet1").unwrap().get_value(1, 0), CellValue::Empty);
        assert!(manager.redo(&mut data));
        assert_eq!(data.sheet("Sheet1").unwrap().get_value(1, 0), CellValue::from("b"));
    }

    /// Runs once; its undo always fails unless `undoable`.
    #[derive(Debug)]
    struct Once {
        runs: u32,
        undoable: bool,
    }

    impl Command for Once {
        fn name(&self) -> &str {
            "Once"
        }

        fn execute(&mut self, _data: &mut WorkbookData) -> bool {
            self.runs += 1;
            self.runs == 1
        }

        fn undo(&mut self, _data: &mut WorkbookData) -> bool {
            self.undoable
        }
    }

    #[test]
    fn failed_undo_keeps_the_entry() {
        let mut data = data();
        let mut manager = CommandManager::new(10);
        manager.execute_command(&mut data, set(1.0), false, true);
        let stuck = Once { runs: 0, undoable: false };
        assert!(manager.execute_command(&mut data, Box::new(stuck), false, true));

        assert!(!manager.undo(&mut data));
        assert!(!manager.undo(&mut data));
        assert_eq!(manager.undo_len(), 2);
        assert_eq!(manager.undo_name(), Some("Once"));
        assert!(!manager.can_redo());
        assert_eq!(a1(&data), CellValue::Number(1.0));
    }

    #[test]
    fn failed_redo_keeps_the_entry() {
        let mut data = data();
        let mut manager = CommandManager::new(10);
        let once = Once { runs: 0, undoable: true };
        assert!(manager.execute_command(&mut data, Box::new(once), false, true));
        assert!(manager.undo(&mut data));

        assert!(!manager.redo(&mut data));
        assert_eq!(manager.redo_len(), 1);
        assert_eq!(manager.redo_name(), Some("Once"));
        assert!(!manager.can_undo());
    }
}
