use super::Command;
use crate::data::WorkbookData;
use crate::events::SheetEvent;

/// Commands applied as one step. If any member fails, the members that
/// already ran are undone in reverse and the group fails with nothing
/// changed.
///
/// A group runs inside a batch window: change events are coalesced and
/// recalculation happens once, when the outermost window closes.
#[derive(Debug)]
pub struct CommandGroup {
    name: String,
    commands: Vec<Box<dyn Command>>,
    /// Members that succeeded in the last execute.
    executed: usize,
}

impl CommandGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            executed: 0,
        }
    }

    pub fn with(mut self, command: impl Command + 'static) -> Self {
        self.commands.push(Box::new(command));
        self
    }

    pub fn push(&mut self, command: Box<dyn Command>) {
        self.commands.push(command);
    }

    /// Add a command that has already been executed on its own, so the
    /// group's undo reverts it too.
    pub(crate) fn push_executed(&mut self, command: Box<dyn Command>) {
        if self.executed == self.commands.len() {
            self.executed += 1;
        }
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn open(data: &mut WorkbookData) {
        data.begin_batch();
        data.emit(SheetEvent::ScreenUpdating(false));
    }

    fn close(data: &mut WorkbookData) {
        data.emit(SheetEvent::ScreenUpdating(true));
        data.end_batch();
    }

    fn rollback(&mut self, data: &mut WorkbookData, upto: usize) {
        for command in self.commands[..upto].iter_mut().rev() {
            command.undo(data);
        }
        self.executed = 0;
    }
}

impl Command for CommandGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        self.commands.first().is_none_or(|c| c.can_execute(data))
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        Self::open(data);
        for i in 0..self.commands.len() {
            let command = &mut self.commands[i];
            if !(command.can_execute(data) && command.execute(data)) {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    group = %self.name,
                    failed = command.name(),
                    undone = i,
                    "command group rolled back"
                );
                self.rollback(data, i);
                Self::close(data);
                return false;
            }
        }
        self.executed = self.commands.len();
        Self::close(data);
        true
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        if self.executed == 0 && !self.commands.is_empty() {
            return false;
        }
        Self::open(data);
        let mut ok = true;
        for command in self.commands[..self.executed].iter_mut().rev() {
            ok &= command.undo(data);
        }
        self.executed = 0;
        Self::close(data);
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{SetCellValue, SetFormula};
    use crate::config::WorkbookConfig;
    use datasheet_common::CellValue;
    use datasheet_eval::FormulaEngine;

    fn data() -> WorkbookData {
        let mut data = WorkbookData::new(WorkbookConfig::default(), FormulaEngine::default());
        data.add_sheet("Sheet1").unwrap();
        data
    }

    #[test]
    fn failing_member_rolls_back_earlier_ones() {
        let mut data = data();
        let mut group = CommandGroup::new("fill")
            .with(SetCellValue::new("Sheet1", 0, 0, 1.0))
            .with(SetCellValue::new("Sheet1", 5_000_000, 0, 2.0))
            .with(SetCellValue::new("Sheet1", 2, 0, 3.0));
        assert!(!group.execute(&mut data));
        assert_eq!(data.sheet("Sheet1").unwrap().get_value(0, 0), CellValue::Empty);
        assert_eq!(data.sheet("Sheet1").unwrap().get_value(2, 0), CellValue::Empty);
        assert!(!group.undo(&mut data));
    }

    #[test]
    fn recalculates_once_when_the_group_closes() {
        let mut data = data();
        let mut group = CommandGroup::new("model")
            .with(SetFormula::new("Sheet1", 0, 1, "=A1*10"))
            .with(SetCellValue::new("Sheet1", 0, 0, 4.0));
        data.drain_events();
        assert!(group.execute(&mut data));
        assert_eq!(data.sheet("Sheet1").unwrap().get_value(0, 1), CellValue::Number(40.0));

        let events = data.drain_events();
        assert_eq!(events.first(), Some(&SheetEvent::ScreenUpdating(false)));
        let changed = events
            .iter()
            .filter(|e| matches!(e, SheetEvent::CellsChanged { .. }))
            .count();
        assert_eq!(changed, 1);

        assert!(group.undo(&mut data));
        assert_eq!(data.sheet("Sheet1").unwrap().get_value(0, 0), CellValue::Empty);
        assert_eq!(data.sheet("Sheet1").unwrap().get_formula(0, 1), None);
    }
}
