use datasheet_common::CellValue;
use datasheet_eval::{EngineConfig, FormulaEngine, VariableInfo, VariableValue};

use crate::commands::{Command, CommandManager};
use crate::config::WorkbookConfig;
use crate::data::WorkbookData;
use crate::error::WorkbookError;
use crate::events::SheetEvent;
use crate::sheet::{Sheet, Sheets};

/// Sheets, the formula engine and the command history.
///
/// Cell contents change only through [`Workbook::execute_command`] (or the
/// `execute` shorthand), so every edit can be undone. Adding, removing and
/// renaming sheets are not commands; removing or renaming a sheet clears
/// the history.
#[derive(Debug)]
pub struct Workbook {
    data: WorkbookData,
    commands: CommandManager,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    pub fn new() -> Self {
        Self::with_config(WorkbookConfig::default(), EngineConfig::default())
    }

    pub fn with_config(config: WorkbookConfig, engine: EngineConfig) -> Self {
        Self::with_engine(config, FormulaEngine::new(engine))
    }

    pub fn with_engine(config: WorkbookConfig, engine: FormulaEngine) -> Self {
        let commands = CommandManager::new(config.max_history);
        Self {
            data: WorkbookData::new(config, engine),
            commands,
        }
    }

    pub fn data(&self) -> &WorkbookData {
        &self.data
    }

    pub fn engine(&self) -> &FormulaEngine {
        self.data.engine()
    }

    pub fn commands(&self) -> &CommandManager {
        &self.commands
    }

    pub fn sheets(&self) -> &Sheets {
        self.data.sheets()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.data.sheet(name)
    }

    /* ───────────────────────────── sheets ───────────────────────────── */

    pub fn add_sheet(&mut self, name: &str) -> Result<(), WorkbookError> {
        self.data.add_sheet(name)
    }

    pub fn remove_sheet(&mut self, name: &str) -> Result<(), WorkbookError> {
        self.data.remove_sheet(name)?;
        self.commands.clear();
        Ok(())
    }

    pub fn rename_sheet(&mut self, old: &str, new: &str) -> Result<(), WorkbookError> {
        self.data.rename_sheet(old, new)?;
        self.commands.clear();
        Ok(())
    }

    /* ──────────────────────────── commands ──────────────────────────── */

    /// Run a command. Returns `false` when it was refused, leaving the
    /// workbook unchanged.
    pub fn execute_command(
        &mut self,
        command: Box<dyn Command>,
        is_redo: bool,
        use_undo: bool,
    ) -> bool {
        self.commands
            .execute_command(&mut self.data, command, is_redo, use_undo)
    }

    /// Run and record a command.
    pub fn execute(&mut self, command: impl Command + 'static) -> bool {
        self.execute_command(Box::new(command), false, true)
    }

    pub fn undo(&mut self) -> bool {
        self.commands.undo(&mut self.data)
    }

    pub fn redo(&mut self) -> bool {
        self.commands.redo(&mut self.data)
    }

    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }

    pub fn begin_command_group(&mut self, name: &str) {
        self.commands.begin_command_group(&mut self.data, name);
    }

    pub fn end_command_group(&mut self) -> bool {
        self.commands.end_command_group(&mut self.data)
    }

    /// Hold events and recalculation until the matching `end_batch`.
    pub fn begin_batch(&mut self) {
        self.data.begin_batch();
    }

    pub fn end_batch(&mut self) {
        self.data.end_batch();
    }

    pub fn drain_events(&mut self) -> Vec<SheetEvent> {
        self.data.drain_events()
    }

    /* ─────────────────────────── calculation ────────────────────────── */

    pub fn calculate(&mut self, all: bool) {
        self.data.calculate(all);
    }

    pub fn set_variable(&mut self, name: &str, value: VariableValue) -> Result<(), WorkbookError> {
        self.data.set_variable(name, value)
    }

    /// Bind a variable to formula text.
    pub fn set_variable_formula(&mut self, name: &str, formula: &str) -> Result<(), WorkbookError> {
        let ast = self.data.parse_formula(formula)?;
        self.data.set_variable(name, VariableValue::Formula(ast))
    }

    pub fn get_variable(&self, name: &str) -> Option<CellValue> {
        self.data.get_variable(name)
    }

    pub fn clear_variable(&mut self, name: &str) {
        self.data.clear_variable(name);
    }

    pub fn variables(&self) -> Vec<VariableInfo> {
        self.data.variables()
    }

    /* ───────────────────────────── reads ────────────────────────────── */

    /// The value at a cell; empty for unknown sheets.
    pub fn get_value(&self, sheet: &str, row: u32, col: u32) -> CellValue {
        self.data
            .sheet(sheet)
            .map(|s| s.get_value(row, col))
            .unwrap_or_default()
    }

    pub fn get_formula(&self, sheet: &str, row: u32, col: u32) -> Option<String> {
        self.data.sheet(sheet).and_then(|s| s.get_formula(row, col))
    }
}
