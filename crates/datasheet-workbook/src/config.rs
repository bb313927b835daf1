/// Configuration for a [`crate::Workbook`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookConfig {
    /// Rows in a newly added sheet.
    pub default_rows: u32,
    /// Columns in a newly added sheet.
    pub default_cols: u32,
    /// Commands kept on the undo stack; the oldest are dropped first.
    pub max_history: usize,
    pub default_row_height: f64,
    pub default_col_width: f64,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            default_rows: 1000,
            default_cols: 26,
            max_history: 100,
            default_row_height: 24.0,
            default_col_width: 105.0,
        }
    }
}
