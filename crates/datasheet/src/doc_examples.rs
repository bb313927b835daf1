use crate::workbook::SetFormula;
use crate::{CellValue, Workbook};

/// Evaluate a formula in a one-sheet workbook and return its value.
///
/// # Example
///
/// ```rust
/// # use datasheet::doc_examples::eval_scalar;
/// let value = eval_scalar("=SUM(1,2,3)")?;
/// assert_eq!(value, datasheet::CellValue::Number(6.0));
/// # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
/// ```
pub fn eval_scalar(formula: &str) -> Result<CellValue, Box<dyn std::error::Error + Send + Sync>> {
    let mut workbook = Workbook::new();
    workbook.add_sheet("Sheet1")?;
    if !workbook.execute(SetFormula::new("Sheet1", 0, 0, formula)) {
        return Err(format!("formula refused: {formula}").into());
    }
    Ok(workbook.get_value("Sheet1", 0, 0))
}
