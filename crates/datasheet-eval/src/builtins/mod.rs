//! The standard function set shipped with every engine.

pub mod info;
pub mod logical;
pub mod math;
pub mod random;
pub mod text;


use std::sync::Arc;

use datasheet_common::{CellError, CellValue};
use once_cell::sync::Lazy;

use crate::function::Function;
use crate::traits::ArgumentHandle;

static BUILTINS: Lazy<Vec<Arc<dyn Function>>> = Lazy::new(|| {
    let mut all: Vec<Arc<dyn Function>> = Vec::new();
    all.extend(math::functions());
    all.extend(logical::functions());
    all.extend(text::functions());
    all.extend(info::functions());
    all.extend(random::functions());
    all
});

pub fn builtins() -> Vec<Arc<dyn Function>> {
    BUILTINS.clone()
}

/// Numbers across all arguments. Referenced and array cells contribute only
/// when they hold numbers; direct scalars are coerced.
pub(crate) fn collect_numbers(args: &[ArgumentHandle<'_, '_>]) -> Result<Vec<f64>, CellError> {
    let mut out = Vec::new();
    for arg in args {
        if arg.is_collection() {
            out.extend(arg.values()?.into_iter().filter_map(|v| match v {
                CellValue::Number(n) => Some(n),
                _ => None,
            }));
        } else {
            match arg.scalar()? {
                CellValue::Empty => {}
                v => out.push(v.coerce_to_number()?),
            }
        }
    }
    Ok(out)
}
