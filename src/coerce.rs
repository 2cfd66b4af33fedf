use log::debug;

use crate::{
    data::{Value, parse_number},
    table::Table,
};

/// Converts the named columns to numbers in place.
///
/// Text that does not parse becomes missing. Columns the table does not have
/// are skipped. Returns how many non-empty cells degraded to missing.
pub fn coerce_numeric<S: AsRef<str>>(table: &mut Table, columns: &[S]) -> usize {
    let mut degraded = 0usize;
    for name in columns {
        let name = name.as_ref();
        let Some(idx) = table.column_index(name) else {
            continue;
        };
        let mut column_degraded = 0usize;
        for cell in table.column_cells_mut(idx) {
            let Some(Value::String(raw)) = cell.as_ref() else {
                continue;
            };
            let parsed = parse_number(raw);
            if parsed.is_none() && !raw.trim().is_empty() {
                column_degraded += 1;
            }
            *cell = parsed;
        }
        if column_degraded > 0 {
            debug!("Column '{name}': {column_degraded} non-numeric value(s) treated as missing");
        }
        degraded += column_degraded;
    }
    degraded
}
