use std::collections::{HashMap, HashSet};

use log::{info, warn};

use crate::{
    error::PipelineError,
    table::{Cell, Table},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// Joins `left` and `right` on a single key column each.
///
/// The output holds every left column followed by every right column except
/// the right key. A non-key column name present on both sides is rejected:
/// callers prefix columns by role beforehand rather than relying on
/// positional suffixes. Missing keys never match. Duplicate keys fan out into
/// the cross-product of matching rows; rows keep left order, then right order.
pub fn join(
    left: &Table,
    right: &Table,
    left_key: &str,
    right_key: &str,
    kind: JoinKind,
) -> Result<Table, PipelineError> {
    let left_idx = key_index(left, left_key)?;
    let right_idx = key_index(right, right_key)?;

    let (headers, right_columns) = build_output_headers(left, right, right_idx)?;
    let lookup = build_right_lookup(right, right_idx);
    report_duplicates(left, left_idx, &lookup);

    let mut rows = Vec::new();
    let mut matched_rows = 0usize;
    for record in left.rows() {
        let bucket = record[left_idx]
            .as_ref()
            .and_then(|key| lookup.get(&key.as_display()));
        match bucket {
            Some(bucket) => {
                for right_row in bucket {
                    let mut combined = record.clone();
                    combined.extend(right_columns.iter().map(|idx| right_row[*idx].clone()));
                    rows.push(combined);
                    matched_rows += 1;
                }
            }
            None if kind == JoinKind::Left => {
                let mut combined = record.clone();
                combined.extend(right_columns.iter().map(|_| Cell::None));
                rows.push(combined);
            }
            None => {}
        }
    }

    info!(
        "{kind:?} join on '{left_key}' = '{right_key}': {} output row(s), {matched_rows} matched",
        rows.len()
    );
    Ok(Table::new(headers, rows))
}

fn key_index(table: &Table, key: &str) -> Result<usize, PipelineError> {
    table
        .column_index(key)
        .ok_or_else(|| PipelineError::MissingKeyColumn {
            column: key.to_string(),
        })
}

fn build_output_headers(
    left: &Table,
    right: &Table,
    right_key: usize,
) -> Result<(Vec<String>, Vec<usize>), PipelineError> {
    let mut headers = left.headers().to_vec();
    let seen: HashSet<&str> = left.headers().iter().map(String::as_str).collect();
    let mut right_columns = Vec::new();
    for (idx, name) in right.headers().iter().enumerate() {
        if idx == right_key {
            continue;
        }
        if seen.contains(name.as_str()) {
            return Err(PipelineError::ColumnCollision {
                column: name.clone(),
            });
        }
        headers.push(name.clone());
        right_columns.push(idx);
    }
    Ok((headers, right_columns))
}

fn build_right_lookup(right: &Table, key_idx: usize) -> HashMap<String, Vec<&[Cell]>> {
    let mut map: HashMap<String, Vec<&[Cell]>> = HashMap::new();
    for record in right.rows() {
        if let Some(key) = record[key_idx].as_ref() {
            map.entry(key.as_display())
                .or_default()
                .push(record.as_slice());
        }
    }
    map
}

fn report_duplicates(left: &Table, left_idx: usize, lookup: &HashMap<String, Vec<&[Cell]>>) {
    let right_dupes = lookup.values().filter(|bucket| bucket.len() > 1).count();
    let mut left_seen = HashSet::new();
    let mut left_dupes = HashSet::new();
    for record in left.rows() {
        if let Some(key) = record[left_idx].as_ref() {
            let key = key.as_display();
            if !left_seen.insert(key.clone()) {
                left_dupes.insert(key);
            }
        }
    }
    if right_dupes > 0 || !left_dupes.is_empty() {
        warn!(
            "Duplicate join keys: {} on the left, {right_dupes} on the right; matching rows fan out",
            left_dupes.len()
        );
    }
}
