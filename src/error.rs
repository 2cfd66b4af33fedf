use itertools::Itertools;
use thiserror::Error;

use crate::{report::ReportKind, schema::TableRole};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{role} is missing required column(s): {}", .missing.iter().join(", "))]
    Schema {
        role: TableRole,
        missing: Vec<String>,
    },
    #[error("{kind} report: no matching keys in the {stage} join")]
    NoMatchingKeys {
        kind: ReportKind,
        stage: &'static str,
    },
    #[error("{kind} report needs the {role}, which was not supplied")]
    MissingInput { kind: ReportKind, role: TableRole },
    #[error("join key column '{column}' is not present")]
    MissingKeyColumn { column: String },
    #[error("column '{column}' appears on both sides of a join")]
    ColumnCollision { column: String },
    #[error(
        "parse stage: could not read '{source_name}' with any supported encoding ({})",
        .attempts.iter().join("; ")
    )]
    Parse {
        source_name: String,
        attempts: Vec<String>,
    },
    #[error("writing {file_name}")]
    Write {
        file_name: &'static str,
        #[source]
        source: csv::Error,
    },
}
