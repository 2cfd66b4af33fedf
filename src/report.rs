//! Derived ratios and fixed-column report assembly.
//!
//! Every report kind has one column order that does not depend on which export
//! vintage was uploaded: columns an input lacks are still emitted, filled with
//! the missing marker.

use std::fmt;

use crate::{
    data::Value,
    error::PipelineError,
    io_utils,
    schema::{
        CITATION_FLOW, DOMAIN_RATING, LINKED_DOMAINS, REF_DOMAINS_DOFOLLOW, TOPICAL_COLUMNS,
        TOTAL_TRAFFIC, TRUST_FLOW, URL_RATING,
    },
    table::{Cell, Table},
};

pub const DOMAIN: &str = "Domain";
pub const URL: &str = "URL";
pub const ROOT_DOMAIN: &str = "Root Domain";
pub const LD_RD_RATIO: &str = "LD:RD Ratio";
pub const TF_CF_RATIO: &str = "TF:CF Ratio";

pub const DOMAIN_PREFIX: &str = "domain.";
pub const PAGE_PREFIX: &str = "page.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Domain,
    Page,
    Combined,
}

impl ReportKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            ReportKind::Domain => "domain_metrics.csv",
            ReportKind::Page => "page_metrics.csv",
            ReportKind::Combined => "domain_page_combined.csv",
        }
    }

    pub fn columns(&self) -> Vec<String> {
        match self {
            ReportKind::Domain => {
                let mut columns = vec![DOMAIN.to_string(), DOMAIN_RATING.to_string()];
                columns.extend(metric_columns());
                columns
            }
            ReportKind::Page => {
                let mut columns = vec![
                    URL.to_string(),
                    ROOT_DOMAIN.to_string(),
                    URL_RATING.to_string(),
                ];
                columns.extend(metric_columns());
                columns
            }
            ReportKind::Combined => {
                let mut columns = vec![DOMAIN.to_string()];
                columns.extend(
                    ReportKind::Domain
                        .columns()
                        .into_iter()
                        .skip(1)
                        .map(|c| format!("{DOMAIN_PREFIX}{c}")),
                );
                columns.extend(
                    ReportKind::Page
                        .columns()
                        .into_iter()
                        .filter(|c| c != ROOT_DOMAIN)
                        .map(|c| format!("{PAGE_PREFIX}{c}")),
                );
                columns
            }
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportKind::Domain => "domain",
            ReportKind::Page => "page",
            ReportKind::Combined => "combined",
        })
    }
}

fn metric_columns() -> Vec<String> {
    let mut columns = vec![
        REF_DOMAINS_DOFOLLOW.to_string(),
        LINKED_DOMAINS.to_string(),
        TRUST_FLOW.to_string(),
        CITATION_FLOW.to_string(),
    ];
    columns.extend(TOPICAL_COLUMNS.iter().map(|c| c.to_string()));
    columns.extend([
        LD_RD_RATIO.to_string(),
        TF_CF_RATIO.to_string(),
        TOTAL_TRAFFIC.to_string(),
    ]);
    columns
}

/// `numerator / denominator`, or missing when either side is missing or
/// non-numeric, the denominator is zero, or the quotient is not finite.
pub fn ratio(numerator: Option<&Value>, denominator: Option<&Value>) -> Cell {
    let numerator = numerator?.as_f64()?;
    let denominator = denominator?.as_f64()?;
    if denominator == 0.0 {
        return None;
    }
    let quotient = numerator / denominator;
    quotient.is_finite().then_some(Value::Float(quotient))
}

fn ratio_column(table: &Table, numerator: &str, denominator: &str) -> Vec<Cell> {
    (0..table.row_count())
        .map(|row| ratio(table.get(row, numerator), table.get(row, denominator)))
        .collect()
}

/// Sets `LD:RD Ratio` and `TF:CF Ratio` on every row.
pub fn add_ratios(table: &mut Table) {
    let ld_rd = ratio_column(table, LINKED_DOMAINS, REF_DOMAINS_DOFOLLOW);
    let tf_cf = ratio_column(table, TRUST_FLOW, CITATION_FLOW);
    table.set_column(LD_RD_RATIO, ld_rd);
    table.set_column(TF_CF_RATIO, tf_cf);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    kind: ReportKind,
    table: Table,
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn file_name(&self) -> &'static str {
        self.kind.file_name()
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, PipelineError> {
        io_utils::write_csv(&self.table).map_err(|source| PipelineError::Write {
            file_name: self.file_name(),
            source,
        })
    }
}

/// Projects joined data onto the fixed column order for `kind`.
pub fn build_report(kind: ReportKind, joined: &Table) -> Report {
    Report {
        kind,
        table: joined.select(&kind.columns()),
    }
}
