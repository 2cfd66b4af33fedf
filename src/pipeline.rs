//! Batch pipeline: one call turns up to four uploaded exports into reports.
//!
//! The caller states what it uploaded ([`UploadBatch`]) and which reports it
//! wants ([`Mode`]). Nothing is kept between calls. Each report is produced or
//! fails on its own, so a schema problem in the page exports does not hide a
//! good domain report when both are requested.

use log::{info, warn};

use crate::{
    aliases,
    coerce::coerce_numeric,
    error::PipelineError,
    join::{JoinKind, join},
    keys::{key_cell, normalize_domain_key, normalize_page_key, root_domain_cell},
    report::{
        DOMAIN, DOMAIN_PREFIX, PAGE_PREFIX, ROOT_DOMAIN, Report, ReportKind, URL, add_ratios,
        build_report,
    },
    schema::{CanonicalSchema, TableRole},
    table::{Cell, Table},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Domain,
    Page,
    /// Domain and page reports, built independently.
    Both,
    /// Page rows attached to their root domain's row.
    Combined,
}

impl Mode {
    pub fn report_kinds(&self) -> &'static [ReportKind] {
        match self {
            Mode::Domain => &[ReportKind::Domain],
            Mode::Page => &[ReportKind::Page],
            Mode::Both => &[ReportKind::Domain, ReportKind::Page],
            Mode::Combined => &[ReportKind::Combined],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadBatch {
    pub domain_referrer: Option<Table>,
    pub domain_trust: Option<Table>,
    pub page_referrer: Option<Table>,
    pub page_trust: Option<Table>,
}

impl UploadBatch {
    pub fn table(&self, role: TableRole) -> Option<&Table> {
        match role {
            TableRole::DomainReferrer => self.domain_referrer.as_ref(),
            TableRole::DomainTrust => self.domain_trust.as_ref(),
            TableRole::PageReferrer => self.page_referrer.as_ref(),
            TableRole::PageTrust => self.page_trust.as_ref(),
        }
    }
}

#[derive(Debug)]
pub struct ReportOutcome {
    pub kind: ReportKind,
    pub result: Result<Report, PipelineError>,
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Domain,
    Page,
}

impl Level {
    fn roles(&self) -> (TableRole, TableRole) {
        match self {
            Level::Domain => (TableRole::DomainReferrer, TableRole::DomainTrust),
            Level::Page => (TableRole::PageReferrer, TableRole::PageTrust),
        }
    }

    fn key_column(&self) -> &'static str {
        match self {
            Level::Domain => DOMAIN,
            Level::Page => URL,
        }
    }

    fn normalizer(&self) -> fn(&str) -> String {
        match self {
            Level::Domain => normalize_domain_key,
            Level::Page => normalize_page_key,
        }
    }

    fn stage(&self) -> &'static str {
        match self {
            Level::Domain => "domain referrer/trust",
            Level::Page => "page referrer/trust",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    schema: CanonicalSchema,
}

impl Pipeline {
    pub fn new(schema: CanonicalSchema) -> Self {
        Self { schema }
    }

    pub fn run(&self, mode: Mode, batch: &UploadBatch) -> Vec<ReportOutcome> {
        mode.report_kinds()
            .iter()
            .map(|kind| {
                let result = self.build(*kind, batch);
                match &result {
                    Ok(report) => info!(
                        "Built {kind} report with {} row(s)",
                        report.table().row_count()
                    ),
                    Err(err) => warn!("Skipping {kind} report: {err}"),
                }
                ReportOutcome {
                    kind: *kind,
                    result,
                }
            })
            .collect()
    }

    pub fn build(&self, kind: ReportKind, batch: &UploadBatch) -> Result<Report, PipelineError> {
        match kind {
            ReportKind::Domain => {
                let joined = self.metrics(Level::Domain, kind, batch)?;
                Ok(build_report(kind, &joined))
            }
            ReportKind::Page => {
                let joined = self.page_metrics(kind, batch)?;
                Ok(build_report(kind, &joined))
            }
            ReportKind::Combined => self.combined(batch),
        }
    }

    fn combined(&self, batch: &UploadBatch) -> Result<Report, PipelineError> {
        let kind = ReportKind::Combined;
        let domains = build_report(ReportKind::Domain, &self.metrics(Level::Domain, kind, batch)?)
            .table()
            .clone()
            .with_prefix(DOMAIN_PREFIX, &[DOMAIN]);
        let pages = build_report(ReportKind::Page, &self.page_metrics(kind, batch)?)
            .table()
            .clone()
            .with_prefix(PAGE_PREFIX, &[]);

        let page_root = format!("{PAGE_PREFIX}{ROOT_DOMAIN}");
        let joined = join(&domains, &pages, DOMAIN, &page_root, JoinKind::Left)?;
        if joined.is_empty() {
            return Err(PipelineError::NoMatchingKeys {
                kind,
                stage: "domain/page",
            });
        }
        Ok(build_report(kind, &joined))
    }

    fn page_metrics(&self, kind: ReportKind, batch: &UploadBatch) -> Result<Table, PipelineError> {
        let mut joined = self.metrics(Level::Page, kind, batch)?;
        let roots = joined
            .column_values(URL)
            .unwrap_or_default()
            .into_iter()
            .map(root_domain_cell)
            .collect::<Vec<_>>();
        let unjoinable = roots.iter().filter(|cell| cell.is_none()).count();
        if unjoinable > 0 {
            warn!("{unjoinable} page(s) have no recognizable root domain");
        }
        joined.set_column(ROOT_DOMAIN, roots);
        Ok(joined)
    }

    /// Referrer ⋈ trust for one level, with ratios attached.
    fn metrics(
        &self,
        level: Level,
        kind: ReportKind,
        batch: &UploadBatch,
    ) -> Result<Table, PipelineError> {
        let (referrer_role, trust_role) = level.roles();
        let referrer = self.prepare(level, referrer_role, kind, batch)?;
        let trust = self.prepare(level, trust_role, kind, batch)?;

        let key = level.key_column();
        let mut joined = join(&referrer, &trust, key, key, JoinKind::Inner)?;
        if joined.is_empty() {
            return Err(PipelineError::NoMatchingKeys {
                kind,
                stage: level.stage(),
            });
        }
        add_ratios(&mut joined);
        Ok(joined)
    }

    /// Resolves headers, coerces numeric fields, and derives the join key.
    /// The result holds the key column followed by the role's canonical fields.
    fn prepare(
        &self,
        level: Level,
        role: TableRole,
        kind: ReportKind,
        batch: &UploadBatch,
    ) -> Result<Table, PipelineError> {
        let source = batch
            .table(role)
            .ok_or(PipelineError::MissingInput { kind, role })?;
        let schema = self.schema.role(role);

        let mut table = source.clone();
        aliases::resolve_role(&mut table, role, schema)?;
        let degraded = coerce_numeric(&mut table, &schema.numeric_fields());
        if degraded > 0 {
            info!("{role}: {degraded} non-numeric cell(s) treated as missing");
        }

        let keys: Vec<Cell> = table
            .column_values(&schema.key)
            .unwrap_or_default()
            .into_iter()
            .map(|raw| key_cell(raw, level.normalizer()))
            .collect();
        let unjoinable = keys.iter().filter(|k| k.is_none()).count();
        if unjoinable > 0 {
            warn!("{role}: {unjoinable} row(s) have an empty key and cannot match");
        }

        let mut columns = vec![level.key_column()];
        columns.extend(schema.value_fields());
        let mut prepared = table.select(&columns[1..]);
        prepared.set_column(level.key_column(), keys);
        Ok(prepared.select(&columns))
    }
}

/// Runs the pipeline with the built-in alias table.
pub fn run(mode: Mode, batch: &UploadBatch) -> Vec<ReportOutcome> {
    Pipeline::default().run(mode, batch)
}
