//! Header resolution against the canonical schema.
//!
//! [`resolve()`] maps one canonical field onto a source table's header row.
//! [`resolve_role()`] applies it to every field of a [`RoleSchema`] and turns
//! unresolved required fields into a single schema error.

use log::debug;

use crate::{
    error::PipelineError,
    schema::{RoleSchema, TableRole},
    table::Table,
};

fn is_header_noise(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

/// Trims whitespace and stray byte-order marks from every header.
pub fn trim_headers(table: &mut Table) {
    for header in table.headers_mut() {
        let trimmed = header.trim_matches(is_header_noise);
        if trimmed.len() != header.len() {
            *header = trimmed.to_string();
        }
    }
}

fn find_header(table: &Table, name: &str) -> Option<usize> {
    let wanted = name.trim();
    table
        .headers()
        .iter()
        .position(|h| h.eq_ignore_ascii_case(wanted))
}

/// Renames the column satisfying `canonical` (or its first present alias) to
/// the canonical spelling. Returns false, leaving headers untouched apart from
/// trimming, when neither is present.
///
/// Matching ignores ASCII case. With duplicate headers the left-most wins.
pub fn resolve<S: AsRef<str>>(table: &mut Table, canonical: &str, aliases: &[S]) -> bool {
    trim_headers(table);
    if let Some(idx) = find_header(table, canonical) {
        if table.headers()[idx] != canonical {
            debug!("Normalizing header '{}' to '{canonical}'", table.headers()[idx]);
            table.rename_column(idx, canonical);
        }
        return true;
    }
    for alias in aliases {
        if let Some(idx) = find_header(table, alias.as_ref()) {
            debug!("Resolved alias '{}' to '{canonical}'", table.headers()[idx]);
            table.rename_column(idx, canonical);
            return true;
        }
    }
    false
}

pub fn resolve_role(
    table: &mut Table,
    role: TableRole,
    schema: &RoleSchema,
) -> Result<(), PipelineError> {
    let mut missing = Vec::new();
    for field in &schema.fields {
        if resolve(table, &field.name, &field.aliases) {
            continue;
        }
        if field.required {
            missing.push(field.name.clone());
        } else {
            debug!("{role} has no '{}' column; it will be reported as missing", field.name);
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::Schema { role, missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CanonicalSchema;

    fn table(headers: &[&str]) -> Table {
        Table::from_strings(headers.iter().copied(), Vec::<Vec<&str>>::new())
    }

    #[test]
    fn resolve_renames_first_alias() {
        let mut t = table(&["Target", "Organic / Traffic"]);
        assert!(resolve(&mut t, "Total Traffic", &["TotalTraffic", "Organic / Traffic"]));
        assert_eq!(t.headers(), ["Target", "Total Traffic"]);
    }

    #[test]
    fn resolve_ignores_later_aliases() {
        let mut t = table(&["Traffic", "TotalTraffic"]);
        assert!(resolve(&mut t, "Total Traffic", &["TotalTraffic", "Traffic"]));
        assert_eq!(t.headers(), ["Traffic", "Total Traffic"]);
    }

    #[test]
    fn canonical_name_takes_precedence_over_aliases() {
        let mut t = table(&["TF", "trustflow"]);
        assert!(resolve(&mut t, "TrustFlow", &["TF"]));
        assert_eq!(t.headers(), ["TF", "TrustFlow"]);
    }

    #[test]
    fn resolve_trims_headers_and_byte_order_marks() {
        let mut t = table(&["\u{feff}Item ", "  TrustFlow"]);
        assert!(resolve(&mut t, "Item", &["URL"]));
        assert_eq!(t.headers(), ["Item", "TrustFlow"]);
        assert!(resolve(&mut t, "Item", &["URL"]));
        assert_eq!(t.headers(), ["Item", "TrustFlow"]);
    }

    #[test]
    fn resolve_reports_absent_field_without_changes() {
        let mut t = table(&["Target", "DR"]);
        let before = t.clone();
        assert!(!resolve(&mut t, "Total Traffic", &["Organic / Traffic"]));
        assert_eq!(t, before);
    }

    #[test]
    fn resolve_picks_leftmost_duplicate() {
        let mut t = table(&["DR", "DR"]);
        assert!(resolve(&mut t, "Domain Rating", &["DR"]));
        assert_eq!(t.headers(), ["Domain Rating", "DR"]);
    }

    #[test]
    fn resolve_role_lists_every_missing_required_field() {
        let schema = CanonicalSchema::builtin();
        let mut t = table(&["Item", "Topical Trust Flow Topic 0"]);
        let err = resolve_role(&mut t, TableRole::DomainTrust, &schema.domain_trust).unwrap_err();
        match err {
            PipelineError::Schema { role, missing } => {
                assert_eq!(role, TableRole::DomainTrust);
                assert_eq!(missing, vec!["TrustFlow", "CitationFlow"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(t.has_column("TopicalTrustFlow_Topic_0"));
    }

    #[test]
    fn resolve_role_accepts_optional_gaps() {
        let schema = CanonicalSchema::builtin();
        let mut t = table(&["Domain", "DR"]);
        resolve_role(&mut t, TableRole::DomainReferrer, &schema.domain_referrer)
            .expect("only optional fields missing");
        assert_eq!(t.headers(), ["Target", "Domain Rating"]);
    }
}
