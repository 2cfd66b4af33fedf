//! Canonical schema: the per-role field list and the historical header aliases.
//!
//! Each export family drifts its header names between revisions. Instead of
//! forking the pipeline per revision, every accepted spelling is recorded here
//! as data. [`CanonicalSchema::builtin()`] carries the aliases observed so far;
//! a YAML file with the same shape can replace it at runtime.
//!
//! ## Responsibilities
//!
//! - The [`TableRole`] enumeration (domain/page × referrer/trust)
//! - Required, numeric, and alias metadata per [`CanonicalField`]
//! - YAML loading and saving via `serde_yaml`, with validation on load

use std::{collections::HashMap, fmt, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Serialize};

pub const CURRENT_SCHEMA_VERSION: &str = "1.0.0";

pub const TARGET: &str = "Target";
pub const ITEM: &str = "Item";
pub const DOMAIN_RATING: &str = "Domain Rating";
pub const URL_RATING: &str = "URL Rating";
pub const REF_DOMAINS_DOFOLLOW: &str = "Ref domains Dofollow";
pub const LINKED_DOMAINS: &str = "Linked Domains";
pub const TOTAL_TRAFFIC: &str = "Total Traffic";
pub const TRUST_FLOW: &str = "TrustFlow";
pub const CITATION_FLOW: &str = "CitationFlow";

pub const TOPICAL_COLUMNS: [&str; 6] = [
    "TopicalTrustFlow_Topic_0",
    "TopicalTrustFlow_Value_0",
    "TopicalTrustFlow_Topic_1",
    "TopicalTrustFlow_Value_1",
    "TopicalTrustFlow_Topic_2",
    "TopicalTrustFlow_Value_2",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableRole {
    DomainReferrer,
    DomainTrust,
    PageReferrer,
    PageTrust,
}

impl TableRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableRole::DomainReferrer => "domain referrer export",
            TableRole::DomainTrust => "domain trust export",
            TableRole::PageReferrer => "page referrer export",
            TableRole::PageTrust => "page trust export",
        }
    }
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub numeric: bool,
}

impl CanonicalField {
    fn new(name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            required: false,
            numeric: false,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleSchema {
    pub key: String,
    pub fields: Vec<CanonicalField>,
}

impl RoleSchema {
    pub fn field(&self, name: &str) -> Option<&CanonicalField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn numeric_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.numeric)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Canonical field names other than the join key, in declaration order.
    pub fn value_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.name != self.key)
            .map(|f| f.name.as_str())
            .collect()
    }

    fn validate(&self, role: TableRole) -> Result<()> {
        ensure!(!self.fields.is_empty(), "{role} defines no fields");
        let mut owners: HashMap<String, &str> = HashMap::new();
        for field in &self.fields {
            ensure!(
                !field.name.trim().is_empty(),
                "{role} contains a field with an empty name"
            );
            for spelling in std::iter::once(&field.name).chain(field.aliases.iter()) {
                let folded = spelling.trim().to_ascii_lowercase();
                if let Some(owner) = owners.insert(folded, &field.name)
                    && owner != field.name
                {
                    return Err(anyhow!(
                        "{role}: header '{spelling}' is claimed by both '{owner}' and '{}'",
                        field.name
                    ));
                }
            }
        }
        ensure!(
            self.field(&self.key).is_some(),
            "{role}: key field '{}' is not listed among the fields",
            self.key
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    pub domain_referrer: RoleSchema,
    pub domain_trust: RoleSchema,
    pub page_referrer: RoleSchema,
    pub page_trust: RoleSchema,
}

impl Default for CanonicalSchema {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CanonicalSchema {
    pub fn builtin() -> Self {
        Self {
            schema_version: Some(CURRENT_SCHEMA_VERSION.to_string()),
            domain_referrer: referrer_schema(
                &["Domain", "URL", "Url"],
                CanonicalField::new(DOMAIN_RATING, &["DomainRating", "DR"]),
            ),
            domain_trust: trust_schema(),
            page_referrer: referrer_schema(
                &["URL", "Url", "Page URL"],
                CanonicalField::new(URL_RATING, &["URLRating", "UR"]),
            ),
            page_trust: trust_schema(),
        }
    }

    pub fn role(&self, role: TableRole) -> &RoleSchema {
        match role {
            TableRole::DomainReferrer => &self.domain_referrer,
            TableRole::DomainTrust => &self.domain_trust,
            TableRole::PageReferrer => &self.page_referrer,
            TableRole::PageTrust => &self.page_trust,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for role in [
            TableRole::DomainReferrer,
            TableRole::DomainTrust,
            TableRole::PageReferrer,
            TableRole::PageTrust,
        ] {
            self.role(role).validate(role)?;
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening alias file {path:?}"))?;
        let reader = BufReader::new(file);
        let schema: CanonicalSchema =
            serde_yaml::from_reader(reader).context("Parsing alias YAML")?;
        schema
            .validate()
            .with_context(|| format!("Validating alias file {path:?}"))?;
        Ok(schema)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing alias table to YAML")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let file = File::create(path).with_context(|| format!("Creating alias file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing alias YAML")
    }
}

fn referrer_schema(target_aliases: &[&str], rating: CanonicalField) -> RoleSchema {
    RoleSchema {
        key: TARGET.to_string(),
        fields: vec![
            CanonicalField::new(TARGET, target_aliases).required(),
            rating.required().numeric(),
            CanonicalField::new(
                REF_DOMAINS_DOFOLLOW,
                &[
                    "RefDomainsDofollow",
                    "Ref domains / Dofollow",
                    "Referring domains dofollow",
                    "Dofollow ref. domains",
                ],
            )
            .numeric(),
            CanonicalField::new(
                LINKED_DOMAINS,
                &["LinkedDomains", "Linked domains", "Outgoing domains"],
            )
            .numeric(),
            CanonicalField::new(
                TOTAL_TRAFFIC,
                &["TotalTraffic", "Organic / Traffic", "Organic traffic", "Traffic"],
            )
            .numeric(),
        ],
    }
}

fn trust_schema() -> RoleSchema {
    let mut fields = vec![
        CanonicalField::new(ITEM, &["URL", "Domain"]).required(),
        CanonicalField::new(TRUST_FLOW, &["Trust Flow", "TF"])
            .required()
            .numeric(),
        CanonicalField::new(CITATION_FLOW, &["Citation Flow", "CF"])
            .required()
            .numeric(),
    ];
    for slot in 0..3 {
        fields.push(CanonicalField::new(
            &format!("TopicalTrustFlow_Topic_{slot}"),
            &[&format!("Topical Trust Flow Topic {slot}")],
        ));
        fields.push(
            CanonicalField::new(
                &format!("TopicalTrustFlow_Value_{slot}"),
                &[&format!("Topical Trust Flow Value {slot}")],
            )
            .numeric(),
        );
    }
    RoleSchema {
        key: ITEM.to_string(),
        fields,
    }
}
