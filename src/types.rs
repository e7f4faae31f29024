use crate::constants::{self, UNAVAILABLE};
use crate::error::{EngineError, Result};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The closed set of catalogs the engine knows how to query and extract.
///
/// Adding a catalog means adding a variant here plus its selector chains in
/// `extract::catalog`; the orchestrator and aggregator stay untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Praktis,
    Praktiker,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 2] = [CatalogKind::Praktis, CatalogKind::Praktiker];

    /// Config/CLI name
    pub fn name(&self) -> &'static str {
        match self {
            CatalogKind::Praktis => constants::PRAKTIS_CATALOG,
            CatalogKind::Praktiker => constants::PRAKTIKER_CATALOG,
        }
    }

    /// Column prefix in exported rows
    pub fn label(&self) -> &'static str {
        match self {
            CatalogKind::Praktis => "Praktis",
            CatalogKind::Praktiker => "Praktiker",
        }
    }

    pub fn default_search_url(&self) -> &'static str {
        match self {
            CatalogKind::Praktis => constants::PRAKTIS_SEARCH_URL,
            CatalogKind::Praktiker => constants::PRAKTIKER_SEARCH_URL,
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CatalogKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            constants::PRAKTIS_CATALOG => Ok(CatalogKind::Praktis),
            constants::PRAKTIKER_CATALOG => Ok(CatalogKind::Praktiker),
            other => Err(format!(
                "unknown catalog '{}' (available: {})",
                other,
                constants::get_supported_catalogs().join(", ")
            )),
        }
    }
}

/// A trimmed, non-empty product code for one catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Normalizes caller input; `None` when nothing is left after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    /// Like `parse`, but reports the catalog and input position of a blank code.
    pub fn parse_at(raw: &str, catalog: CatalogKind, index: usize) -> Result<Self> {
        Self::parse(raw).ok_or(EngineError::EmptyIdentifier { catalog, index })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A field that is either extracted text or the "unavailable" sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Found(String),
    Unavailable,
}

impl FieldValue {
    pub fn as_found(&self) -> Option<&str> {
        match self {
            FieldValue::Found(s) => Some(s),
            FieldValue::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, FieldValue::Unavailable)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map(FieldValue::Found).unwrap_or(FieldValue::Unavailable)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_found().unwrap_or(UNAVAILABLE))
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_found().unwrap_or(UNAVAILABLE))
    }
}

/// Normalized name/price data for one identifier in one catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    identifier: Identifier,
    display_name: FieldValue,
    regular_price: FieldValue,
    promo_price: Option<String>,
    source_catalog: CatalogKind,
}

impl ProductRecord {
    pub fn new(
        identifier: Identifier,
        display_name: FieldValue,
        regular_price: FieldValue,
        promo_price: Option<String>,
        source_catalog: CatalogKind,
    ) -> Self {
        Self {
            identifier,
            display_name,
            regular_price,
            promo_price,
            source_catalog,
        }
    }

    /// Record for an identifier whose document could not be fetched.
    pub fn unavailable(identifier: Identifier, source_catalog: CatalogKind) -> Self {
        Self::new(
            identifier,
            FieldValue::Unavailable,
            FieldValue::Unavailable,
            None,
            source_catalog,
        )
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn display_name(&self) -> &FieldValue {
        &self.display_name
    }

    pub fn regular_price(&self) -> &FieldValue {
        &self.regular_price
    }

    pub fn promo_price(&self) -> Option<&str> {
        self.promo_price.as_deref()
    }

    pub fn source_catalog(&self) -> CatalogKind {
        self.source_catalog
    }
}

/// One row of the comparison: the same pairing index looked up in two catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRecord {
    index: usize,
    left: ProductRecord,
    right: ProductRecord,
}

impl ComparisonRecord {
    pub fn new(index: usize, left: ProductRecord, right: ProductRecord) -> Self {
        Self { index, left, right }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn left(&self) -> &ProductRecord {
        &self.left
    }

    pub fn right(&self) -> &ProductRecord {
        &self.right
    }

    /// Flattens into the report's column layout: codes, names, regular prices,
    /// then promo prices, each left catalog before right.
    pub fn to_row(&self) -> ReportRow {
        let (l, r) = (&self.left, &self.right);
        let (ll, rl) = (l.source_catalog.label(), r.source_catalog.label());
        let columns = vec![
            (format!("{ll} Code"), Some(l.identifier.to_string())),
            (format!("{rl} Code"), Some(r.identifier.to_string())),
            (format!("{ll} Name"), Some(l.display_name.to_string())),
            (format!("{rl} Name"), Some(r.display_name.to_string())),
            (format!("{ll} Regular Price"), Some(l.regular_price.to_string())),
            (format!("{rl} Regular Price"), Some(r.regular_price.to_string())),
            (format!("{ll} Promo Price"), l.promo_price.clone()),
            (format!("{rl} Promo Price"), r.promo_price.clone()),
        ];
        ReportRow { columns }
    }
}

/// Ordered column/value pairs for tabular exporters. Serializes as a JSON object
/// that keeps column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub columns: Vec<(String, Option<String>)>,
}

impl ReportRow {
    pub fn get(&self, column: &str) -> Option<Option<&str>> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v.as_deref())
    }
}

impl Serialize for ReportRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        Identifier::parse(s).unwrap()
    }

    #[test]
    fn identifier_is_trimmed() {
        assert_eq!(id("  12345 \n").as_str(), "12345");
    }

    #[test]
    fn blank_identifier_is_rejected_with_position() {
        assert_eq!(Identifier::parse("   "), None);
        let err = Identifier::parse_at("\t", CatalogKind::Praktiker, 7).unwrap_err();
        assert!(matches!(
            err,
            EngineError::EmptyIdentifier { catalog: CatalogKind::Praktiker, index: 7 }
        ));
        assert_eq!(err.to_string(), "Empty praktiker identifier at position 7");
    }

    #[test]
    fn catalog_names_round_trip_through_from_str() {
        for kind in CatalogKind::ALL {
            assert_eq!(kind.name().parse::<CatalogKind>().unwrap(), kind);
        }
        assert!("ikea".parse::<CatalogKind>().is_err());
        assert_eq!(" PRAKTIS ".parse::<CatalogKind>().unwrap(), CatalogKind::Praktis);
    }

    #[test]
    fn unavailable_fields_serialize_as_sentinel_text() {
        let record = ProductRecord::unavailable(id("42"), CatalogKind::Praktiker);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["display_name"], "N/A");
        assert_eq!(json["regular_price"], "N/A");
        assert!(json["promo_price"].is_null());
        assert_eq!(json["source_catalog"], "praktiker");
    }

    #[test]
    fn zero_price_is_not_the_sentinel() {
        let price = FieldValue::Found("0".into());
        assert!(!price.is_unavailable());
        assert_eq!(price.to_string(), "0");
    }

    #[test]
    fn report_row_keeps_column_order() {
        let left = ProductRecord::new(
            id("A1"),
            FieldValue::Found("Drill".into()),
            FieldValue::Found("99.90".into()),
            Some("79.90".into()),
            CatalogKind::Praktis,
        );
        let right = ProductRecord::unavailable(id("B1"), CatalogKind::Praktiker);
        let row = ComparisonRecord::new(0, left, right).to_row();

        let names: Vec<&str> = row.columns.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Praktis Code",
                "Praktiker Code",
                "Praktis Name",
                "Praktiker Name",
                "Praktis Regular Price",
                "Praktiker Regular Price",
                "Praktis Promo Price",
                "Praktiker Promo Price",
            ]
        );
        assert_eq!(row.get("Praktiker Name"), Some(Some("N/A")));
        assert_eq!(row.get("Praktiker Promo Price"), Some(None));

        let json = serde_json::to_string(&row).unwrap();
        assert!(json.starts_with("{\"Praktis Code\":\"A1\""));
    }
}
