//! Candidate relationship inference from identifier-typed column names.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::catalog::SchemaCatalog;
use crate::config::DEFAULT_IDENTIFIER_TYPE;

/// A directed, inferred link between two tables sharing an identifier column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relationship {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

impl Relationship {
    pub fn new(
        from_table: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_column: from_column.into(),
            to_table: to_table.into(),
            to_column: to_column.into(),
        }
    }

    /// Display key the user picks a relationship by.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Edge label: `from_column → to_column`.
    pub fn column_label(&self) -> String {
        format!("{} → {}", self.from_column, self.to_column)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) -> {} ({})",
            self.from_table, self.from_column, self.to_table, self.to_column
        )
    }
}

/// Deduplicated relationships in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipSet {
    relationships: Vec<Relationship>,
}

impl RelationshipSet {
    pub fn iter(&self) -> std::slice::Iter<'_, Relationship> {
        self.relationships.iter()
    }

    pub fn as_slice(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    pub fn contains(&self, relationship: &Relationship) -> bool {
        self.relationships.contains(relationship)
    }
}

impl FromIterator<Relationship> for RelationshipSet {
    /// Keeps the first occurrence of each exact tuple.
    fn from_iter<I: IntoIterator<Item = Relationship>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let relationships = iter
            .into_iter()
            .filter(|r| seen.insert(r.clone()))
            .collect();
        Self { relationships }
    }
}

impl<'a> IntoIterator for &'a RelationshipSet {
    type Item = &'a Relationship;
    type IntoIter = std::slice::Iter<'a, Relationship>;

    fn into_iter(self) -> Self::IntoIter {
        self.relationships.iter()
    }
}

pub struct RelationshipInferer {
    identifier_type: String,
}

impl Default for RelationshipInferer {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTIFIER_TYPE)
    }
}

impl RelationshipInferer {
    pub fn new(identifier_type: impl Into<String>) -> Self {
        Self {
            identifier_type: identifier_type.into(),
        }
    }

    pub fn identifier_type(&self) -> &str {
        &self.identifier_type
    }

    /// Pair every identifier column with each same-named identifier column in
    /// another table. Both directions are emitted.
    pub fn infer(&self, catalog: &SchemaCatalog) -> RelationshipSet {
        let ids = catalog.filter_by_type(&self.identifier_type);
        let records = ids.records();

        let set: RelationshipSet = records
            .iter()
            .flat_map(|r| {
                records
                    .iter()
                    .filter(move |m| m.column == r.column && m.table != r.table)
                    .map(move |m| Relationship::new(&r.table, &r.column, &m.table, &m.column))
            })
            .collect();

        debug!(
            identifier_type = %self.identifier_type,
            identifier_columns = ids.len(),
            relationships = set.len(),
            "inferred relationships"
        );
        set
    }
}
