//! Read-only queries over an inferred relationship set.

use std::collections::HashSet;

use crate::infer::{Relationship, RelationshipSet};

pub struct RelationshipIndex {
    set: RelationshipSet,
}

impl RelationshipIndex {
    pub fn new(set: RelationshipSet) -> Self {
        Self { set }
    }

    pub fn all(&self) -> Vec<&Relationship> {
        self.set.iter().collect()
    }

    pub fn set(&self) -> &RelationshipSet {
        &self.set
    }

    /// Relationships touching `table` on either side.
    pub fn by_table(&self, table: &str) -> Vec<&Relationship> {
        self.select(|r| r.from_table == table || r.to_table == table)
    }

    /// Relationships over `column` on either side.
    pub fn by_column(&self, column: &str) -> Vec<&Relationship> {
        self.select(|r| r.from_column == column || r.to_column == column)
    }

    /// Tables reachable in one step from `table`. Direction matters.
    pub fn joinable_from(&self, table: &str) -> Vec<&str> {
        joinable_from(self.set.iter(), table)
    }

    /// Relationships leaving `table`, for one-hop expansion.
    pub fn downstream_of(&self, table: &str) -> Vec<&Relationship> {
        self.select(|r| r.from_table == table)
    }

    fn select(&self, pred: impl Fn(&Relationship) -> bool) -> Vec<&Relationship> {
        self.set.iter().filter(|r| pred(r)).collect()
    }
}

/// Distinct `to_table` values of relationships leaving `table`, in order.
pub fn joinable_from<'a>(
    relationships: impl IntoIterator<Item = &'a Relationship>,
    table: &str,
) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    relationships
        .into_iter()
        .filter(|r| r.from_table == table)
        .map(|r| r.to_table.as_str())
        .filter(|t| seen.insert(*t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnRecord, SchemaCatalog};
    use crate::infer::RelationshipInferer;

    fn sample_index() -> RelationshipIndex {
        let catalog = SchemaCatalog::from_records(vec![
            ColumnRecord::new("Orders", "CustomerID", "uniqueidentifier"),
            ColumnRecord::new("Customers", "CustomerID", "uniqueidentifier"),
            ColumnRecord::new("Customers", "RegionID", "uniqueidentifier"),
            ColumnRecord::new("Regions", "RegionID", "uniqueidentifier"),
            ColumnRecord::new("Audit", "Note", "nvarchar"),
        ]);
        RelationshipIndex::new(RelationshipInferer::default().infer(&catalog))
    }

    #[test]
    fn test_by_table() {
        let index = sample_index();
        assert_eq!(index.by_table("Orders").len(), 2);
        assert_eq!(index.by_table("Customers").len(), 4);
        assert!(index.by_table("Audit").is_empty());
    }

    #[test]
    fn test_by_column() {
        let index = sample_index();
        let rels = index.by_column("RegionID");
        assert_eq!(rels.len(), 2);
        assert!(rels.iter().all(|r| r.from_column == "RegionID"));
        assert!(index.by_column("Note").is_empty());
    }

    #[test]
    fn test_joinable_from_is_directional() {
        let index = sample_index();
        assert_eq!(index.joinable_from("Orders"), vec!["Customers"]);
        assert_eq!(index.joinable_from("Customers"), vec!["Orders", "Regions"]);
        assert!(index.joinable_from("Audit").is_empty());
    }

    #[test]
    fn test_joinable_subset_of_by_table() {
        let index = sample_index();
        for table in ["Orders", "Customers", "Regions", "Audit"] {
            let targets: Vec<&str> = index
                .by_table(table)
                .into_iter()
                .filter(|r| r.from_table == table)
                .map(|r| r.to_table.as_str())
                .collect();
            for joinable in index.joinable_from(table) {
                assert!(targets.contains(&joinable));
            }
        }
    }

    #[test]
    fn test_downstream_of() {
        let index = sample_index();
        let downstream = index.downstream_of("Customers");
        assert_eq!(downstream.len(), 2);
        assert!(downstream.iter().all(|r| r.from_table == "Customers"));
        assert!(index.downstream_of("Nowhere").is_empty());
    }
}
