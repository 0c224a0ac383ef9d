//! Narrows the relationship set to one relationship from a list of user picks.
//!
//! Resolution is a pure function of the catalog, the relationship index and a
//! [`Selections`] value. Nothing is carried between calls: a UI re-renders by
//! calling [`SelectionResolver::resolve`] again with every pick made so far.
//! When a pick is still missing the resolver returns [`Outcome::Pending`] with
//! the choices valid for that step.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::catalog::SchemaCatalog;
use crate::index::{RelationshipIndex, joinable_from};
use crate::infer::Relationship;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    Unfiltered,
    ByTable,
    ByColumn,
}

impl FilterMode {
    pub const ALL: [FilterMode; 3] = [Self::Unfiltered, Self::ByTable, Self::ByColumn];

    pub fn label(self) -> &'static str {
        match self {
            Self::Unfiltered => "None",
            Self::ByTable => "Table Name",
            Self::ByColumn => "Column Name",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown filter mode '{0}' (expected none, table or column)")]
pub struct UnknownFilterMode(pub String);

impl FromStr for FilterMode {
    type Err = UnknownFilterMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "unfiltered" => Ok(Self::Unfiltered),
            "table" | "table name" | "by_table" => Ok(Self::ByTable),
            "column" | "column name" | "by_column" => Ok(Self::ByColumn),
            _ => Err(UnknownFilterMode(s.to_string())),
        }
    }
}

/// Every pick made so far. `table` is the selected table in
/// [`FilterMode::ByTable`] and the first table in [`FilterMode::ByColumn`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selections {
    pub mode: FilterMode,
    pub table: Option<String>,
    pub column: Option<String>,
    pub second_table: Option<String>,
    pub relationship: Option<String>,
}

impl Selections {
    pub fn new(mode: FilterMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_second_table(mut self, table: impl Into<String>) -> Self {
        self.second_table = Some(table.into());
        self
    }

    pub fn with_relationship(mut self, key: impl Into<String>) -> Self {
        self.relationship = Some(key.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Table,
    Column,
    FirstTable,
    SecondTable,
    Relationship,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prompt = match self {
            Self::Table => "Select a Table",
            Self::Column => "Select a Column",
            Self::FirstTable => "Select First Table with the Column",
            Self::SecondTable => "Select Second Table to Join",
            Self::Relationship => "Select a Relationship",
        };
        f.write_str(prompt)
    }
}

/// The next selection required and the values valid for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub step: Step,
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub relationship: Relationship,
    /// Table the joinable-tables view centres on; `None` when unfiltered.
    pub anchor: Option<String>,
    pub joinable_tables: Vec<String>,
    /// Candidates left before the final pick.
    pub candidates: Vec<Relationship>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pending(Prompt),
    Resolved(Resolution),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no relationships were inferred from the schema")]
    NoRelationships,
    #[error("table '{table}' has no joinable tables")]
    NoJoinableTable { table: String },
    #[error("no candidate relationship matches '{key}'")]
    NoMatchingRelationship { key: String },
    #[error("'{value}' is not a valid choice for \"{step}\"")]
    UnknownChoice { step: Step, value: String },
}

impl ResolveError {
    /// Prompt a UI shows instead of failing. `NoJoinableTable` becomes an
    /// empty second-table list; every other error stays fatal.
    pub fn as_empty_prompt(&self) -> Option<Prompt> {
        match self {
            Self::NoJoinableTable { .. } => Some(Prompt {
                step: Step::SecondTable,
                choices: Vec::new(),
            }),
            _ => None,
        }
    }
}

enum Halt {
    Pending(Prompt),
    Failed(ResolveError),
}

impl From<ResolveError> for Halt {
    fn from(err: ResolveError) -> Self {
        Halt::Failed(err)
    }
}

struct Narrowed<'a> {
    candidates: Vec<&'a Relationship>,
    anchor: Option<&'a str>,
    joinable: Vec<&'a str>,
}

pub struct SelectionResolver<'a> {
    catalog: &'a SchemaCatalog,
    identifiers: SchemaCatalog,
    index: &'a RelationshipIndex,
}

impl<'a> SelectionResolver<'a> {
    pub fn new(
        catalog: &'a SchemaCatalog,
        index: &'a RelationshipIndex,
        identifier_type: &str,
    ) -> Self {
        Self {
            catalog,
            identifiers: catalog.filter_by_type(identifier_type),
            index,
        }
    }

    /// Tables offered in [`FilterMode::ByTable`].
    pub fn table_choices(&self) -> Vec<&str> {
        self.catalog.distinct_tables()
    }

    /// Identifier column names offered in [`FilterMode::ByColumn`].
    pub fn column_choices(&self) -> Vec<&str> {
        self.identifiers.distinct_columns()
    }

    /// Tables holding `column` as an identifier column.
    pub fn tables_with_column(&self, column: &str) -> Vec<&str> {
        self.identifiers.tables_with_column(column)
    }

    pub fn resolve(&self, selections: &Selections) -> Result<Outcome, ResolveError> {
        match self.try_resolve(selections) {
            Ok(resolution) => Ok(Outcome::Resolved(resolution)),
            Err(Halt::Pending(prompt)) => {
                debug!(step = %prompt.step, choices = prompt.choices.len(), "selection pending");
                Ok(Outcome::Pending(prompt))
            }
            Err(Halt::Failed(err)) => Err(err),
        }
    }

    fn try_resolve(&self, selections: &Selections) -> Result<Resolution, Halt> {
        let narrowed = match selections.mode {
            FilterMode::Unfiltered => Narrowed {
                candidates: self.index.all(),
                anchor: None,
                joinable: Vec::new(),
            },
            FilterMode::ByTable => self.narrow_by_table(selections)?,
            FilterMode::ByColumn => self.narrow_by_column(selections)?,
        };

        if narrowed.candidates.is_empty() {
            return Err(ResolveError::NoRelationships.into());
        }

        let keys: Vec<String> = narrowed.candidates.iter().map(|r| r.key()).collect();
        let key = match selections.relationship.as_deref() {
            Some(key) => key,
            None => {
                return Err(Halt::Pending(Prompt {
                    step: Step::Relationship,
                    choices: keys,
                }));
            }
        };

        let relationship = narrowed
            .candidates
            .iter()
            .zip(&keys)
            .find(|(_, candidate)| candidate.as_str() == key)
            .map(|(r, _)| (*r).clone())
            .ok_or_else(|| ResolveError::NoMatchingRelationship {
                key: key.to_string(),
            })?;

        debug!(mode = ?selections.mode, %relationship, "relationship resolved");

        Ok(Resolution {
            relationship,
            anchor: narrowed.anchor.map(str::to_string),
            joinable_tables: narrowed.joinable.iter().map(|t| t.to_string()).collect(),
            candidates: narrowed.candidates.into_iter().cloned().collect(),
        })
    }

    fn narrow_by_table(&self, selections: &Selections) -> Result<Narrowed<'_>, Halt> {
        let tables = self.catalog.distinct_tables();
        let table = choose(Step::Table, selections.table.as_deref(), &tables)?;

        let touching = self.index.by_table(table);
        let joinable = joinable_from(touching.iter().copied(), table);
        if joinable.is_empty() {
            return Err(ResolveError::NoJoinableTable {
                table: table.to_string(),
            }
            .into());
        }

        let second = choose(Step::SecondTable, selections.second_table.as_deref(), &joinable)?;
        let candidates = touching
            .into_iter()
            .filter(|r| r.to_table == second)
            .collect();

        Ok(Narrowed {
            candidates,
            anchor: Some(table),
            joinable,
        })
    }

    fn narrow_by_column(&self, selections: &Selections) -> Result<Narrowed<'_>, Halt> {
        let columns = self.column_choices();
        let column = choose(Step::Column, selections.column.as_deref(), &columns)?;

        let tables = self.tables_with_column(column);
        let first = choose(Step::FirstTable, selections.table.as_deref(), &tables)?;

        let over_column = self.index.by_column(column);
        let joinable = joinable_from(over_column.iter().copied(), first);
        if joinable.is_empty() {
            return Err(ResolveError::NoJoinableTable {
                table: first.to_string(),
            }
            .into());
        }

        let second = choose(Step::SecondTable, selections.second_table.as_deref(), &joinable)?;
        let candidates = over_column
            .into_iter()
            .filter(|r| {
                (r.from_table == first && r.to_table == second)
                    || (r.from_table == second && r.to_table == first)
            })
            .collect();

        Ok(Narrowed {
            candidates,
            anchor: Some(first),
            joinable,
        })
    }
}

/// Return the choice matching `value`, or halt with a prompt when no value
/// has been picked yet.
fn choose<'c>(step: Step, value: Option<&str>, choices: &[&'c str]) -> Result<&'c str, Halt> {
    match value {
        None => Err(Halt::Pending(Prompt {
            step,
            choices: choices.iter().map(|c| c.to_string()).collect(),
        })),
        Some(value) => choices
            .iter()
            .copied()
            .find(|c| *c == value)
            .ok_or_else(|| {
                Halt::Failed(ResolveError::UnknownChoice {
                    step,
                    value: value.to_string(),
                })
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnRecord;
    use crate::infer::RelationshipInferer;

    const ID: &str = "uniqueidentifier";

    fn sample_catalog() -> SchemaCatalog {
        SchemaCatalog::from_records(vec![
            ColumnRecord::new("Orders", "CustomerID", ID),
            ColumnRecord::new("Orders", "Total", "decimal"),
            ColumnRecord::new("Customers", "CustomerID", ID),
            ColumnRecord::new("Customers", "RegionID", ID),
            ColumnRecord::new("Regions", "RegionID", ID),
            ColumnRecord::new("Archive", "LegacyID", ID),
        ])
    }

    fn with_resolver<T>(catalog: &SchemaCatalog, f: impl FnOnce(&SelectionResolver) -> T) -> T {
        let index = RelationshipIndex::new(RelationshipInferer::default().infer(catalog));
        let resolver = SelectionResolver::new(catalog, &index, ID);
        f(&resolver)
    }

    fn resolved(outcome: Outcome) -> Resolution {
        match outcome {
            Outcome::Resolved(resolution) => resolution,
            Outcome::Pending(prompt) => panic!("expected resolution, got prompt {:?}", prompt),
        }
    }

    fn pending(outcome: Outcome) -> Prompt {
        match outcome {
            Outcome::Pending(prompt) => prompt,
            Outcome::Resolved(r) => panic!("expected prompt, got {:?}", r),
        }
    }

    #[test]
    fn test_filter_mode_from_str() {
        assert_eq!("none".parse::<FilterMode>(), Ok(FilterMode::Unfiltered));
        assert_eq!("Table Name".parse::<FilterMode>(), Ok(FilterMode::ByTable));
        assert_eq!("column".parse::<FilterMode>(), Ok(FilterMode::ByColumn));
        assert_eq!(
            "rows".parse::<FilterMode>(),
            Err(UnknownFilterMode("rows".into()))
        );
        for mode in FilterMode::ALL {
            assert_eq!(mode.label().parse::<FilterMode>(), Ok(mode));
        }
    }

    #[test]
    fn test_by_table_example() {
        let catalog = sample_catalog();
        with_resolver(&catalog, |resolver| {
            let sel = Selections::new(FilterMode::ByTable)
                .with_table("Orders")
                .with_second_table("Customers")
                .with_relationship("Orders (CustomerID) -> Customers (CustomerID)");
            let resolution = resolved(resolver.resolve(&sel).unwrap());

            assert_eq!(
                resolution.relationship,
                Relationship::new("Orders", "CustomerID", "Customers", "CustomerID")
            );
            assert_eq!(resolution.anchor.as_deref(), Some("Orders"));
            assert_eq!(resolution.joinable_tables, vec!["Customers"]);
            assert_eq!(resolution.candidates.len(), 1);
        });
    }

    #[test]
    fn test_by_table_prompts_in_order() {
        let catalog = sample_catalog();
        with_resolver(&catalog, |resolver| {
            let sel = Selections::new(FilterMode::ByTable);
            let prompt = pending(resolver.resolve(&sel).unwrap());
            assert_eq!(prompt.step, Step::Table);
            assert_eq!(
                prompt.choices,
                vec!["Orders", "Customers", "Regions", "Archive"]
            );

            let sel = sel.with_table("Customers");
            let prompt = pending(resolver.resolve(&sel).unwrap());
            assert_eq!(prompt.step, Step::SecondTable);
            assert_eq!(prompt.choices, vec!["Orders", "Regions"]);

            let sel = sel.with_second_table("Regions");
            let prompt = pending(resolver.resolve(&sel).unwrap());
            assert_eq!(prompt.step, Step::Relationship);
            assert_eq!(
                prompt.choices,
                vec!["Customers (RegionID) -> Regions (RegionID)"]
            );
        });
    }

    #[test]
    fn test_by_table_without_joinable() {
        let catalog = sample_catalog();
        with_resolver(&catalog, |resolver| {
            let sel = Selections::new(FilterMode::ByTable).with_table("Archive");
            assert_eq!(
                resolver.resolve(&sel),
                Err(ResolveError::NoJoinableTable {
                    table: "Archive".into()
                })
            );
        });
    }

    #[test]
    fn test_no_joinable_table_as_empty_prompt() {
        let err = ResolveError::NoJoinableTable {
            table: "Archive".into(),
        };
        assert_eq!(
            err.as_empty_prompt(),
            Some(Prompt {
                step: Step::SecondTable,
                choices: Vec::new()
            })
        );
        let fatal = ResolveError::NoMatchingRelationship { key: "x".into() };
        assert_eq!(fatal.as_empty_prompt(), None);
    }

    #[test]
    fn test_unknown_second_table() {
        let catalog = sample_catalog();
        with_resolver(&catalog, |resolver| {
            let sel = Selections::new(FilterMode::ByTable)
                .with_table("Orders")
                .with_second_table("Regions");
            assert_eq!(
                resolver.resolve(&sel),
                Err(ResolveError::UnknownChoice {
                    step: Step::SecondTable,
                    value: "Regions".into()
                })
            );
        });
    }

    #[test]
    fn test_by_column_flow() {
        let catalog = sample_catalog();
        with_resolver(&catalog, |resolver| {
            assert_eq!(
                resolver.column_choices(),
                vec!["CustomerID", "RegionID", "LegacyID"]
            );

            let sel = Selections::new(FilterMode::ByColumn).with_column("RegionID");
            let prompt = pending(resolver.resolve(&sel).unwrap());
            assert_eq!(prompt.step, Step::FirstTable);
            assert_eq!(prompt.choices, vec!["Customers", "Regions"]);

            let sel = sel.with_table("Regions");
            let prompt = pending(resolver.resolve(&sel).unwrap());
            assert_eq!(prompt.step, Step::SecondTable);
            assert_eq!(prompt.choices, vec!["Customers"]);

            let sel = sel.with_second_table("Customers");
            let prompt = pending(resolver.resolve(&sel).unwrap());
            assert_eq!(prompt.choices.len(), 2);

            let sel = sel.with_relationship("Regions (RegionID) -> Customers (RegionID)");
            let resolution = resolved(resolver.resolve(&sel).unwrap());
            assert_eq!(
                resolution.relationship,
                Relationship::new("Regions", "RegionID", "Customers", "RegionID")
            );
            assert_eq!(resolution.anchor.as_deref(), Some("Regions"));
        });
    }

    #[test]
    fn test_by_column_single_table_has_no_join() {
        let catalog = sample_catalog();
        with_resolver(&catalog, |resolver| {
            let sel = Selections::new(FilterMode::ByColumn)
                .with_column("LegacyID")
                .with_table("Archive");
            assert_eq!(
                resolver.resolve(&sel),
                Err(ResolveError::NoJoinableTable {
                    table: "Archive".into()
                })
            );
        });
    }

    #[test]
    fn test_by_column_rejects_non_identifier_column() {
        let catalog = sample_catalog();
        with_resolver(&catalog, |resolver| {
            let sel = Selections::new(FilterMode::ByColumn).with_column("Total");
            assert!(matches!(
                resolver.resolve(&sel),
                Err(ResolveError::UnknownChoice {
                    step: Step::Column,
                    ..
                })
            ));
        });
    }

    #[test]
    fn test_unfiltered() {
        let catalog = sample_catalog();
        with_resolver(&catalog, |resolver| {
            let sel = Selections::new(FilterMode::Unfiltered);
            let prompt = pending(resolver.resolve(&sel).unwrap());
            assert_eq!(prompt.choices.len(), 4);

            let sel = sel.with_relationship(prompt.choices[2].clone());
            let resolution = resolved(resolver.resolve(&sel).unwrap());
            assert_eq!(resolution.anchor, None);
            assert!(resolution.joinable_tables.is_empty());
            assert_eq!(resolution.relationship.key(), prompt.choices[2]);
        });
    }

    #[test]
    fn test_unfiltered_without_relationships() {
        let catalog = SchemaCatalog::from_records(vec![ColumnRecord::new("A", "x", "int")]);
        with_resolver(&catalog, |resolver| {
            assert_eq!(
                resolver.resolve(&Selections::default()),
                Err(ResolveError::NoRelationships)
            );
        });
    }

    #[test]
    fn test_key_match_is_case_sensitive() {
        let catalog = sample_catalog();
        with_resolver(&catalog, |resolver| {
            let sel = Selections::new(FilterMode::ByTable)
                .with_table("Orders")
                .with_second_table("Customers")
                .with_relationship("orders (CustomerID) -> Customers (CustomerID)");
            assert!(matches!(
                resolver.resolve(&sel),
                Err(ResolveError::NoMatchingRelationship { .. })
            ));
        });
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let catalog = sample_catalog();
        with_resolver(&catalog, |resolver| {
            let sel = Selections::new(FilterMode::ByColumn)
                .with_column("CustomerID")
                .with_table("Customers")
                .with_second_table("Orders")
                .with_relationship("Customers (CustomerID) -> Orders (CustomerID)");
            let first = resolver.resolve(&sel).unwrap();
            for _ in 0..3 {
                assert_eq!(resolver.resolve(&sel).unwrap(), first);
            }
        });
    }
}
