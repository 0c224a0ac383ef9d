pub mod cache;
pub mod catalog;
pub mod config;
pub mod dot;
pub mod index;
pub mod infer;
pub mod ir;
pub mod panel;
pub mod resolver;

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

use cache::CatalogCache;
use catalog::SchemaCatalog;
use config::ExplorerConfig;
use dot::Dot;
use index::RelationshipIndex;
use infer::RelationshipInferer;
use ir::GraphIR;
use resolver::{
    FilterMode, Outcome, Prompt, Resolution, ResolveError, SelectionResolver, Selections,
};

/// Relationship set inferred from one catalog, plus the views derived from it.
pub struct Explorer<'a> {
    catalog: &'a SchemaCatalog,
    index: RelationshipIndex,
    identifier_type: String,
}

impl<'a> Explorer<'a> {
    pub fn new(catalog: &'a SchemaCatalog, config: &ExplorerConfig) -> Self {
        let set = RelationshipInferer::new(config.identifier_type.as_str()).infer(catalog);
        Self {
            catalog,
            index: RelationshipIndex::new(set),
            identifier_type: config.identifier_type.clone(),
        }
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        self.catalog
    }

    pub fn index(&self) -> &RelationshipIndex {
        &self.index
    }

    pub fn resolver(&self) -> SelectionResolver<'_> {
        SelectionResolver::new(self.catalog, &self.index, &self.identifier_type)
    }

    pub fn resolve(&self, selections: &Selections) -> Result<Outcome, ResolveError> {
        self.resolver().resolve(selections)
    }

    /// The next prompt to show, or `None` once resolved. A table with nothing
    /// to join yields an empty second-table prompt instead of an error.
    pub fn next_prompt(&self, selections: &Selections) -> Result<Option<Prompt>, ResolveError> {
        match self.resolve(selections) {
            Ok(Outcome::Pending(prompt)) => Ok(Some(prompt)),
            Ok(Outcome::Resolved(_)) => Ok(None),
            Err(err) => match err.as_empty_prompt() {
                Some(prompt) => Ok(Some(prompt)),
                None => Err(err),
            },
        }
    }

    /// Resolved relationship with one hop of downstream joins.
    pub fn relationship_graph(&self, resolution: &Resolution) -> GraphIR {
        let seed = &resolution.relationship;
        GraphIR::relationship(seed, self.index.downstream_of(&seed.to_table))
    }

    /// Joinable-tables view around the anchor, if there is anything to draw.
    pub fn joinable_graph(&self, resolution: &Resolution) -> Option<GraphIR> {
        let anchor = resolution.anchor.as_deref()?;
        let ir = GraphIR::joinable_tables(anchor, &resolution.joinable_tables);
        (!ir.is_empty()).then_some(ir)
    }
}

thread_local! {
    static CATALOG_CACHE: RefCell<CatalogCache> = RefCell::new(CatalogCache::new());
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// DOT for the resolved relationship and its downstream joins.
#[wasm_bindgen(js_name = "relationshipDot")]
pub fn relationship_dot(
    csv: &str,
    mode: Option<String>,
    table: Option<String>,
    column: Option<String>,
    second_table: Option<String>,
    relationship: Option<String>,
    id_type: Option<String>,
) -> Result<String, String> {
    let selections = selections(mode, table, column, second_table, relationship)?;
    with_outcome(csv, id_type.as_deref(), &selections, |explorer, outcome| match outcome {
        Outcome::Resolved(resolution) => {
            Ok(Dot::new(&explorer.relationship_graph(&resolution)).to_string())
        }
        Outcome::Pending(prompt) => Err(format!("{}: {}", prompt.step, prompt.choices.join(", "))),
    })
}

/// DOT for the joinable-tables view; empty when there is nothing to draw.
#[wasm_bindgen(js_name = "joinableDot")]
pub fn joinable_dot(
    csv: &str,
    mode: Option<String>,
    table: Option<String>,
    column: Option<String>,
    second_table: Option<String>,
    relationship: Option<String>,
    id_type: Option<String>,
) -> Result<String, String> {
    let selections = selections(mode, table, column, second_table, relationship)?;
    with_outcome(csv, id_type.as_deref(), &selections, |explorer, outcome| match outcome {
        Outcome::Resolved(resolution) => Ok(explorer
            .joinable_graph(&resolution)
            .map(|ir| Dot::named(&ir, "joinable").to_string())
            .unwrap_or_default()),
        Outcome::Pending(prompt) => Err(format!("{}: {}", prompt.step, prompt.choices.join(", "))),
    })
}

/// Choices for the next pending selection; empty once resolved or when the
/// chosen table has nothing to join.
#[wasm_bindgen(js_name = "pendingChoices")]
pub fn pending_choices(
    csv: &str,
    mode: Option<String>,
    table: Option<String>,
    column: Option<String>,
    second_table: Option<String>,
    relationship: Option<String>,
    id_type: Option<String>,
) -> Result<js_sys::Array, String> {
    let selections = selections(mode, table, column, second_table, relationship)?;
    let choices = js_sys::Array::new();
    for choice in choices_for(csv, id_type.as_deref(), &selections)? {
        choices.push(&JsValue::from_str(&choice));
    }
    Ok(choices)
}

fn choices_for(
    csv: &str,
    id_type: Option<&str>,
    selections: &Selections,
) -> Result<Vec<String>, String> {
    with_explorer(csv, id_type, |explorer| {
        let prompt = explorer.next_prompt(selections).map_err(|e| e.to_string())?;
        Ok(prompt.map(|p| p.choices).unwrap_or_default())
    })
}

fn selections(
    mode: Option<String>,
    table: Option<String>,
    column: Option<String>,
    second_table: Option<String>,
    relationship: Option<String>,
) -> Result<Selections, String> {
    let mode = match mode.as_deref() {
        Some(mode) => mode.parse::<FilterMode>().map_err(|e| e.to_string())?,
        None => FilterMode::default(),
    };
    Ok(Selections {
        mode,
        table,
        column,
        second_table,
        relationship,
    })
}

fn with_explorer<T>(
    csv: &str,
    id_type: Option<&str>,
    f: impl FnOnce(&Explorer) -> Result<T, String>,
) -> Result<T, String> {
    let config = ExplorerConfig::default().with_override(id_type);
    CATALOG_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        let catalog = cache.get_or_load_text(csv).map_err(|e| e.to_string())?;
        f(&Explorer::new(catalog, &config))
    })
}

fn with_outcome<T>(
    csv: &str,
    id_type: Option<&str>,
    selections: &Selections,
    f: impl FnOnce(&Explorer, Outcome) -> Result<T, String>,
) -> Result<T, String> {
    with_explorer(csv, id_type, |explorer| {
        let outcome = explorer.resolve(selections).map_err(|e| e.to_string())?;
        f(explorer, outcome)
    })
}
