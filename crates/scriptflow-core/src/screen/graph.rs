//! The flat screen map and per-product entry index.
//!
//! A graph is always built from scratch into a fresh value and swapped in by
//! the caller, so a failed load never leaves a half-populated map behind.

use super::model::ScreenDefinition;
use crate::error::{Result, ScriptflowError};
use serde_json::Value;
use std::collections::HashMap;

/// Top-level node of a structured script document.
pub const BRANDS_KEY: &str = "marcas";
/// Screen key that marks a brand's entry screen.
pub const APPROACH_KEY: &str = "abordagem";

/// Product line name -> id of its entry screen, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductEntryIndex {
    entries: Vec<(String, String)>,
}

impl ProductEntryIndex {
    pub fn get(&self, product: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == product)
            .map(|(_, id)| id.as_str())
    }

    /// Records the entry of `product`, replacing an earlier one.
    pub fn insert(&mut self, product: impl Into<String>, screen_id: impl Into<String>) {
        let product = product.into();
        let screen_id = screen_id.into();
        match self.entries.iter_mut().find(|(p, _)| *p == product) {
            Some(entry) => entry.1 = screen_id,
            None => self.entries.push((product, screen_id)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, id)| (p.as_str(), id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runtime index of every screen, keyed by its own `id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenGraph {
    screens: HashMap<String, ScreenDefinition>,
    entries: ProductEntryIndex,
    /// Product names in first-seen order.
    products: Vec<String>,
}

impl ScreenGraph {
    /// Normalizes a `{ "marcas": { brand: { key: screen } } }` document.
    ///
    /// Per brand the entry screen is the one stored under `abordagem`, else the
    /// first screen of the brand. Screens without an id, or that are not JSON
    /// objects, are skipped; other fields are coerced, never fatal.
    ///
    /// # Errors
    ///
    /// Returns `DataSource` when the `marcas` node is missing or not an object.
    pub fn from_document(document: &Value) -> Result<Self> {
        let brands = document
            .get(BRANDS_KEY)
            .and_then(Value::as_object)
            .ok_or_else(|| {
                ScriptflowError::data_source(format!("JSON inválido: nó '{BRANDS_KEY}' ausente."))
            })?;

        let mut graph = Self::default();

        for (brand, screens) in brands {
            let Some(screens) = screens.as_object() else {
                tracing::debug!("[ScreenGraph] Brand '{}' is not an object, skipped", brand);
                continue;
            };

            let entry_key = if screens.contains_key(APPROACH_KEY) {
                Some(APPROACH_KEY)
            } else {
                screens.keys().next().map(String::as_str)
            };

            for (key, raw) in screens {
                match serde_json::from_value::<ScreenDefinition>(raw.clone()) {
                    Ok(mut screen) if screen.has_id() => {
                        screen.product = Some(brand.clone());
                        graph.remember_product(brand);
                        if entry_key == Some(key.as_str()) {
                            graph.entries.insert(brand.clone(), screen.id.clone());
                        }
                        graph.insert(screen);
                    }
                    Ok(_) => {
                        tracing::debug!("[ScreenGraph] Screen '{}/{}' has no id, skipped", brand, key);
                    }
                    Err(e) => {
                        tracing::debug!("[ScreenGraph] Screen '{}/{}' is malformed: {}", brand, key, e);
                    }
                }
            }
        }

        Ok(graph)
    }

    /// Builds a graph from standalone screen documents (remote collection).
    ///
    /// Each document's own `id` is its key. Entry points exist only for
    /// documents that embed a `product`; the first one per product wins.
    pub fn from_documents(documents: impl IntoIterator<Item = ScreenDefinition>) -> Self {
        let mut graph = Self::default();

        for screen in documents {
            if !screen.has_id() {
                tracing::debug!("[ScreenGraph] Remote document without id, skipped");
                continue;
            }
            if let Some(product) = screen.product.clone()
                && graph.entries.get(&product).is_none()
            {
                graph.entries.insert(product.clone(), screen.id.clone());
                graph.remember_product(&product);
            }
            graph.insert(screen);
        }

        graph
    }

    fn remember_product(&mut self, product: &str) {
        if !self.products.iter().any(|p| p == product) {
            self.products.push(product.to_string());
        }
    }

    pub fn get(&self, id: &str) -> Option<&ScreenDefinition> {
        self.screens.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ScreenDefinition> {
        self.screens.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.screens.contains_key(id)
    }

    /// Inserts a screen under its own id, replacing any previous value.
    pub fn insert(&mut self, screen: ScreenDefinition) -> Option<ScreenDefinition> {
        self.screens.insert(screen.id.clone(), screen)
    }

    pub fn remove(&mut self, id: &str) -> Option<ScreenDefinition> {
        self.screens.remove(id)
    }

    /// Moves the screen stored under `old_id` to `new_id`, updating its `id`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `old_id` is absent
    /// - `Validation` if `new_id` is blank or already used by another screen
    pub fn rename(&mut self, old_id: &str, new_id: &str) -> Result<()> {
        if old_id == new_id {
            return Ok(());
        }
        if new_id.trim().is_empty() {
            return Err(ScriptflowError::validation("O id da tela não pode ficar vazio."));
        }
        if self.screens.contains_key(new_id) {
            return Err(ScriptflowError::validation(format!(
                "Já existe uma tela com o id '{new_id}'."
            )));
        }
        let mut screen = self
            .screens
            .remove(old_id)
            .ok_or_else(|| ScriptflowError::not_found("screen", old_id))?;
        screen.id = new_id.to_string();
        self.screens.insert(new_id.to_string(), screen);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    pub fn screens(&self) -> impl Iterator<Item = &ScreenDefinition> {
        self.screens.values()
    }

    pub fn entries(&self) -> &ProductEntryIndex {
        &self.entries
    }

    pub fn entry_for(&self, product: &str) -> Option<&str> {
        self.entries.get(product)
    }

    /// Product lines that still have at least one screen.
    pub fn products(&self) -> Vec<&str> {
        self.products
            .iter()
            .filter(|p| {
                self.screens
                    .values()
                    .any(|s| s.product.as_deref() == Some(p.as_str()))
            })
            .map(String::as_str)
            .collect()
    }

    /// First screen whose title or body contains `term`, case-insensitively.
    ///
    /// Ties are broken by id so the result does not depend on map order.
    pub fn find(&self, term: &str) -> Option<&ScreenDefinition> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return None;
        }
        self.screens
            .values()
            .filter(|s| {
                s.title.to_lowercase().contains(&term) || s.body.to_lowercase().contains(&term)
            })
            .min_by(|a, b| a.id.cmp(&b.id))
    }
}
