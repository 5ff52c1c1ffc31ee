//! Product-scoped progress computation.

use super::history::HistoryStack;
use crate::screen::{END_SCREEN_ID, ScreenDefinition, ScreenGraph, is_reserved};
use serde::Serialize;

/// Completion of the current session within the selected product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub percent: u32,
    pub traversed: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.traversed >= self.total
    }

    /// Status line text: "Concluído" once complete, else "Passo n de m".
    pub fn label(&self) -> String {
        if self.is_complete() {
            "Concluído".to_string()
        } else {
            format!("Passo {} de {}", self.traversed, self.total)
        }
    }
}

fn is_step(screen: &ScreenDefinition, product: Option<&str>) -> bool {
    !is_reserved(&screen.id) && product.is_none_or(|p| screen.product.as_deref() == Some(p))
}

/// Computes progress over `history` for `selected_product`.
///
/// `total` counts step screens (non-reserved) of the product, or of every
/// product when none is selected. `traversed` counts history entries, not
/// unique screens, so revisits count again; entries pointing at deleted
/// screens are ignored. When the current screen is the end screen the result
/// is forced to zero.
pub fn compute_progress(
    history: &HistoryStack,
    graph: &ScreenGraph,
    selected_product: Option<&str>,
) -> Progress {
    if history.current() == Some(END_SCREEN_ID) {
        return Progress::default();
    }

    let product = selected_product.filter(|p| !p.is_empty());

    let total = graph.screens().filter(|s| is_step(s, product)).count();
    let traversed = history
        .iter()
        .filter_map(|id| graph.get(id))
        .filter(|s| is_step(s, product))
        .count();

    let percent = if total == 0 {
        0
    } else {
        ((traversed as f64 / total as f64) * 100.0).round() as u32
    };

    Progress {
        percent,
        traversed,
        total,
    }
}
