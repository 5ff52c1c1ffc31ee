//! Session domain module.
//!
//! - `model`: selections (`SessionState`, `PersonType`, `ServiceType`)
//! - `history`: the visited-screen stack
//! - `progress`: product-scoped completion
//! - `observer`: presentation hooks
//! - `context`: the navigation engine (`SessionContext`)

mod context;
mod history;
mod model;
mod observer;
mod progress;

pub use context::{ButtonAction, NavigationOutcome, SessionContext};
pub use history::HistoryStack;
pub use model::{PersonType, ServiceType, SessionState};
pub use observer::SessionObserver;
pub use progress::{Progress, compute_progress};
