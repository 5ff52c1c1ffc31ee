//! Admin edit mode.
//!
//! - `buffer`: the edit form (`EditBuffer`, `ButtonRow`)
//! - `session`: binding the form to a screen and applying it (`AdminEditSession`)
//! - `scheduler`: the persistence seam (`PersistenceScheduler`)

mod buffer;
mod scheduler;
mod session;

pub use buffer::{ButtonRow, EditBuffer, NEW_BUTTON_LABEL};
pub use scheduler::{NoopScheduler, PersistenceScheduler};
pub use session::{AdminEditSession, AppliedEdit};
