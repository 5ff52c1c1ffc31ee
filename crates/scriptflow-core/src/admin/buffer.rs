//! Working copy of a screen under edit.

use crate::screen::{ScreenButton, ScreenDefinition, START_SCREEN_ID};
use serde::{Deserialize, Serialize};

/// Label and target given to a freshly added button row.
pub const NEW_BUTTON_LABEL: &str = "Novo Botão";

/// One editable button row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonRow {
    pub label: String,
    pub next: String,
    pub primary: bool,
}

impl From<&ScreenButton> for ButtonRow {
    fn from(button: &ScreenButton) -> Self {
        Self {
            label: button.label.clone(),
            next: button.next.clone().unwrap_or_default(),
            primary: button.primary,
        }
    }
}

impl From<ButtonRow> for ScreenButton {
    fn from(row: ButtonRow) -> Self {
        let next = row.next.trim();
        Self {
            label: row.label,
            next: (!next.is_empty()).then(|| next.to_string()),
            primary: row.primary,
        }
    }
}

/// Edit form contents. Blank text fields and missing numbers mean "keep the
/// current value".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditBuffer {
    pub id: String,
    pub title: String,
    pub body: String,
    pub tab: String,
    pub buttons: Vec<ButtonRow>,
    pub font_size_title: Option<u32>,
    pub font_size_body: Option<u32>,
    pub font_size_buttons: Option<u32>,
    pub padding_body: Option<u32>,
}

impl EditBuffer {
    /// Loads the form from a screen, filling default sizes for unset overrides.
    pub fn from_screen(screen: &ScreenDefinition) -> Self {
        Self {
            id: screen.id.clone(),
            title: screen.title.clone(),
            body: screen.body.clone(),
            tab: screen.tab.clone().unwrap_or_default(),
            buttons: screen.buttons.iter().map(ButtonRow::from).collect(),
            font_size_title: Some(screen.style.title_px()),
            font_size_body: Some(screen.style.body_px()),
            font_size_buttons: Some(screen.style.buttons_px()),
            padding_body: Some(screen.style.padding_px()),
        }
    }

    /// Appends a placeholder row pointing at the start screen.
    pub fn add_button_row(&mut self) {
        self.buttons.push(ButtonRow {
            label: NEW_BUTTON_LABEL.to_string(),
            next: START_SCREEN_ID.to_string(),
            primary: false,
        });
    }

    pub fn remove_button_row(&mut self, index: usize) -> Option<ButtonRow> {
        (index < self.buttons.len()).then(|| self.buttons.remove(index))
    }

    /// The id requested by the form, or `None` when left blank.
    pub fn requested_id(&self) -> Option<&str> {
        non_blank(&self.id)
    }

    /// Merges the form onto `screen` (everything except the id).
    ///
    /// Non-blank text replaces, blank text keeps; the button list is replaced
    /// wholesale; positive sizes are written back as `"{n}px"`.
    pub fn merge_into(&self, screen: &mut ScreenDefinition) {
        if let Some(title) = non_blank(&self.title) {
            screen.title = title.to_string();
        }
        if let Some(body) = non_blank(&self.body) {
            screen.body = body.to_string();
        }
        if let Some(tab) = non_blank(&self.tab) {
            screen.tab = Some(tab.to_string());
        }

        screen.buttons = self.buttons.iter().cloned().map(ScreenButton::from).collect();

        let style = &mut screen.style;
        merge_px(&mut style.font_size_title, self.font_size_title);
        merge_px(&mut style.font_size_body, self.font_size_body);
        merge_px(&mut style.font_size_buttons, self.font_size_buttons);
        merge_px(&mut style.padding_body, self.padding_body);
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn merge_px(target: &mut Option<String>, value: Option<u32>) {
    if let Some(n) = value.filter(|n| *n > 0) {
        *target = Some(format!("{n}px"));
    }
}
