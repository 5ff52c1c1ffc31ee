//! Screen domain models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Label shown when a screen carries no disposition.
pub const NO_DISPOSITION: &str = "Sem tabulação";

/// Default pixel sizes applied when a screen has no override.
pub const DEFAULT_FONT_SIZE_TITLE: u32 = 22;
pub const DEFAULT_FONT_SIZE_BODY: u32 = 18;
pub const DEFAULT_FONT_SIZE_BUTTONS: u32 = 16;
pub const DEFAULT_PADDING_BODY: u32 = 16;

/// One outgoing action of a screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenButton {
    #[serde(default, deserialize_with = "lenient::text")]
    pub label: String,
    /// Target screen id, the `__start` sentinel, or nothing.
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub next: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub primary: bool,
}

impl ScreenButton {
    pub fn new(label: impl Into<String>, next: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            next: Some(next.into()),
            primary: false,
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// The navigation target, treating a blank string as absent.
    pub fn target(&self) -> Option<&str> {
        self.next.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Optional presentation overrides, stored as CSS lengths (`"18px"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenStyle {
    #[serde(
        default,
        deserialize_with = "lenient::css_length",
        skip_serializing_if = "Option::is_none"
    )]
    pub font_size_title: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::css_length",
        skip_serializing_if = "Option::is_none"
    )]
    pub font_size_body: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::css_length",
        skip_serializing_if = "Option::is_none"
    )]
    pub font_size_buttons: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::css_length",
        skip_serializing_if = "Option::is_none"
    )]
    pub padding_body: Option<String>,
}

impl ScreenStyle {
    pub fn title_px(&self) -> u32 {
        px_value(self.font_size_title.as_deref()).unwrap_or(DEFAULT_FONT_SIZE_TITLE)
    }

    pub fn body_px(&self) -> u32 {
        px_value(self.font_size_body.as_deref()).unwrap_or(DEFAULT_FONT_SIZE_BODY)
    }

    pub fn buttons_px(&self) -> u32 {
        px_value(self.font_size_buttons.as_deref()).unwrap_or(DEFAULT_FONT_SIZE_BUTTONS)
    }

    pub fn padding_px(&self) -> u32 {
        px_value(self.padding_body.as_deref()).unwrap_or(DEFAULT_PADDING_BODY)
    }
}

/// Reads the leading integer of a CSS length (`"18px"` -> 18).
///
/// Returns `None` for missing, non-numeric or zero values.
pub fn px_value(value: Option<&str>) -> Option<u32> {
    let digits: String = value?
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok().filter(|n| *n > 0)
}

/// A node of the navigable script graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenDefinition {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub body: String,
    /// Disposition label shown on request.
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub tab: Option<String>,
    #[serde(default, deserialize_with = "lenient::buttons")]
    pub buttons: Vec<ScreenButton>,
    /// Product line this screen belongs to. Absent on system screens.
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub product: Option<String>,
    #[serde(flatten)]
    pub style: ScreenStyle,
    /// Fields this engine does not interpret, kept for round-trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScreenDefinition {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_tab(mut self, tab: impl Into<String>) -> Self {
        self.tab = Some(tab.into());
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<ScreenButton>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    /// Disposition text, falling back to "Sem tabulação" when blank.
    pub fn disposition(&self) -> &str {
        self.tab
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(NO_DISPOSITION)
    }

    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

/// Hand-edited script documents mix types freely (`20` next to `"20px"`,
/// `null` flags). These readers coerce instead of rejecting the screen.
mod lenient {
    use super::ScreenButton;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(scalar(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(scalar(Value::deserialize(deserializer)?))
    }

    /// Bare numbers become pixel lengths.
    pub fn css_length<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => Some(format!("{n}px")),
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    /// Truthiness as the script authors expect it: `null`, `0`, `""` and
    /// `false` are off.
    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => false,
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        })
    }

    /// Keeps the button objects of an array; anything else reads as no buttons.
    pub fn buttons<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<ScreenButton>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_with_style_and_unknown_fields() {
        let def: ScreenDefinition = serde_json::from_value(json!({
            "id": "x1",
            "title": "Abordagem",
            "body": "Bom dia!",
            "buttons": [{ "label": "Sim", "next": "x2", "primary": true }],
            "fontSizeBody": "20px",
            "owner": "ops-team"
        }))
        .unwrap();

        assert_eq!(def.id, "x1");
        assert_eq!(def.style.body_px(), 20);
        assert_eq!(def.style.title_px(), DEFAULT_FONT_SIZE_TITLE);
        assert_eq!(def.extra.get("owner"), Some(&json!("ops-team")));
        assert!(!def.extra.contains_key("fontSizeBody"));
        assert_eq!(def.buttons[0].target(), Some("x2"));
    }

    #[test]
    fn test_loosely_typed_fields_are_coerced() {
        let def: ScreenDefinition = serde_json::from_value(json!({
            "id": 7,
            "title": 42,
            "body": null,
            "tab": false,
            "buttons": [
                { "label": "Sim", "next": 8, "primary": null },
                { "label": "Não", "primary": "yes" },
                "solto"
            ],
            "fontSizeBody": 20,
            "paddingBody": null
        }))
        .unwrap();

        assert_eq!(def.id, "7");
        assert_eq!(def.title, "42");
        assert_eq!(def.body, "");
        assert_eq!(def.tab.as_deref(), Some("false"));
        assert_eq!(def.buttons.len(), 2);
        assert_eq!(def.buttons[0].target(), Some("8"));
        assert!(!def.buttons[0].primary);
        assert!(def.buttons[1].primary);
        assert_eq!(def.style.font_size_body.as_deref(), Some("20px"));
        assert_eq!(def.style.body_px(), 20);
        assert_eq!(def.style.padding_body, None);
    }

    #[test]
    fn test_serialize_round_trips_extra_fields() {
        let mut def = ScreenDefinition::new("a", "A", "body");
        def.extra.insert("owner".to_string(), json!("ops"));
        def.style.padding_body = Some("12px".to_string());

        let value = serde_json::to_value(&def).unwrap();
        assert_eq!(value["owner"], json!("ops"));
        assert_eq!(value["paddingBody"], json!("12px"));
        assert!(value.get("product").is_none());
    }

    #[test]
    fn test_disposition_fallback() {
        let def = ScreenDefinition::new("a", "A", "");
        assert_eq!(def.disposition(), NO_DISPOSITION);
        assert_eq!(def.clone().with_tab("  ").disposition(), NO_DISPOSITION);
        assert_eq!(def.with_tab(" Venda ").disposition(), "Venda");
    }

    #[test]
    fn test_blank_next_is_no_target() {
        let button = ScreenButton {
            label: "Nada".to_string(),
            next: Some("  ".to_string()),
            primary: false,
        };
        assert_eq!(button.target(), None);
    }

    #[test]
    fn test_px_value() {
        assert_eq!(px_value(Some("18px")), Some(18));
        assert_eq!(px_value(Some(" 7")), Some(7));
        assert_eq!(px_value(Some("px")), None);
        assert_eq!(px_value(Some("0px")), None);
        assert_eq!(px_value(None), None);
    }
}
