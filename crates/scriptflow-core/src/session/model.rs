//! Session selection types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two script documents a session runs against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonType {
    /// Individual customer ("pessoa física").
    #[default]
    Physical,
    /// Company customer ("pessoa jurídica").
    LegalEntity,
}

impl PersonType {
    const LEGAL_ENTITY_SYNONYMS: [&'static str; 4] = ["juridica", "jurídica", "pj", "legal_entity"];

    /// Resolves a selector value case-insensitively.
    ///
    /// Anything that is not a legal-entity synonym selects `Physical`, so an
    /// unknown value still yields a usable document.
    pub fn from_selector(value: &str) -> Self {
        let lower = value.trim().to_lowercase();
        if Self::LEGAL_ENTITY_SYNONYMS.contains(&lower.as_str()) {
            Self::LegalEntity
        } else {
            Self::Physical
        }
    }

    /// Selector value as used by the start screen chips.
    pub fn as_selector(&self) -> &'static str {
        match self {
            Self::Physical => "fisica",
            Self::LegalEntity => "juridica",
        }
    }
}

impl fmt::Display for PersonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_selector())
    }
}

/// Direction of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// Outbound ("ativo").
    Active,
    /// Inbound ("receptivo").
    Receptive,
}

impl ServiceType {
    pub fn from_selector(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "ativo" | "active" => Some(Self::Active),
            "receptivo" | "receptive" => Some(Self::Receptive),
            _ => None,
        }
    }

    pub fn as_selector(&self) -> &'static str {
        match self {
            Self::Active => "ativo",
            Self::Receptive => "receptivo",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_selector())
    }
}

/// The three selections required before a session may start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub product: Option<String>,
    pub service_type: Option<ServiceType>,
    pub person_type: Option<PersonType>,
}

impl SessionState {
    /// Whether all three selections are made and entry may be enabled.
    pub fn is_ready(&self) -> bool {
        self.product.as_deref().is_some_and(|p| !p.is_empty())
            && self.service_type.is_some()
            && self.person_type.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_type_synonyms() {
        assert_eq!(PersonType::from_selector("PJ"), PersonType::LegalEntity);
        assert_eq!(PersonType::from_selector("Jurídica"), PersonType::LegalEntity);
        assert_eq!(PersonType::from_selector("juridica"), PersonType::LegalEntity);
        assert_eq!(PersonType::from_selector("fisica"), PersonType::Physical);
        assert_eq!(PersonType::from_selector("anything"), PersonType::Physical);
    }

    #[test]
    fn test_service_type_selector() {
        assert_eq!(ServiceType::from_selector("Ativo"), Some(ServiceType::Active));
        assert_eq!(ServiceType::from_selector("receptivo"), Some(ServiceType::Receptive));
        assert_eq!(ServiceType::from_selector("chat"), None);
    }

    #[test]
    fn test_state_ready_requires_all_three() {
        let mut state = SessionState::default();
        assert!(!state.is_ready());

        state.product = Some("X".to_string());
        state.service_type = Some(ServiceType::Active);
        assert!(!state.is_ready());

        state.person_type = Some(PersonType::LegalEntity);
        assert!(state.is_ready());

        state.product = Some(String::new());
        assert!(!state.is_ready());
    }
}
