//! Reserved control screens injected into every graph.

use super::graph::ScreenGraph;
use super::model::{ScreenButton, ScreenDefinition};

/// Selection screen every session starts from.
pub const START_SCREEN_ID: &str = "inicio";
/// Terminal screen; its button resets the session.
pub const END_SCREEN_ID: &str = "fim";
/// Fallback shown when the caller's identity cannot be confirmed.
pub const NOT_CONFIRMED_SCREEN_ID: &str = "nao_confirma";
/// Button target that enters the selected product's entry screen.
pub const START_SENTINEL: &str = "__start";
/// Label of the start screen's reset button.
pub const RESET_LABEL: &str = "Resetar";

pub const RESERVED_SCREEN_IDS: [&str; 3] = [START_SCREEN_ID, END_SCREEN_ID, NOT_CONFIRMED_SCREEN_ID];

/// Whether `id` names one of the three system screens.
pub fn is_reserved(id: &str) -> bool {
    RESERVED_SCREEN_IDS.contains(&id)
}

/// Builds the three system screens.
pub fn system_screens() -> Vec<ScreenDefinition> {
    vec![
        ScreenDefinition::new(
            START_SCREEN_ID,
            "Início",
            "Selecione o tipo de atendimento, a pessoa e o produto.",
        )
        .with_tab("Seleção inicial do fluxo")
        .with_buttons(vec![
            ScreenButton::new("Iniciar", START_SENTINEL).primary(),
            ScreenButton::new(RESET_LABEL, START_SCREEN_ID),
        ]),
        ScreenDefinition::new(END_SCREEN_ID, "Fim", "Atendimento encerrado. Obrigado!")
            .with_tab("Encerramento")
            .with_buttons(vec![ScreenButton::new("Voltar ao início", START_SCREEN_ID).primary()]),
        ScreenDefinition::new(
            NOT_CONFIRMED_SCREEN_ID,
            "Não confirmado",
            "Não foi possível confirmar a identidade do responsável pelo CNPJ.<br>Oriente novo contato em momento oportuno.",
        )
        .with_tab("Sem confirmação")
        .with_buttons(vec![
            ScreenButton::new("Voltar ao início", START_SCREEN_ID).primary(),
            ScreenButton::new("Encerrar", END_SCREEN_ID),
        ]),
    ]
}

/// Adds or overwrites the reserved screens. Data-sourced screens using a
/// reserved id are replaced.
pub fn inject_system_screens(graph: &mut ScreenGraph) {
    for screen in system_screens() {
        if graph.contains(&screen.id) {
            tracing::debug!("[SystemScreens] Overwriting data screen '{}'", screen.id);
        }
        graph.insert(screen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_is_idempotent() {
        let mut graph = ScreenGraph::default();
        inject_system_screens(&mut graph);
        inject_system_screens(&mut graph);

        assert_eq!(graph.len(), 3);
        for id in RESERVED_SCREEN_IDS {
            assert_eq!(graph.get(id).map(|s| s.id.as_str()), Some(id));
        }
    }

    #[test]
    fn test_system_version_wins_over_data() {
        let mut graph = ScreenGraph::default();
        graph.insert(ScreenDefinition::new(END_SCREEN_ID, "Custom end", "x").with_product("X"));

        inject_system_screens(&mut graph);

        let end = graph.get(END_SCREEN_ID).unwrap();
        assert_eq!(end.title, "Fim");
        assert!(end.product.is_none());
    }

    #[test]
    fn test_not_confirmed_has_restart_and_end() {
        let screens = system_screens();
        let fallback = screens
            .iter()
            .find(|s| s.id == NOT_CONFIRMED_SCREEN_ID)
            .unwrap();
        let targets: Vec<_> = fallback.buttons.iter().filter_map(|b| b.target()).collect();
        assert_eq!(targets, vec![START_SCREEN_ID, END_SCREEN_ID]);
    }
}
