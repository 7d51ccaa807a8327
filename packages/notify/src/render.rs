#![allow(clippy::module_name_repetitions)]
//! Portuguese message texts.
//!
//! Rendering is deterministic string assembly: same event, same text. The
//! labels and emoji follow the Fogos.PT bot's message format.

use fogo_watch_incident_models::{ChangeEvent, District, Incident};

/// Reply when a subscriber's filter matches no active incident.
pub const NO_INCIDENTS_TEXT: &str = "Sem ocorrências no momento.";

/// Greeting and command summary shown on first contact.
pub const WELCOME_TEXT: &str = "🔥 Bem-vindo ao Bot Fogos.PT 🔥\n\n\
    Comandos disponíveis:\n\
    /start - Menu inicial\n\
    /ver - Ver ocorrências\n\
    /alterar - Alterar distrito\n\n\
    🌐 Site: https://fogos.pt";

/// Prompt above the district menu.
pub const DISTRICT_PROMPT: &str = "Escolha o seu distrito:";

/// Reply to an unrecognized command.
pub const UNKNOWN_COMMAND_TEXT: &str = "❌ Comando não reconhecido. Use /start para ver as opções.";

/// Renders the body shown for one incident.
#[must_use]
pub fn render_incident(incident: &Incident) -> String {
    format!(
        "📍 Local: {}\n🕒 Início: {}\n🚒 Meios: 👨 {} | 🚒 {} | ✈️ {}\n📊 Estado: {}",
        incident.display_location(),
        incident.started_at(),
        incident.man,
        incident.terrain,
        incident.aerial,
        incident.status,
    )
}

/// Renders a change notification: alert header plus incident body.
#[must_use]
pub fn render_event(event: &ChangeEvent) -> String {
    let header = if event.is_new() {
        "🚨 Nova Ocorrência"
    } else {
        "🔄 Atualização de Ocorrência"
    };
    format!("{header}\n{}", render_incident(event.incident()))
}

/// Confirms the subscriber's new district choice.
#[must_use]
pub fn district_confirmation(district: District) -> String {
    format!("✅ Distrito definido para {district}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incident() -> Incident {
        Incident {
            id: "2025080112".to_string(),
            district: District::CasteloBranco,
            location: "Oleiros".to_string(),
            locality: String::new(),
            parish: String::new(),
            municipality: String::new(),
            date: "2025-08-01".to_string(),
            hour: "16:45".to_string(),
            man: 43,
            terrain: 12,
            aerial: 2,
            status: "Em Curso".to_string(),
        }
    }

    #[test]
    fn renders_incident_block() {
        assert_eq!(
            render_incident(&incident()),
            "📍 Local: Oleiros\n\
             🕒 Início: 2025-08-01 16:45\n\
             🚒 Meios: 👨 43 | 🚒 12 | ✈️ 2\n\
             📊 Estado: Em Curso"
        );
    }

    #[test]
    fn new_and_updated_headers_differ() {
        let new = render_event(&ChangeEvent::New(incident()));
        let updated = render_event(&ChangeEvent::Updated(incident()));

        assert!(new.starts_with("🚨 Nova Ocorrência\n"));
        assert!(updated.starts_with("🔄 Atualização de Ocorrência\n"));
        assert_eq!(
            new.lines().skip(1).collect::<Vec<_>>(),
            updated.lines().skip(1).collect::<Vec<_>>()
        );
    }

    #[test]
    fn renders_fallback_location_and_missing_date() {
        let mut inc = incident();
        inc.location = String::new();
        inc.municipality = "Oleiros".to_string();
        inc.date = String::new();
        inc.hour = String::new();

        let text = render_incident(&inc);
        assert!(text.contains("📍 Local: Oleiros, Castelo Branco\n"));
        assert!(text.contains("🕒 Início: N/A\n"));
    }

    #[test]
    fn confirmation_uses_official_name() {
        assert_eq!(
            district_confirmation(District::Setubal),
            "✅ Distrito definido para Setúbal"
        );
    }
}
