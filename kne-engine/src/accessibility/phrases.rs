//! Localized text: voice command phrases, responses and notification messages
//!
//! Supported languages are English, Spanish and French. Anything else falls
//! back to English.

use kne_common::alerts::VoiceAction;
use kne_common::{OrderData, SoundType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    En,
    Es,
    Fr,
}

impl Lang {
    /// Resolve a BCP 47 tag by its primary subtag
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match primary.as_str() {
            "es" => Lang::Es,
            "fr" => Lang::Fr,
            _ => Lang::En,
        }
    }
}

/// Recognized phrases in all languages
const COMMAND_PHRASES: &[(&str, VoiceAction)] = &[
    // English
    ("next order", VoiceAction::NextOrder),
    ("next", VoiceAction::NextOrder),
    ("previous order", VoiceAction::PreviousOrder),
    ("go back", VoiceAction::PreviousOrder),
    ("mark ready", VoiceAction::MarkReady),
    ("order ready", VoiceAction::MarkReady),
    ("complete order", VoiceAction::CompleteOrder),
    ("order complete", VoiceAction::CompleteOrder),
    ("repeat", VoiceAction::RepeatLast),
    ("say again", VoiceAction::RepeatLast),
    ("show orders", VoiceAction::ShowOrders),
    ("mute", VoiceAction::Mute),
    ("silence", VoiceAction::Mute),
    ("unmute", VoiceAction::Unmute),
    ("help", VoiceAction::Help),
    // Spanish
    ("siguiente pedido", VoiceAction::NextOrder),
    ("siguiente orden", VoiceAction::NextOrder),
    ("pedido anterior", VoiceAction::PreviousOrder),
    ("orden anterior", VoiceAction::PreviousOrder),
    ("marcar listo", VoiceAction::MarkReady),
    ("pedido listo", VoiceAction::MarkReady),
    ("completar pedido", VoiceAction::CompleteOrder),
    ("completar orden", VoiceAction::CompleteOrder),
    ("repetir", VoiceAction::RepeatLast),
    ("mostrar pedidos", VoiceAction::ShowOrders),
    ("mostrar órdenes", VoiceAction::ShowOrders),
    ("silenciar", VoiceAction::Mute),
    ("activar sonido", VoiceAction::Unmute),
    ("ayuda", VoiceAction::Help),
    // French
    ("commande suivante", VoiceAction::NextOrder),
    ("commande précédente", VoiceAction::PreviousOrder),
    ("marquer prêt", VoiceAction::MarkReady),
    ("commande prête", VoiceAction::MarkReady),
    ("terminer commande", VoiceAction::CompleteOrder),
    ("commande terminée", VoiceAction::CompleteOrder),
    ("répéter", VoiceAction::RepeatLast),
    ("afficher commandes", VoiceAction::ShowOrders),
    ("muet", VoiceAction::Mute),
    ("activer son", VoiceAction::Unmute),
    ("aide", VoiceAction::Help),
];

/// Match a transcript against the phrase table
///
/// The transcript is trimmed and lowercased, then must equal a phrase.
pub fn match_command(transcript: &str) -> Option<VoiceAction> {
    let normalized = transcript.trim().to_lowercase();
    COMMAND_PHRASES
        .iter()
        .find(|(phrase, _)| *phrase == normalized)
        .map(|(_, action)| *action)
}

fn action_label(action: VoiceAction, lang: Lang) -> &'static str {
    use VoiceAction::*;
    match lang {
        Lang::En => match action {
            NextOrder => "next order",
            PreviousOrder => "previous order",
            MarkReady => "order marked ready",
            CompleteOrder => "order completed",
            RepeatLast => "repeating last notification",
            ShowOrders => "showing orders",
            Mute => "sound muted",
            Unmute => "sound on",
            Help => "help",
        },
        Lang::Es => match action {
            NextOrder => "siguiente pedido",
            PreviousOrder => "pedido anterior",
            MarkReady => "pedido marcado como listo",
            CompleteOrder => "pedido completado",
            RepeatLast => "repitiendo la última notificación",
            ShowOrders => "mostrando pedidos",
            Mute => "sonido silenciado",
            Unmute => "sonido activado",
            Help => "ayuda",
        },
        Lang::Fr => match action {
            NextOrder => "commande suivante",
            PreviousOrder => "commande précédente",
            MarkReady => "commande marquée prête",
            CompleteOrder => "commande terminée",
            RepeatLast => "répétition de la dernière notification",
            ShowOrders => "affichage des commandes",
            Mute => "son coupé",
            Unmute => "son activé",
            Help => "aide",
        },
    }
}

/// Spoken confirmation of a recognized command
pub fn command_confirmation(action: VoiceAction, language: &str) -> String {
    let lang = Lang::from_tag(language);
    let prefix = match lang {
        Lang::En => "Command",
        Lang::Es => "Comando",
        Lang::Fr => "Commande",
    };
    format!("{}: {}", prefix, action_label(action, lang))
}

/// Spoken response when nothing matched
pub fn command_not_recognized(language: &str) -> &'static str {
    match Lang::from_tag(language) {
        Lang::En => "Command not recognized",
        Lang::Es => "Comando no reconocido",
        Lang::Fr => "Commande non reconnue",
    }
}

/// Human-readable message for a notification
pub fn notification_message(sound_type: SoundType, order: Option<&OrderData>, language: &str) -> String {
    let lang = Lang::from_tag(language);
    let base = match (lang, sound_type) {
        (Lang::En, SoundType::NewOrder) => "New order",
        (Lang::En, SoundType::OrderReady) => "Order ready",
        (Lang::En, SoundType::OrderComplete) => "Order complete",
        (Lang::En, SoundType::UrgentAlert) => "Urgent alert",
        (Lang::En, SoundType::Warning) => "Warning",
        (Lang::En, SoundType::Error) => "Error",
        (Lang::En, SoundType::Success) => "Success",
        (Lang::En, _) => "Notification",
        (Lang::Es, SoundType::NewOrder) => "Nuevo pedido",
        (Lang::Es, SoundType::OrderReady) => "Pedido listo",
        (Lang::Es, SoundType::OrderComplete) => "Pedido completado",
        (Lang::Es, SoundType::UrgentAlert) => "Alerta urgente",
        (Lang::Es, SoundType::Warning) => "Advertencia",
        (Lang::Es, SoundType::Error) => "Error",
        (Lang::Es, SoundType::Success) => "Éxito",
        (Lang::Es, _) => "Notificación",
        (Lang::Fr, SoundType::NewOrder) => "Nouvelle commande",
        (Lang::Fr, SoundType::OrderReady) => "Commande prête",
        (Lang::Fr, SoundType::OrderComplete) => "Commande terminée",
        (Lang::Fr, SoundType::UrgentAlert) => "Alerte urgente",
        (Lang::Fr, SoundType::Warning) => "Avertissement",
        (Lang::Fr, SoundType::Error) => "Erreur",
        (Lang::Fr, SoundType::Success) => "Succès",
        (Lang::Fr, _) => "Notification",
    };

    let Some(order) = order else {
        return base.to_string();
    };

    let mut message = format!("{} {}", base, order.id);
    if let Some(table) = order.table_number {
        let table_word = match lang {
            Lang::En => "table",
            Lang::Es => "mesa",
            Lang::Fr => "table",
        };
        message.push_str(&format!(", {} {}", table_word, table));
    }
    if order.allergy_alert {
        message.push_str(match lang {
            Lang::En => ", allergy alert",
            Lang::Es => ", alerta de alergia",
            Lang::Fr => ", alerte allergie",
        });
    }
    message
}
