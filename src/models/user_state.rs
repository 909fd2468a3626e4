use super::{AttendanceStatus, Coordinates};

/// Состояние диалога одного чата, выводится из отложенного статуса.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    AwaitingLocation(AttendanceStatus),
}

impl From<Option<AttendanceStatus>> for ChatState {
    fn from(pending: Option<AttendanceStatus>) -> Self {
        match pending {
            Some(status) => ChatState::AwaitingLocation(status),
            None => ChatState::Idle,
        }
    }
}

/// Входящее событие чата.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// `/start`, `/help` и прочие безобидные входы
    Start,
    Text(String),
    Location(Coordinates),
}

/// Что делать с событием. Чистая функция от (состояние, вид события).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    ShowMenu,
    Declare(AttendanceStatus),
    RejectText,
    Record {
        status: AttendanceStatus,
        location: Coordinates,
    },
    ChooseStatusFirst,
}

pub fn decide(state: ChatState, event: &ChatEvent) -> Decision {
    match (state, event) {
        (_, ChatEvent::Start) => Decision::ShowMenu,
        (_, ChatEvent::Text(text)) => match AttendanceStatus::from_keyword(text) {
            Some(status) => Decision::Declare(status),
            None => Decision::RejectText,
        },
        (ChatState::AwaitingLocation(status), ChatEvent::Location(location)) => Decision::Record {
            status,
            location: *location,
        },
        (ChatState::Idle, ChatEvent::Location(_)) => Decision::ChooseStatusFirst,
    }
}
