use serde::{Deserialize, Serialize};
use std::fmt;

/// Заявленный статус посещения. Ключевое слово кнопки сохраняется как есть.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[serde(rename = "Keldim")]
    Arrived,
    #[serde(rename = "Ketdim")]
    Departed,
}

impl AttendanceStatus {
    pub const ARRIVED_KEYWORD: &'static str = "Keldim";
    pub const DEPARTED_KEYWORD: &'static str = "Ketdim";

    /// Точное совпадение с текстом кнопки, без нормализации регистра.
    pub fn from_keyword(text: &str) -> Option<Self> {
        match text {
            Self::ARRIVED_KEYWORD => Some(AttendanceStatus::Arrived),
            Self::DEPARTED_KEYWORD => Some(AttendanceStatus::Departed),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            AttendanceStatus::Arrived => Self::ARRIVED_KEYWORD,
            AttendanceStatus::Departed => Self::DEPARTED_KEYWORD,
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
