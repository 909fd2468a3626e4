use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;

use super::AttendanceStatus;

/// Часовой пояс отчёта, не зависит от локали сервера.
pub const REPORTING_TZ: Tz = chrono_tz::Asia::Tashkent;

const MISSING: &str = "-";

/// Отправитель сообщения, как его видит транспорт.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sender {
    pub user_id: i64,
    pub display_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Одна завершённая отметка, строится на каждый принятый location.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub display_name: String,
    pub username: String,
    pub user_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub status: AttendanceStatus,
    pub captured_at: DateTime<Tz>,
}

impl AttendanceRecord {
    pub fn new(
        sender: &Sender,
        location: Coordinates,
        status: AttendanceStatus,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            display_name: or_missing(sender.display_name.as_deref()),
            username: or_missing(sender.username.as_deref()),
            user_id: sender.user_id,
            latitude: location.latitude,
            longitude: location.longitude,
            status,
            captured_at: at.with_timezone(&REPORTING_TZ),
        }
    }

    /// `=DATE(..)+TIME(..)`: таблица хранит нативную дату, а не строку.
    pub fn timestamp_formula(&self) -> String {
        let t = &self.captured_at;
        format!(
            "=DATE({};{};{})+TIME({};{};{})",
            t.year(),
            t.month(),
            t.day(),
            t.hour(),
            t.minute(),
            t.second()
        )
    }

    pub fn maps_url(&self) -> String {
        format!("https://maps.google.com/?q={},{}", self.latitude, self.longitude)
    }

    pub fn location_formula(&self) -> String {
        format!("=HYPERLINK(\"{}\"; \"{}\")", self.maps_url(), self.status.keyword())
    }
}

fn or_missing(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => MISSING.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(at: DateTime<Utc>) -> AttendanceRecord {
        AttendanceRecord::new(
            &Sender {
                user_id: 7,
                display_name: Some("Aziz".into()),
                username: None,
            },
            Coordinates { latitude: 41.3, longitude: 69.2 },
            AttendanceStatus::Arrived,
            at,
        )
    }

    #[test]
    fn timestamp_uses_reporting_timezone() {
        // 04:15:30 UTC = 09:15:30 в Ташкенте
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 4, 15, 30).unwrap();
        let record = sample(at);
        assert_eq!(record.timestamp_formula(), "=DATE(2025;3;1)+TIME(9;15;30)");
    }

    #[test]
    fn timestamp_crosses_date_boundary() {
        let at = Utc.with_ymd_and_hms(2024, 12, 31, 21, 0, 5).unwrap();
        let record = sample(at);
        assert_eq!(record.timestamp_formula(), "=DATE(2025;1;1)+TIME(2;0;5)");
    }

    #[test]
    fn link_is_labelled_with_status_word() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 4, 15, 30).unwrap();
        let record = sample(at);
        assert_eq!(
            record.location_formula(),
            "=HYPERLINK(\"https://maps.google.com/?q=41.3,69.2\"; \"Keldim\")"
        );
    }

    #[test]
    fn missing_names_fall_back_to_dash() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 4, 15, 30).unwrap();
        let record = sample(at);
        assert_eq!(record.display_name, "Aziz");
        assert_eq!(record.username, "-");

        let blank = AttendanceRecord::new(
            &Sender {
                user_id: 1,
                display_name: Some("  ".into()),
                username: Some(String::new()),
            },
            Coordinates { latitude: 0.0, longitude: 0.0 },
            AttendanceStatus::Departed,
            at,
        );
        assert_eq!(blank.display_name, "-");
        assert_eq!(blank.username, "-");
    }
}
