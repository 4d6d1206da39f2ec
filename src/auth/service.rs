use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Google API surfaces with their own consent and token file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum GoogleService {
    #[strum(to_string = "gmail", serialize = "mail")]
    Gmail,
    #[strum(to_string = "calendar", serialize = "gcal", serialize = "cal")]
    Calendar,
    #[strum(to_string = "drive", serialize = "gdrive")]
    Drive,
}

impl GoogleService {
    pub const ALL: [GoogleService; 3] = [Self::Gmail, Self::Calendar, Self::Drive];

    /// Key used for the token file name (`<key>-token.json`).
    pub fn store_key(self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Calendar => "gcal",
            Self::Drive => "gdrive",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Gmail => "Gmail",
            Self::Calendar => "Google Calendar",
            Self::Drive => "Google Drive",
        }
    }

    /// Fixed local port for the OAuth redirect listener.
    pub fn callback_port(self) -> u16 {
        match self {
            Self::Gmail => 8089,
            Self::Calendar => 8090,
            Self::Drive => 8091,
        }
    }

    pub fn scopes(self) -> &'static [&'static str] {
        match self {
            Self::Gmail => &[
                "https://www.googleapis.com/auth/gmail.modify",
                "https://www.googleapis.com/auth/gmail.send",
            ],
            Self::Calendar => &[
                "https://www.googleapis.com/auth/calendar",
                "https://www.googleapis.com/auth/calendar.events",
            ],
            Self::Drive => &["https://www.googleapis.com/auth/drive"],
        }
    }

    pub fn redirect_uri(self) -> String {
        format!("http://127.0.0.1:{}/oauth2callback", self.callback_port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_aliases() {
        assert_eq!(GoogleService::from_str("gmail").unwrap(), GoogleService::Gmail);
        assert_eq!(GoogleService::from_str("GCal").unwrap(), GoogleService::Calendar);
        assert_eq!(GoogleService::from_str("gdrive").unwrap(), GoogleService::Drive);
        assert!(GoogleService::from_str("photos").is_err());
    }

    #[test]
    fn ports_and_keys_are_distinct() {
        let ports: std::collections::HashSet<_> =
            GoogleService::ALL.iter().map(|s| s.callback_port()).collect();
        let keys: std::collections::HashSet<_> =
            GoogleService::ALL.iter().map(|s| s.store_key()).collect();
        assert_eq!(ports.len(), 3);
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn display_uses_primary_name() {
        assert_eq!(GoogleService::Calendar.to_string(), "calendar");
        assert_eq!(
            GoogleService::Gmail.redirect_uri(),
            "http://127.0.0.1:8089/oauth2callback"
        );
    }
}
