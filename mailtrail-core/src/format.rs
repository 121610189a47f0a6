use core::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::MailLogError;

/// The mail server whose log grammar is used to read a window.
///
/// Selected once through the `mta_log_type` configuration value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MtaFormat {
    #[default]
    Exim,
    Postfix,
}

impl MtaFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exim => "exim",
            Self::Postfix => "postfix",
        }
    }
}

impl FromStr for MtaFormat {
    type Err = MailLogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exim" | "exim4" => Ok(Self::Exim),
            "postfix" => Ok(Self::Postfix),
            _ => Err(MailLogError::UnsupportedFormat(value.to_string())),
        }
    }
}

impl TryFrom<String> for MtaFormat {
    type Error = MailLogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MtaFormat> for String {
    fn from(value: MtaFormat) -> Self {
        value.as_str().to_string()
    }
}

impl Display for MtaFormat {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::MtaFormat;
    use crate::MailLogError;

    #[test]
    fn parse_known_formats() {
        assert_eq!("exim".parse::<MtaFormat>().ok(), Some(MtaFormat::Exim));
        assert_eq!(" Postfix ".parse::<MtaFormat>().ok(), Some(MtaFormat::Postfix));
        assert_eq!("EXIM4".parse::<MtaFormat>().ok(), Some(MtaFormat::Exim));
    }

    #[test]
    fn reject_unknown_format() {
        let err = "qmail".parse::<MtaFormat>().unwrap_err();
        assert!(matches!(err, MailLogError::UnsupportedFormat(_)));
        assert!(err.to_string().contains("qmail"));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for format in [MtaFormat::Exim, MtaFormat::Postfix] {
            assert_eq!(format.to_string().parse::<MtaFormat>().ok(), Some(format));
        }
    }
}
