//! Release channels of the installed suite.

use std::{fmt, str::FromStr};

/// Named release track written into the configuration document.
///
/// The editor writes the channel verbatim; this type is where the set of
/// supported channels is enforced before that happens.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Deserialize)]
pub enum Channel {
    /// Beta Channel
    BetaChannel,
    /// Current Channel (Preview)
    CurrentPreview,
    /// Current Channel
    Current,
    /// Monthly Enterprise Channel
    MonthlyEnterprise,
    /// Semi-Annual Enterprise Channel (Preview)
    SemiAnnualPreview,
    /// Semi-Annual Enterprise Channel
    SemiAnnual,
}

impl Channel {
    /// All supported channels.
    pub const ALL: [Channel; 6] = [
        Channel::BetaChannel,
        Channel::CurrentPreview,
        Channel::Current,
        Channel::MonthlyEnterprise,
        Channel::SemiAnnualPreview,
        Channel::SemiAnnual,
    ];

    /// Returns the channel name as written in configuration documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BetaChannel => "BetaChannel",
            Self::CurrentPreview => "CurrentPreview",
            Self::Current => "Current",
            Self::MonthlyEnterprise => "MonthlyEnterprise",
            Self::SemiAnnualPreview => "SemiAnnualPreview",
            Self::SemiAnnual => "SemiAnnual",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<_> = Self::ALL.iter().map(|c| c.as_str()).collect();
                format!("Invalid channel: {s}. Valid channels: {}", valid.join(", "))
            })
    }
}
