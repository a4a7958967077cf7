//! Bar timeframes supported by the radar.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParseError;

/// Intraday bar period. Alpha Vantage has no `3m` feed; its adapter rejects it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "3m")]
    M3,
    #[default]
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [Timeframe::M1, Timeframe::M3, Timeframe::M5, Timeframe::M15];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M3 => "3m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
        }
    }

    pub fn minutes(&self) -> u32 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M3 => 3,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.as_str() == needle)
            .ok_or_else(|| ParseError::Timeframe(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_supported_timeframe() {
        for tf in Timeframe::ALL {
            assert_eq!(tf.as_str().parse::<Timeframe>().unwrap(), tf);
        }
        assert_eq!(" 15M ".parse::<Timeframe>().unwrap(), Timeframe::M15);
    }

    #[test]
    fn rejects_unknown_timeframe() {
        let err = "1h".parse::<Timeframe>().unwrap_err();
        assert_eq!(err, ParseError::Timeframe("1h".into()));
    }

    #[test]
    fn minutes_and_default() {
        assert_eq!(Timeframe::M3.minutes(), 3);
        assert_eq!(Timeframe::default(), Timeframe::M5);
    }

    #[test]
    fn serde_uses_short_names() {
        let json = serde_json::to_string(&Timeframe::M15).unwrap();
        assert_eq!(json, "\"15m\"");
        let back: Timeframe = serde_json::from_str("\"1m\"").unwrap();
        assert_eq!(back, Timeframe::M1);
    }
}
