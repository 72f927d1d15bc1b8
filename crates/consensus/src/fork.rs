use std::{fmt, str::FromStr};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// Consensus fork versions the gateway understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForkName {
    Phase0,
    Altair,
    Bellatrix,
    Capella,
    Deneb,
    Electra,
    Fulu,
}

impl FromStr for ForkName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "phase0" => ForkName::Phase0,
            "altair" => ForkName::Altair,
            "bellatrix" => ForkName::Bellatrix,
            "capella" => ForkName::Capella,
            "deneb" => ForkName::Deneb,
            "electra" => ForkName::Electra,
            "fulu" => ForkName::Fulu,
            _ => return Err(anyhow!("Unknown fork name: {s}")),
        })
    }
}

impl fmt::Display for ForkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ForkName::Phase0 => "phase0",
                ForkName::Altair => "altair",
                ForkName::Bellatrix => "bellatrix",
                ForkName::Capella => "capella",
                ForkName::Deneb => "deneb",
                ForkName::Electra => "electra",
                ForkName::Fulu => "fulu",
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_strings() {
        for fork in [
            ForkName::Phase0,
            ForkName::Altair,
            ForkName::Bellatrix,
            ForkName::Capella,
            ForkName::Deneb,
            ForkName::Electra,
            ForkName::Fulu,
        ] {
            assert_eq!(fork.to_string().parse::<ForkName>().unwrap(), fork);
        }
    }

    #[test]
    fn test_rejects_unknown_fork() {
        assert!("verge".parse::<ForkName>().is_err());
    }

    #[test]
    fn test_ordering_follows_activation_order() {
        assert!(ForkName::Phase0 < ForkName::Deneb);
        assert!(ForkName::Deneb < ForkName::Fulu);
    }
}
