use std::{fmt, str::FromStr};

/// Consensus client implementations we can recognise from
/// `/eth/v1/node/version` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agent {
    Lighthouse,
    Prysm,
    Teku,
    Nimbus,
    Lodestar,
    Grandine,
    Unknown,
}

impl Agent {
    /// Parses an agent out of a node-version string such as
    /// `Lighthouse/v4.5.0-441fc16/x86_64-linux`.
    pub fn from_node_version(version: &str) -> Self {
        let version = version.to_lowercase();

        for agent in [
            Agent::Lighthouse,
            Agent::Prysm,
            Agent::Teku,
            Agent::Nimbus,
            Agent::Lodestar,
            Agent::Grandine,
        ] {
            if version.contains(&agent.to_string()) {
                return agent;
            }
        }

        Agent::Unknown
    }
}

impl FromStr for Agent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "lighthouse" => Agent::Lighthouse,
            "prysm" => Agent::Prysm,
            "teku" => Agent::Teku,
            "nimbus" => Agent::Nimbus,
            "lodestar" => Agent::Lodestar,
            "grandine" => Agent::Grandine,
            "unknown" => Agent::Unknown,
            _ => return Err(anyhow::anyhow!("Unknown agent: {s}")),
        })
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Agent::Lighthouse => "lighthouse",
                Agent::Prysm => "prysm",
                Agent::Teku => "teku",
                Agent::Nimbus => "nimbus",
                Agent::Lodestar => "lodestar",
                Agent::Grandine => "grandine",
                Agent::Unknown => "unknown",
            }
        )
    }
}
