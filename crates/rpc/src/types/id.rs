use std::{fmt, str::FromStr};

use alloy_primitives::B256;

/// A `{block_id}` path segment: `head`, `genesis`, `finalized`, a slot
/// number or a `0x`-prefixed root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockId {
    Head,
    Genesis,
    Finalized,
    Slot(u64),
    Root(B256),
}

fn parse_root(s: &str) -> Result<B256, String> {
    B256::from_str(s).map_err(|err| format!("invalid root: {err}"))
}

impl FromStr for BlockId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "head" => return Ok(BlockId::Head),
            "genesis" => return Ok(BlockId::Genesis),
            "finalized" => return Ok(BlockId::Finalized),
            _ => {}
        }

        if s.starts_with("0x") {
            return parse_root(s).map(BlockId::Root);
        }

        s.parse::<u64>()
            .map(BlockId::Slot)
            .map_err(|_| format!("invalid block ID: {s}"))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Head => write!(f, "head"),
            BlockId::Genesis => write!(f, "genesis"),
            BlockId::Finalized => write!(f, "finalized"),
            BlockId::Slot(slot) => write!(f, "{slot}"),
            BlockId::Root(root) => write!(f, "{root}"),
        }
    }
}

impl BlockId {
    /// Cache-control policy by id class: immutable ids cache for a long
    /// time, moving ids only briefly.
    pub fn cache_control(&self) -> &'static str {
        match self {
            BlockId::Slot(_) | BlockId::Root(_) | BlockId::Genesis => "public, s-max-age=6000",
            BlockId::Head | BlockId::Finalized => "public, s-max-age=30",
        }
    }
}

/// A `{state_id}` path segment, analogous to [`BlockId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateId {
    Head,
    Genesis,
    Finalized,
    Slot(u64),
    Root(B256),
}

impl FromStr for StateId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "head" => return Ok(StateId::Head),
            "genesis" => return Ok(StateId::Genesis),
            "finalized" => return Ok(StateId::Finalized),
            _ => {}
        }

        if s.starts_with("0x") {
            return parse_root(s).map(StateId::Root);
        }

        s.parse::<u64>()
            .map(StateId::Slot)
            .map_err(|_| format!("invalid state ID: {s}"))
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateId::Head => write!(f, "head"),
            StateId::Genesis => write!(f, "genesis"),
            StateId::Finalized => write!(f, "finalized"),
            StateId::Slot(slot) => write!(f, "{slot}"),
            StateId::Root(root) => write!(f, "{root}"),
        }
    }
}

impl StateId {
    pub fn cache_control(&self) -> &'static str {
        match self {
            StateId::Slot(_) | StateId::Root(_) | StateId::Genesis => "public, s-max-age=6000",
            StateId::Finalized => "public, s-max-age=180",
            StateId::Head => "public, s-max-age=30",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_named_ids() {
        assert_eq!("head".parse::<BlockId>().unwrap(), BlockId::Head);
        assert_eq!("genesis".parse::<BlockId>().unwrap(), BlockId::Genesis);
        assert_eq!("finalized".parse::<StateId>().unwrap(), StateId::Finalized);
    }

    #[test]
    fn test_parses_slots_and_roots() {
        assert_eq!("3232".parse::<BlockId>().unwrap(), BlockId::Slot(3232));

        let root = format!("0x{}", "11".repeat(32));
        assert_eq!(
            root.parse::<BlockId>().unwrap(),
            BlockId::Root(B256::repeat_byte(0x11))
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("latest".parse::<BlockId>().is_err());
        assert!("0xzz".parse::<StateId>().is_err());
        assert!("-1".parse::<BlockId>().is_err());
    }

    #[test]
    fn test_round_trips_through_display() {
        for raw in ["head", "genesis", "finalized", "3232"] {
            assert_eq!(raw.parse::<BlockId>().unwrap().to_string(), raw);
        }
    }

    #[test]
    fn test_cache_control_by_id_class() {
        assert_eq!(
            "genesis".parse::<BlockId>().unwrap().cache_control(),
            "public, s-max-age=6000"
        );
        assert_eq!(
            "finalized".parse::<StateId>().unwrap().cache_control(),
            "public, s-max-age=180"
        );
    }
}
