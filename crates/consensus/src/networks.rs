/// Static deposit-chain-id to network-name table, used when an upstream's
/// spec does not carry a `CONFIG_NAME`.
pub fn network_name_from_deposit_chain_id(chain_id: u64) -> &'static str {
    match chain_id {
        1 => "mainnet",
        5 => "goerli",
        11155111 => "sepolia",
        17000 => "holesky",
        560048 => "hoodi",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_networks() {
        assert_eq!(network_name_from_deposit_chain_id(1), "mainnet");
        assert_eq!(network_name_from_deposit_chain_id(17000), "holesky");
        assert_eq!(network_name_from_deposit_chain_id(42), "unknown");
    }
}
