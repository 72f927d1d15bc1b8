/// Version strings surfaced by `/eth/v1/node/version` and the status
/// endpoint.
pub fn short() -> String {
    format!("v{}", env!("CARGO_PKG_VERSION"))
}

pub fn full() -> String {
    format!("Checkpointz/{}", short())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_carries_the_product_name() {
        assert!(full().starts_with("Checkpointz/v"));
        assert!(full().ends_with(&short()));
    }
}
