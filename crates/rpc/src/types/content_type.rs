pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const SSZ_CONTENT_TYPE: &str = "application/octet-stream";
pub const ETH_CONSENSUS_VERSION_HEADER: &str = "Eth-Consensus-Version";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    Ssz,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => JSON_CONTENT_TYPE,
            ContentType::Ssz => SSZ_CONTENT_TYPE,
        }
    }

    /// Negotiates the response content type from an `Accept` header. JSON is
    /// the default; SSZ is chosen when `application/octet-stream` is listed
    /// first among the types we understand.
    pub fn from_accept(accept: Option<&str>) -> ContentType {
        let Some(accept) = accept else {
            return ContentType::Json;
        };

        for part in accept.split(',') {
            let media_type = part.split(';').next().unwrap_or_default().trim();

            match media_type {
                SSZ_CONTENT_TYPE => return ContentType::Ssz,
                JSON_CONTENT_TYPE | "application/*" | "*/*" => return ContentType::Json,
                _ => {}
            }
        }

        ContentType::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_json() {
        assert_eq!(ContentType::from_accept(None), ContentType::Json);
        assert_eq!(ContentType::from_accept(Some("*/*")), ContentType::Json);
        assert_eq!(ContentType::from_accept(Some("text/html")), ContentType::Json);
    }

    #[test]
    fn test_ssz_is_negotiated() {
        assert_eq!(
            ContentType::from_accept(Some("application/octet-stream")),
            ContentType::Ssz
        );
        assert_eq!(
            ContentType::from_accept(Some("application/octet-stream;q=1, application/json;q=0.9")),
            ContentType::Ssz
        );
    }

    #[test]
    fn test_first_understood_type_wins() {
        assert_eq!(
            ContentType::from_accept(Some("application/json, application/octet-stream")),
            ContentType::Json
        );
    }
}
