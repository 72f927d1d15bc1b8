use std::{net::SocketAddr, sync::Arc};

use checkpointz_beacon::FinalityProvider;
use tokio::sync::watch;
use tracing::info;
use types::errors::handle_rejection;
use warp::Filter;

pub mod handlers;
pub mod routes;
pub mod types;
pub mod version;

/// Serves the HTTP API until shutdown fires.
pub async fn start_server(
    addr: SocketAddr,
    provider: Arc<FinalityProvider>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let routes = routes::get_routes(provider).recover(handle_rejection);

    let (bound, server) = warp::serve(routes).try_bind_with_graceful_shutdown(addr, async move {
        let _ = shutdown.changed().await;
    })?;

    info!(address = %bound, "Serving HTTP API");

    server.await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use checkpointz_beacon::Config;
    use checkpointz_upstream::UpstreamConfig;
    use warp::test::request;

    use super::*;

    fn test_provider() -> Arc<FinalityProvider> {
        FinalityProvider::new(
            Config::default(),
            vec![UpstreamConfig {
                name: "local".to_string(),
                address: "http://localhost:5052".to_string(),
                data_provider: true,
                headers: Default::default(),
                timeout_seconds: 5,
            }],
        )
        .expect("valid provider config")
    }

    #[tokio::test]
    async fn test_genesis_is_unavailable_before_bootstrap() {
        let routes = routes::get_routes(test_provider()).recover(handle_rejection);

        let response = request()
            .method("GET")
            .path("/eth/v1/beacon/genesis")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 503);
    }

    #[tokio::test]
    async fn test_invalid_block_id_is_a_bad_request() {
        let routes = routes::get_routes(test_provider()).recover(handle_rejection);

        let response = request()
            .method("GET")
            .path("/eth/v2/beacon/blocks/latest")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_ready_requires_a_serving_checkpoint() {
        let routes = routes::get_routes(test_provider()).recover(handle_rejection);

        let response = request()
            .method("GET")
            .path("/checkpointz/v1/ready")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 503);
    }

    #[tokio::test]
    async fn test_node_version_is_always_served() {
        let routes = routes::get_routes(test_provider()).recover(handle_rejection);

        let response = request()
            .method("GET")
            .path("/eth/v1/node/version")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 200);
        assert!(
            String::from_utf8_lossy(response.body()).contains("Checkpointz/"),
            "version string should carry the product name"
        );
    }

    #[tokio::test]
    async fn test_unknown_routes_are_not_found() {
        let routes = routes::get_routes(test_provider()).recover(handle_rejection);

        let response = request()
            .method("GET")
            .path("/eth/v1/beacon/unknown")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_state_endpoint_requires_ssz_accept() {
        let routes = routes::get_routes(test_provider()).recover(handle_rejection);

        let response = request()
            .method("GET")
            .path("/eth/v2/debug/beacon/states/finalized")
            .header("accept", "application/json")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 415);
    }
}
