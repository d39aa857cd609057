//! Standalone duration proxy.

use floor_timeline::proxy::{self, ProxyConfig};

#[tokio::main]
async fn main() {
    floor_timeline::init_tracing();
    let config = ProxyConfig::from_env();
    if let Err(err) = proxy::serve(config).await {
        tracing::error!(error = %err, "duration proxy stopped");
        std::process::exit(1);
    }
}
