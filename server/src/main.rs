use std::sync::Arc;

use anyhow::Context;
use engine::{FileSource, InferenceEngine};
use log::info;
use tokio::{net::TcpListener, signal};

use server::{PredictionService, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ServerConfig::from_env()?;
    info!("using weights at {}", config.model_path().display());

    let engine = Arc::new(InferenceEngine::new(FileSource::new(config.model_path())));
    if config.eager_load() {
        engine
            .load()
            .await
            .with_context(|| format!("loading {}", config.model_path().display()))?;
    }

    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening at {addr}");

    let service = PredictionService::new(engine);
    tokio::select! {
        ret = service.run(listener) => ret?,
        _ = signal::ctrl_c() => {
            info!("received SIGTERM");
        }
    }

    Ok(())
}
