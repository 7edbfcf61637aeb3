use std::{io, sync::Arc};

use engine::{InferenceEngine, WeightSource};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpListener,
};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};

use crate::protocol::{PredictReply, PredictRequest, REQUEST_TOO_LARGE, UNDECODABLE_IMAGE};

/// Longest request line accepted, generous enough for a 280x280 bitmap.
const MAX_LINE_LEN: usize = 4 * 1024 * 1024;

/// Answers prediction requests over any number of connections, all backed by one engine.
pub struct PredictionService<S> {
    engine: Arc<InferenceEngine<S>>,
}

impl<S> Clone for PredictionService<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S> PredictionService<S>
where
    S: WeightSource + Sync + 'static,
{
    /// Creates a new `PredictionService`.
    ///
    /// # Arguments
    /// * `engine` - The engine every connection shares.
    ///
    /// # Returns
    /// A new `PredictionService` instance.
    pub fn new(engine: Arc<InferenceEngine<S>>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &InferenceEngine<S> {
        &self.engine
    }

    /// Answers a single request line.
    pub async fn handle(&self, line: &str) -> PredictReply {
        let request = match PredictRequest::parse(line) {
            Ok(request) => request,
            Err(msg) => {
                warn!("rejected request: {msg}");
                return PredictReply::error(msg);
            }
        };

        let pixels = match request.into_pixels() {
            Ok(pixels) => pixels,
            Err(e) => {
                warn!("rejected bitmap: {e}");
                return PredictReply::error(UNDECODABLE_IMAGE);
            }
        };

        match self.engine.predict(&pixels).await {
            Ok(result) => PredictReply::prediction(result),
            Err(e) => {
                warn!("prediction failed: {e}");
                PredictReply::error(e.user_message())
            }
        }
    }

    /// Serves one connection until the peer closes it.
    ///
    /// # Arguments
    /// * `io` - The connection's byte stream.
    ///
    /// # Returns
    /// An io error if the connection broke.
    pub async fn serve<T>(&self, io: T) -> io::Result<()>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let mut lines = Framed::new(io, LinesCodec::new_with_max_length(MAX_LINE_LEN));

        while let Some(line) = lines.next().await {
            let reply = match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle(&line).await,
                // The codec ends the stream after this, so the reply is the last one.
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    warn!("request exceeded {MAX_LINE_LEN} bytes");
                    PredictReply::error(REQUEST_TOO_LARGE)
                }
                Err(LinesCodecError::Io(e)) => return Err(e),
            };

            lines.send(reply.to_line()).await.map_err(|e| match e {
                LinesCodecError::Io(e) => e,
                other => io::Error::other(other),
            })?;
        }

        debug!("connection closed by peer");
        Ok(())
    }

    /// Accepts connections forever, serving each one on its own task.
    ///
    /// # Returns
    /// An io error if the listener stopped accepting.
    pub async fn run(self, listener: TcpListener) -> io::Result<()> {
        loop {
            let (stream, addr) = listener.accept().await?;
            info!("client connected from {addr}");

            let service = self.clone();
            tokio::spawn(async move {
                if let Err(e) = service.serve(stream).await {
                    warn!("connection with {addr} failed: {e}");
                }
            });
        }
    }
}
