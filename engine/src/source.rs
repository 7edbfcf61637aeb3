use std::{io, path::PathBuf};

/// Somewhere the serialized network weights can be fetched from.
#[trait_variant::make(WeightSource: Send)]
pub trait WeightSourceTemplate {
    /// Fetches the raw weights document.
    ///
    /// # Returns
    /// The document's bytes or an io error if it couldn't be read.
    async fn fetch(&self) -> io::Result<Vec<u8>>;
}

/// Reads the weights document from a file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl WeightSource for FileSource {
    async fn fetch(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

/// A weights document already held in memory.
#[derive(Debug, Clone)]
pub struct BytesSource {
    bytes: Vec<u8>,
}

impl BytesSource {
    pub fn new<B: Into<Vec<u8>>>(bytes: B) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl WeightSource for BytesSource {
    async fn fetch(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}
