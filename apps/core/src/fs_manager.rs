use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Resolves the on-disk layout used by the engine's model cache.
pub struct PortablePathManager;

impl PortablePathManager {
    /// Application root directory.
    ///
    /// Debug builds point at `apps/core` so `cargo run` from the workspace
    /// finds the bundled `data/` tree; release builds use the executable's folder.
    pub fn root_dir() -> PathBuf {
        #[cfg(debug_assertions)]
        {
            let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            if manifest.exists() {
                return manifest;
            }
        }

        match std::env::current_exe() {
            Ok(mut path) => {
                path.pop();
                path
            }
            Err(e) => {
                warn!(
                    "Failed to get current exe path: {}. Falling back to current_dir.",
                    e
                );
                std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
            }
        }
    }

    /// Main data directory (./data).
    pub fn data_dir() -> PathBuf {
        Self::root_dir().join("data")
    }

    /// Embedding model cache (./data/models).
    pub fn models_dir() -> PathBuf {
        Self::data_dir().join("models")
    }

    /// fastembed download target inside a models directory.
    pub fn embeddings_dir(models_dir: &Path) -> PathBuf {
        models_dir.join("embeddings")
    }

    /// Creates the model cache tree if it does not exist yet.
    pub fn init(models_dir: &Path) -> Result<PathBuf, std::io::Error> {
        let embeddings = Self::embeddings_dir(models_dir);
        if !embeddings.exists() {
            info!("Creating model cache directory: {:?}", embeddings);
            fs::create_dir_all(&embeddings)?;
        }
        Ok(embeddings)
    }
}
