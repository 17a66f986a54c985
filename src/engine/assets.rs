//! Model asset loading with a single fallback.
//!
//! Asset references are site paths such as `/models/taj_mahal.glb`. A load
//! tries the requested asset once, then the fallback once, then settles on the
//! built-in placeholder. There is no retry and no timeout.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use ts_rs::TS;

use crate::error::AppError;

pub const PLACEHOLDER_PATH: &str = "builtin://placeholder-cube";

// ── Types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ModelAsset {
    pub path: String,
    /// Zero for the placeholder.
    pub size_bytes: u64,
}

impl ModelAsset {
    pub fn placeholder() -> Self {
        Self {
            path: PLACEHOLDER_PATH.into(),
            size_bytes: 0,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.path == PLACEHOLDER_PATH
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "status", rename_all = "lowercase")]
#[ts(export)]
pub enum AssetLoad {
    Loaded { asset: ModelAsset },
    Fallback { asset: ModelAsset, reason: String },
}

impl AssetLoad {
    pub fn asset(&self) -> &ModelAsset {
        match self {
            AssetLoad::Loaded { asset } | AssetLoad::Fallback { asset, .. } => asset,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AssetLoad::Fallback { .. })
    }
}

// ── Sources ────────────────────────────────────────────────────────

#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<ModelAsset, AppError>;
}

/// Resolves asset paths beneath a directory on disk.
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if path.trim().is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::Asset(format!("invalid asset path '{path}'")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetSource for FsAssetSource {
    async fn fetch(&self, path: &str) -> Result<ModelAsset, AppError> {
        let full = self.resolve(path)?;
        let meta = tokio::fs::metadata(&full)
            .await
            .map_err(|e| AppError::Asset(format!("{path}: {e}")))?;
        if !meta.is_file() {
            return Err(AppError::Asset(format!("{path}: not a file")));
        }
        Ok(ModelAsset {
            path: path.to_string(),
            size_bytes: meta.len(),
        })
    }
}

// ── Loading ────────────────────────────────────────────────────────

/// Load `path`, falling back once to `fallback`, then to the placeholder.
pub async fn load_model(source: &dyn AssetSource, path: &str, fallback: &str) -> AssetLoad {
    let primary_err = match source.fetch(path).await {
        Ok(asset) => return AssetLoad::Loaded { asset },
        Err(e) => e,
    };
    tracing::warn!(path, error = %primary_err, "Model failed to load, using fallback");

    match source.fetch(fallback).await {
        Ok(asset) => AssetLoad::Fallback {
            asset,
            reason: primary_err.to_string(),
        },
        Err(fallback_err) => {
            tracing::warn!(fallback, error = %fallback_err, "Fallback model failed to load");
            AssetLoad::Fallback {
                asset: ModelAsset::placeholder(),
                reason: format!("{primary_err}; fallback: {fallback_err}"),
            }
        }
    }
}
