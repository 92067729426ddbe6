use std::sync::Arc;

use thiserror::Error;

use crate::models::ChainId;

/// Why a chain refresh did not happen. Cloneable so every caller joined to
/// the same in-flight refresh receives the same error.
#[derive(Error, Debug, Clone)]
pub enum RefreshError {
    #[error("{cause}")]
    Fetch {
        chain_id: ChainId,
        cause: Arc<anyhow::Error>,
    },

    #[error("Refresh task for chain {chain_id} failed: {message}")]
    Task { chain_id: ChainId, message: String },
}

impl RefreshError {
    pub fn fetch(chain_id: &str, source: anyhow::Error) -> Self {
        Self::Fetch {
            chain_id: chain_id.to_owned(),
            cause: Arc::new(source),
        }
    }

    pub fn chain_id(&self) -> &str {
        match self {
            Self::Fetch { chain_id, .. } | Self::Task { chain_id, .. } => chain_id,
        }
    }
}
