//! Fallback delivery channel: scannable QR artifacts.
//!
//! When the agent is down or rejects a send, we produce a QR code wrapping
//! a deep link with the address and pre-filled message, so an operator can
//! scan it from the dashboard and complete delivery from their own device.
//! Producing the artifact never confirms delivery.

use async_trait::async_trait;
use chrono::Utc;
use qrcode::render::svg;
use qrcode::QrCode;
use std::path::{Path, PathBuf};
use taskdeck_common::types::{DeliveryArtifact, NormalizedAddress};
use tracing;

use crate::error::{NotifyError, Result};
use crate::FallbackChannel;

/// Renders deep-link QR codes into SVG files under a public directory.
pub struct QrChannel {
    artifact_dir: PathBuf,
    public_prefix: String,
}

impl QrChannel {
    pub fn new(artifact_dir: &str, public_prefix: &str) -> Self {
        Self {
            artifact_dir: PathBuf::from(artifact_dir),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Deep link that opens the messaging app with the recipient and the
    /// message body pre-filled.
    fn deep_link(address: &NormalizedAddress, message: &str) -> String {
        format!(
            "https://wa.me/{}?text={}",
            address,
            urlencoding::encode(message)
        )
    }

    fn render_svg(link: &str) -> Result<String> {
        let code = QrCode::new(link.as_bytes())
            .map_err(|e| NotifyError::ArtifactPersistenceFailed(format!("QR encoding: {e}")))?;
        Ok(code
            .render::<svg::Color>()
            .min_dimensions(256, 256)
            .build())
    }
}

#[async_trait]
impl FallbackChannel for QrChannel {
    async fn produce(
        &self,
        address: &NormalizedAddress,
        message: &str,
    ) -> Result<DeliveryArtifact> {
        let created_at = Utc::now();
        let link = Self::deep_link(address, message);
        let svg_body = Self::render_svg(&link)?;

        let filename = format!("qr-{}-{}.svg", address, created_at.timestamp_millis());
        let file_path = self.artifact_dir.join(&filename);

        persist(&self.artifact_dir, &file_path, &svg_body).await?;

        tracing::info!(to = %address, path = %file_path.display(), "Fallback artifact written");

        Ok(DeliveryArtifact {
            address: address.clone(),
            artifact_path: format!("{}/{}", self.public_prefix, filename),
            rendered_message: message.to_string(),
            created_at,
        })
    }
}

async fn persist(dir: &Path, file_path: &Path, body: &str) -> Result<()> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        NotifyError::ArtifactPersistenceFailed(format!("creating {}: {e}", dir.display()))
    })?;
    tokio::fs::write(file_path, body).await.map_err(|e| {
        NotifyError::ArtifactPersistenceFailed(format!("writing {}: {e}", file_path.display()))
    })
}
