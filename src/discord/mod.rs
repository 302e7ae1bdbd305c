//! # Discord Webhook Integration
//!
//! Primary alert channel: posts an embed to a Discord webhook when a date
//! turns up open seats.
//!
//! ## Embed Structure
//!
//! - **Title**: the alert title (`台鐵有票！<date>`)
//! - **Description**: route, date and the trains with seats
//! - **URL**: the booking site's search page
//! - **Color**: railway green (`0x0000_A651`)
//! - **Timestamp**: when the seats were found
//!
//! ## Environment Configuration
//!
//! Set `DISCORD_WEBHOOK_URL` to enable this channel. When it is unset every
//! call fails with [`CheckError::Notify`] so the caller can fall back to the
//! terminal bell.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::{info, warn};

use crate::error::CheckError;
use crate::models::{DiscordEmbed, DiscordMessage};
use crate::traits::Notifier;

const EMBED_COLOR: u32 = 0x0000_A651;

/// Discord webhook notification client for seat alerts.
///
/// `webhook_url` is optional so the bot runs unchanged without Discord;
/// in that case [`Notifier::notify`] reports the channel as unavailable.
#[derive(Clone)]
pub struct DiscordNotifier {
    /// Reusable HTTP client for making webhook requests to Discord's API.
    client: Client,

    /// Webhook URL, usually from `DISCORD_WEBHOOK_URL`.
    webhook_url: Option<String>,

    /// Link attached to every embed.
    link: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: Option<String>, link: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url,
            link: link.into(),
        }
    }

    /// Creates a notifier configured from `DISCORD_WEBHOOK_URL`.
    pub fn from_env(link: impl Into<String>) -> Self {
        let webhook_url = std::env::var("DISCORD_WEBHOOK_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        if webhook_url.is_none() {
            warn!("DISCORD_WEBHOOK_URL not set - alerts will use the terminal bell only");
        }

        Self::new(webhook_url, link)
    }

    /// Build the webhook payload for one alert.
    pub fn message(&self, title: &str, description: &str) -> DiscordMessage {
        DiscordMessage {
            embeds: vec![DiscordEmbed {
                title: title.to_string(),
                description: description.to_string(),
                url: self.link.clone(),
                color: EMBED_COLOR,
                timestamp: Utc::now().to_rfc3339(),
            }],
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), CheckError> {
        let Some(webhook_url) = &self.webhook_url else {
            return Err(CheckError::notify("Discord webhook not configured"));
        };

        let payload = self.message(title, message);
        let response = self
            .client
            .post(webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CheckError::notify(format!("Discord webhook request failed: {e}")))?;

        if response.status().is_success() {
            info!("Discord notification sent: {}", title);
            Ok(())
        } else {
            Err(CheckError::notify(format!(
                "Discord webhook returned {}",
                response.status()
            )))
        }
    }
}
