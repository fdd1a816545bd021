use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub courier_base_url: String,
    pub courier_token: String,
    /// TTL in seconds for the slot-availability cache.
    pub slot_cache_ttl_secs: u64,
    /// Path prefix the dashboard navigates to after a successful submission.
    pub tracking_path_prefix: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            courier_base_url: std::env::var("COURIER_BASE_URL")
                .map_err(|_| anyhow::anyhow!("COURIER_BASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("COURIER_BASE_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("COURIER_BASE_URL must start with http:// or https://");
                    }
                    Ok(url.trim_end_matches('/').to_string())
                })?,
            courier_token: std::env::var("COURIER_TOKEN")
                .map_err(|_| anyhow::anyhow!("COURIER_TOKEN environment variable required"))
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("COURIER_TOKEN cannot be empty");
                    }
                    Ok(token)
                })?,
            slot_cache_ttl_secs: std::env::var("SLOT_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SLOT_CACHE_TTL_SECS must be a valid number"))?,
            tracking_path_prefix: std::env::var("TRACKING_PATH_PREFIX")
                .unwrap_or_else(|_| "/orders/tracking".to_string()),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Courier base URL: {}", config.courier_base_url);
        tracing::debug!("Server port: {}", config.port);
        tracing::debug!("Slot cache TTL: {}s", config.slot_cache_ttl_secs);

        Ok(config)
    }
}
