use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::llm_client::{CompletionService, GeminiClient};
use crate::table_client::{AirtableClient, TableStore};

/// Shared context handed to every batch job.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn TableStore>,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self> {
        let store = AirtableClient::new(
            config.airtable_api_url.clone(),
            config.airtable_base_id.clone(),
            config.airtable_api_key.clone(),
        )?;

        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }

    /// Builds the Gemini client. Fails when `GEMINI_API_KEY` is not configured.
    pub fn completion_service(&self) -> Result<Arc<dyn CompletionService>> {
        let api_key = self.config.require_gemini_api_key()?;
        let client = GeminiClient::new(
            self.config.gemini_api_url.clone(),
            self.config.gemini_model.clone(),
            api_key.to_string(),
        )?;
        tracing::info!("LLM client initialized (model: {})", client.model());
        Ok(Arc::new(client))
    }
}
