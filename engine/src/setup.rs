//! Wiring of the file-backed engine used by the binaries

use std::path::PathBuf;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::core::PovertyGuidelines;
use crate::error::EngineResult;
use crate::orchestrator::QuoteEngine;
use crate::services::{ConfiguredProvider, FileBatchStore, RealMemberDirectory, RealReferenceStore};
use shared::{logging, service_info, ServiceId};

/// Engine over JSON reference data, a JSON member directory and JSON-lines history
pub type FileQuoteEngine =
    QuoteEngine<RealReferenceStore, RealMemberDirectory, FileBatchStore, ConfiguredProvider>;

/// Where the engine's data lives and how it runs
#[derive(Debug, Clone)]
pub struct EngineSources {
    pub reference: PathBuf,
    pub members: PathBuf,
    pub store_dir: PathBuf,
    /// Poverty guideline table overriding the built-in years
    pub poverty_table: Option<PathBuf>,
    pub max_concurrency: usize,
    pub provider_timeout: Duration,
}

impl EngineSources {
    pub async fn build(self) -> EngineResult<FileQuoteEngine> {
        let reference = RealReferenceStore::load(&self.reference).await?;
        let members = RealMemberDirectory::load(&self.members).await?;
        let batches = FileBatchStore::new(self.store_dir.clone());
        let provider = ConfiguredProvider::from_env()?;

        let guidelines = match &self.poverty_table {
            Some(path) => PovertyGuidelines::from_json_file(path)?,
            None => PovertyGuidelines::builtin(),
        };

        service_info!(
            ServiceId::current(),
            "📂 Reference {}, members {}, history in {}",
            self.reference.display(),
            self.members.display(),
            self.store_dir.display()
        );
        logging::log_progress(
            ServiceId::current(),
            "External affordability",
            if provider.is_enabled() { "enabled" } else { "disabled" },
        );

        let config = EngineConfig::default()
            .with_guidelines(guidelines)
            .with_max_concurrency(self.max_concurrency)
            .with_provider_timeout(self.provider_timeout);

        Ok(QuoteEngine::new(reference, members, batches, provider, config))
    }
}
