//! Configuration management for Ragscope.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - Config file (`.ragscope/config.yaml` or `--config`)
//! - Environment variables (`RAGSCOPE_*`)
//! - Command-line flags
//!
//! Relative paths in the configuration are resolved against the workspace.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".ragscope";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .ragscope/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub dataset: DatasetSettings,
    pub embedding: EmbeddingSettings,
    pub store: StoreSettings,
    pub cache: CacheSettings,
    pub evaluation: EvaluationSettings,
    pub output: OutputSettings,
    pub llm: LlmSettings,
}

/// Input dataset location and identity column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DatasetSettings {
    pub path: PathBuf,

    /// Column used as document id when present; ordinal row index otherwise
    pub id_column: String,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/customer_reviews.csv"),
            id_column: "review_id".to_string(),
        }
    }
}

/// Embedding model selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Provider endpoint, for HTTP providers
    pub endpoint: Option<String>,

    /// Maximum number of texts sent per embedding batch
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
            batch_size: 32,
        }
    }
}

/// Vector store location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreSettings {
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(STATE_DIR).join("store.sqlite"),
        }
    }
}

/// What ingestion does when a single row fails to embed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RowErrorPolicy {
    /// Abort the whole batch; nothing is cached or stored
    #[default]
    Abort,
    /// Log the row, leave it out of the cache and the store, keep going
    Skip,
}

/// Embedding cache behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheSettings {
    /// Rebuild the cache when the dataset hash or embedding model changed.
    /// When false an existing cache artifact is reused unconditionally.
    pub validate: bool,

    pub on_row_error: RowErrorPolicy,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            validate: true,
            on_row_error: RowErrorPolicy::Abort,
        }
    }
}

/// A topic query and a free-text description of what it should surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicQuery {
    pub topic: String,
    pub description: String,
}

impl TopicQuery {
    pub fn new(topic: &str, description: &str) -> Self {
        Self {
            topic: topic.to_string(),
            description: description.to_string(),
        }
    }
}

/// Evaluation job parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluationSettings {
    pub top_k: usize,
    pub sample_size: usize,

    /// Fixed RNG seed for the health sample; random when absent
    pub sample_seed: Option<u64>,

    /// Canonical queries for the recall proxy
    pub recall_queries: Vec<String>,

    /// Topics for the retrieval evaluation job
    pub retrieval_queries: Vec<TopicQuery>,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            sample_size: 10,
            sample_seed: None,
            recall_queries: vec![
                "room cleanliness".to_string(),
                "breakfast quality".to_string(),
                "customer service".to_string(),
            ],
            retrieval_queries: vec![
                TopicQuery::new("room cleanliness", "dirty, unclean, dusty, smelled bad"),
                TopicQuery::new("customer service", "rude, unhelpful, slow response"),
                TopicQuery::new("breakfast quality", "cold food, poor variety"),
                TopicQuery::new("check-in experience", "fast, friendly, easy process"),
                TopicQuery::new(
                    "location satisfaction",
                    "close to beach, convenient, far from city",
                ),
            ],
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub session_log: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("outputs"),
            session_log: PathBuf::from("outputs").join("session_log.csv"),
        }
    }
}

/// Answer generator settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    pub provider: String,
    pub model: String,
    pub endpoint: Option<String>,

    /// System prompt sent with every `ask` request
    pub system_prompt: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            endpoint: None,
            system_prompt: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    dataset: Option<DatasetSettings>,
    embedding: Option<EmbeddingSettings>,
    store: Option<StoreSettings>,
    cache: Option<CacheSettings>,
    evaluation: Option<EvaluationSettings>,
    output: Option<OutputSettings>,
    llm: Option<LlmSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            dataset: DatasetSettings::default(),
            embedding: EmbeddingSettings::default(),
            store: StoreSettings::default(),
            cache: CacheSettings::default(),
            evaluation: EvaluationSettings::default(),
            output: OutputSettings::default(),
            llm: LlmSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment variables.
    ///
    /// `workspace` and `config_file` come from the command line when given, so the
    /// right file is read before the remaining flags are applied.
    ///
    /// Environment variables:
    /// - `RAGSCOPE_DATASET`: Dataset path
    /// - `RAGSCOPE_EMBEDDING_PROVIDER`: Embedding provider
    /// - `RAGSCOPE_EMBEDDING_MODEL`: Embedding model
    /// - `RAGSCOPE_LLM_PROVIDER`: Answer generator provider
    /// - `RAGSCOPE_LLM_MODEL`: Answer generator model
    /// - `RAGSCOPE_OUTPUT_DIR`: Output directory
    /// - `NO_COLOR`: Disable colored output
    pub fn load(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }
        config.config_file = config_file;

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match &config.config_file {
            Some(cf) => cf.clone(),
            None => config.state_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.merge_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        self.apply_file(file);
        tracing::debug!("Merged config file {:?}", path);
        Ok(())
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(dataset) = file.dataset {
            self.dataset = dataset;
        }
        if let Some(embedding) = file.embedding {
            self.embedding = embedding;
        }
        if let Some(store) = file.store {
            self.store = store;
        }
        if let Some(cache) = file.cache {
            self.cache = cache;
        }
        if let Some(evaluation) = file.evaluation {
            self.evaluation = evaluation;
        }
        if let Some(output) = file.output {
            self.output = output;
        }
        if let Some(llm) = file.llm {
            self.llm = llm;
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }
    }

    /// Apply environment overrides read through `lookup`.
    fn merge_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dataset) = lookup("RAGSCOPE_DATASET") {
            self.dataset.path = PathBuf::from(dataset);
        }
        if let Some(provider) = lookup("RAGSCOPE_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }
        if let Some(model) = lookup("RAGSCOPE_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(provider) = lookup("RAGSCOPE_LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Some(model) = lookup("RAGSCOPE_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(dir) = lookup("RAGSCOPE_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }
        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over the config file and environment variables.
    pub fn with_overrides(
        mut self,
        dataset: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(dataset) = dataset {
            self.dataset.path = dataset;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve a configured path against the workspace.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Get the path to the .ragscope directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Ensure the .ragscope directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.resolve(&self.dataset.path)
    }

    pub fn store_path(&self) -> PathBuf {
        self.resolve(&self.store.path)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.output.dir)
    }

    pub fn session_log_path(&self) -> PathBuf {
        self.resolve(&self.output.session_log)
    }

    /// Validate settings that would otherwise fail deep inside a job.
    pub fn validate(&self) -> AppResult<()> {
        let known_embedders = ["trigram", "ollama"];
        if !known_embedders.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                known_embedders.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "embedding.batchSize must be greater than zero".to_string(),
            ));
        }

        if self.evaluation.top_k == 0 {
            return Err(AppError::Config(
                "evaluation.topK must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
