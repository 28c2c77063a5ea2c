//! Configuration loading and typed config structures for the agent.
//!
//! The canonical configuration lives in `blockwright.yaml`. Every field has
//! a default, so an empty file (or no file at all) yields a working agent.
//! `BLOCKWRIGHT_LOG` overrides `logging.level` after the file is read.

use std::path::Path;

use blockwright_types::ItemKind;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level agent configuration, mirroring `blockwright.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AgentConfig {
    /// Identity, timing, and startup script.
    #[serde(default)]
    pub agent: AgentSection,

    /// Plan executor settings.
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// State controller settings.
    #[serde(default)]
    pub controller: ControllerConfig,

    /// Combat and defense radii.
    #[serde(default)]
    pub combat: CombatConfig,

    /// Owner-follow settings.
    #[serde(default)]
    pub follow: FollowConfig,

    /// Structure planner settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Crafting resolver settings.
    #[serde(default)]
    pub crafting: CraftingConfig,

    /// Gather, mining, farming, fishing, and trade search radii.
    #[serde(default)]
    pub gather: GatherConfig,

    /// Exploration settings.
    #[serde(default)]
    pub explore: ExploreConfig,

    /// Hunger handling.
    #[serde(default)]
    pub survival: SurvivalConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AgentConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `BLOCKWRIGHT_LOG` overrides `logging.level` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Identity and timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentSection {
    /// Name used in logs and status messages.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Player the agent answers to. Used as the default follow target.
    #[serde(default)]
    pub owner: Option<String>,

    /// Seed for exploration routes.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks; 0 runs until told to quit.
    #[serde(default)]
    pub max_ticks: u64,

    /// Command lines fed to the agent at startup.
    #[serde(default)]
    pub script: Vec<String>,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            owner: None,
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
            script: Vec::new(),
        }
    }
}

/// Executor settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecutorConfig {
    /// Attempts per step before it is dropped.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Ticks an action may stay pending before it counts as timed out.
    #[serde(default = "default_step_timeout_ticks")]
    pub step_timeout_ticks: u64,

    /// Progress is reported each time it crosses a multiple of this
    /// percentage.
    #[serde(default = "default_progress_report_pct")]
    pub progress_report_pct: u32,

    /// Chebyshev distance from which the agent can act on a block.
    #[serde(default = "default_reach")]
    pub reach: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            step_timeout_ticks: default_step_timeout_ticks(),
            progress_report_pct: default_progress_report_pct(),
            reach: default_reach(),
        }
    }
}

/// Controller settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ControllerConfig {
    /// Ticks Idle must be active before a pending task may start.
    #[serde(default = "default_min_dwell_ticks")]
    pub min_dwell_ticks: u64,

    /// Ticks after which a running task is abandoned; 0 disables the watchdog.
    #[serde(default = "default_max_task_ticks")]
    pub max_task_ticks: u64,

    /// Status messages retained.
    #[serde(default = "default_status_capacity")]
    pub status_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            min_dwell_ticks: default_min_dwell_ticks(),
            max_task_ticks: default_max_task_ticks(),
            status_capacity: default_status_capacity(),
        }
    }
}

/// Combat and defense settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CombatConfig {
    /// Hostiles this close to the agent trigger Combat.
    #[serde(default = "default_threat_radius")]
    pub threat_radius: u32,

    /// Hostiles this close to the guard anchor trigger Defense.
    #[serde(default = "default_guard_radius")]
    pub guard_radius: u32,

    /// Consecutive threat-free ticks before a fight is over.
    #[serde(default = "default_calm_ticks")]
    pub calm_ticks: u32,

    /// Melee reach.
    #[serde(default = "default_attack_reach")]
    pub attack_reach: u32,

    /// Ticks a hostile that could not be reached is left alone.
    #[serde(default = "default_ignore_ticks")]
    pub ignore_ticks: u64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            threat_radius: default_threat_radius(),
            guard_radius: default_guard_radius(),
            calm_ticks: default_calm_ticks(),
            attack_reach: default_attack_reach(),
            ignore_ticks: default_ignore_ticks(),
        }
    }
}

/// Owner-follow settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FollowConfig {
    /// Distance kept from the owner.
    #[serde(default = "default_follow_distance")]
    pub distance: u32,

    /// Base wait after the owner could not be reached. Doubles with each
    /// consecutive give-up.
    #[serde(default = "default_follow_backoff_ticks")]
    pub backoff_ticks: u64,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            distance: default_follow_distance(),
            backoff_ticks: default_follow_backoff_ticks(),
        }
    }
}

/// Structure planner settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildConfig {
    /// Largest ring examined by the site search.
    #[serde(default = "default_search_radius")]
    pub search_radius: u32,

    /// Deepest supporting surface accepted below the agent's feet.
    #[serde(default = "default_max_surface_drop")]
    pub max_surface_drop: u32,

    /// Acceptable building blocks, best first.
    #[serde(default = "default_materials")]
    pub materials: Vec<ItemKind>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            search_radius: default_search_radius(),
            max_surface_drop: default_max_surface_drop(),
            materials: default_materials(),
        }
    }
}

/// Crafting resolver settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CraftingConfig {
    /// Deepest dependency chain the resolver follows.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Radius searched for an existing crafting table.
    #[serde(default = "default_station_search_radius")]
    pub station_search_radius: u32,

    /// Raw-material handoffs to Gather before a craft goal gives up.
    #[serde(default = "default_max_gather_handoffs")]
    pub max_gather_handoffs: u32,
}

impl Default for CraftingConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            station_search_radius: default_station_search_radius(),
            max_gather_handoffs: default_max_gather_handoffs(),
        }
    }
}

/// Search radii for resource tasks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatherConfig {
    /// Radius searched for source blocks, crops, water, and traders.
    #[serde(default = "default_gather_radius")]
    pub search_radius: u32,

    /// Re-plans a gather or mining goal may use before it fails.
    #[serde(default = "default_max_replans")]
    pub max_replans: u32,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            search_radius: default_gather_radius(),
            max_replans: default_max_replans(),
        }
    }
}

/// Exploration settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExploreConfig {
    /// Distance of each waypoint from the agent.
    #[serde(default = "default_explore_radius")]
    pub radius: u32,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            radius: default_explore_radius(),
        }
    }
}

/// Hunger handling.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SurvivalConfig {
    /// Idle eats when food drops below this.
    #[serde(default = "default_hunger_threshold")]
    pub hunger_threshold: u32,
}

impl Default for SurvivalConfig {
    fn default() -> Self {
        Self {
            hunger_threshold: default_hunger_threshold(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    /// Override the level with `BLOCKWRIGHT_LOG` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("BLOCKWRIGHT_LOG") {
            self.level = val;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_agent_name() -> String {
    String::from("blockwright")
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_step_timeout_ticks() -> u64 {
    40
}

const fn default_progress_report_pct() -> u32 {
    25
}

const fn default_reach() -> u32 {
    4
}

const fn default_min_dwell_ticks() -> u64 {
    5
}

const fn default_max_task_ticks() -> u64 {
    6000
}

const fn default_status_capacity() -> usize {
    64
}

const fn default_threat_radius() -> u32 {
    8
}

const fn default_guard_radius() -> u32 {
    10
}

const fn default_calm_ticks() -> u32 {
    3
}

const fn default_attack_reach() -> u32 {
    3
}

const fn default_ignore_ticks() -> u64 {
    600
}

const fn default_follow_distance() -> u32 {
    3
}

const fn default_follow_backoff_ticks() -> u64 {
    100
}

const fn default_search_radius() -> u32 {
    blockwright_behaviors::structure::DEFAULT_SEARCH_RADIUS
}

const fn default_max_surface_drop() -> u32 {
    blockwright_behaviors::structure::DEFAULT_MAX_SURFACE_DROP
}

fn default_materials() -> Vec<ItemKind> {
    blockwright_behaviors::placement::default_ranking()
}

const fn default_max_depth() -> usize {
    blockwright_behaviors::crafting::DEFAULT_MAX_DEPTH
}

const fn default_station_search_radius() -> u32 {
    16
}

const fn default_max_gather_handoffs() -> u32 {
    2
}

const fn default_gather_radius() -> u32 {
    32
}

const fn default_max_replans() -> u32 {
    3
}

const fn default_explore_radius() -> u32 {
    16
}

const fn default_hunger_threshold() -> u32 {
    8
}

fn default_log_level() -> String {
    String::from("info")
}
