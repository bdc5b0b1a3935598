use crate::error::{HandoverError, Result};
use crate::paths;
use crate::record::TargetBot;
use crate::types::ConnectorType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// TakeBackConfig
// ---------------------------------------------------------------------------

/// When the primary bot reclaims a conversation on its own initiative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TakeBackConfig {
    /// Reclaim once the user has been silent for `after_minutes`.
    Inactivity { after_minutes: u32 },
    Never,
}

impl Default for TakeBackConfig {
    fn default() -> Self {
        Self::Inactivity { after_minutes: 30 }
    }
}

// ---------------------------------------------------------------------------
// OrchestrationSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub start_intents: Vec<String>,
    #[serde(default)]
    pub stop_intents: Vec<String>,
    #[serde(default)]
    pub no_orchestration_intents: Vec<String>,
    #[serde(default = "default_comeback_story")]
    pub comeback_story: String,
    #[serde(default = "default_flag_ttl_minutes")]
    pub flag_ttl_minutes: u32,
    #[serde(default)]
    pub take_back: TakeBackConfig,
    /// Secondary bots offered to the orchestrator, per connector.
    #[serde(default)]
    pub eligible_bots: BTreeMap<ConnectorType, Vec<TargetBot>>,
}

fn default_enabled() -> bool {
    true
}

fn default_comeback_story() -> String {
    "comeback".to_string()
}

fn default_flag_ttl_minutes() -> u32 {
    60
}

impl Default for OrchestrationSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            start_intents: Vec::new(),
            stop_intents: Vec::new(),
            no_orchestration_intents: Vec::new(),
            comeback_story: default_comeback_story(),
            flag_ttl_minutes: default_flag_ttl_minutes(),
            take_back: TakeBackConfig::default(),
            eligible_bots: BTreeMap::new(),
        }
    }
}

impl OrchestrationSettings {
    pub fn is_start_intent(&self, intent: &str) -> bool {
        self.start_intents.iter().any(|i| i == intent)
    }

    pub fn is_stop_intent(&self, intent: &str) -> bool {
        self.stop_intents.iter().any(|i| i == intent)
    }

    pub fn is_no_orchestration_intent(&self, intent: &str) -> bool {
        self.no_orchestration_intents.iter().any(|i| i == intent)
    }

    pub fn eligible_bots_for(&self, connector: &ConnectorType) -> &[TargetBot] {
        self.eligible_bots
            .get(connector)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn flag_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.flag_ttl_minutes))
    }
}

// ---------------------------------------------------------------------------
// OrchestratorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8089".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            api_token: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// MessageTemplates
// ---------------------------------------------------------------------------

pub const BOT_PLACEHOLDER: &str = "{bot}";

/// User-facing copy for lifecycle transitions. `{bot}` is replaced by the
/// secondary bot's label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplates {
    #[serde(default = "default_started")]
    pub started: String,
    #[serde(default = "default_ended")]
    pub ended: String,
    #[serde(default = "default_interrupted")]
    pub interrupted: String,
}

fn default_started() -> String {
    "You are now talking with {bot}.".to_string()
}

fn default_ended() -> String {
    "The conversation with {bot} is now over.".to_string()
}

fn default_interrupted() -> String {
    "The conversation with {bot} was interrupted.".to_string()
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            started: default_started(),
            ended: default_ended(),
            interrupted: default_interrupted(),
        }
    }
}

impl MessageTemplates {
    pub fn render(template: &str, bot_label: &str) -> String {
        template.replace(BOT_PLACEHOLDER, bot_label)
    }

    pub fn started(&self, bot_label: &str) -> String {
        Self::render(&self.started, bot_label)
    }

    pub fn ended(&self, bot_label: &str) -> String {
        Self::render(&self.ended, bot_label)
    }

    pub fn interrupted(&self, bot_label: &str) -> String {
        Self::render(&self.interrupted, bot_label)
    }
}

// ---------------------------------------------------------------------------
// BotConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub bot: BotConfig,
    #[serde(default)]
    pub orchestration: OrchestrationSettings,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub messages: MessageTemplates,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            bot: BotConfig {
                name: bot_name.into(),
                description: None,
            },
            orchestration: OrchestrationSettings::default(),
            orchestrator: OrchestratorConfig::default(),
            messages: MessageTemplates::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(HandoverError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let orch = &self.orchestration;

        if orch.enabled && orch.start_intents.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "orchestration is enabled but no start_intents are configured"
                    .to_string(),
            });
        }

        if orch.enabled && orch.eligible_bots.values().all(|bots| bots.is_empty()) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "orchestration is enabled but no eligible_bots are configured"
                    .to_string(),
            });
        }

        // An intent that both starts and stops would close the record it opens.
        for intent in &orch.start_intents {
            if orch.is_stop_intent(intent) || orch.is_no_orchestration_intent(intent) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "intent '{}' is both a start intent and a stop/no-orchestration intent",
                        intent
                    ),
                });
            }
        }

        for (connector, bots) in &orch.eligible_bots {
            for bot in bots {
                if bot.bot_id.trim().is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: format!("eligible bot on connector '{}' has an empty bot_id", connector),
                    });
                }
                if bot.label.trim().is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "bot '{}' on connector '{}' has no label; users will see an empty name",
                            bot.bot_id, connector
                        ),
                    });
                }
            }
        }

        if orch.comeback_story.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "orchestration.comeback_story is empty".to_string(),
            });
        }

        if orch.flag_ttl_minutes == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "orchestration.flag_ttl_minutes is 0; flags would expire immediately"
                    .to_string(),
            });
        }

        if let TakeBackConfig::Inactivity { after_minutes: 0 } = orch.take_back {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "take_back.after_minutes is 0; every turn would take the conversation back"
                    .to_string(),
            });
        }

        if self.orchestrator.base_url.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "orchestrator.base_url is empty".to_string(),
            });
        }

        if self.orchestrator.timeout_ms == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "orchestrator.timeout_ms is 0; every call would time out".to_string(),
            });
        }

        for (name, template) in [
            ("started", &self.messages.started),
            ("ended", &self.messages.ended),
            ("interrupted", &self.messages.interrupted),
        ] {
            if !template.contains(BOT_PLACEHOLDER) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "messages.{} does not mention {}; users won't know which bot is meant",
                        name, BOT_PLACEHOLDER
                    ),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
