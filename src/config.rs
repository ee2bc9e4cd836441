use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Static quest configuration: the exercise catalog plus the bonus and
/// progression rules. Fixed at process start, immutable thereafter; every
/// engine takes it by reference so derived values stay pure functions of
/// (config, history).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_catalog")]
    pub catalog: Vec<Exercise>,
    #[serde(default)]
    pub bonus: BonusConfig,
    #[serde(default)]
    pub progression: ProgressionConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// One tracked exercise: base XP award, base difficulty target, and the
/// increment applied when a progression step lands on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub xp: i64,
    pub target: u32,
    pub unit: String,
    pub step: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusConfig {
    /// Weekday name, parsed leniently ("Sat", "Saturday", "saturday").
    pub weekday: String,
    pub task: String,
    pub xp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Perfect days required per progression step.
    pub days_per_level: u32,
    /// Ordered subset of tasks whose targets auto-escalate, cycled through
    /// one per level. Tasks outside this list never escalate.
    pub cycle: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub db_name: String,
}

fn default_catalog() -> Vec<Exercise> {
    vec![
        Exercise {
            name: "Pushups".to_string(),
            xp: 15,
            target: 20,
            unit: "reps".to_string(),
            step: 2,
        },
        Exercise {
            name: "Squats".to_string(),
            xp: 15,
            target: 30,
            unit: "reps".to_string(),
            step: 5,
        },
        Exercise {
            name: "Plank".to_string(),
            xp: 20,
            target: 60,
            unit: "seconds".to_string(),
            step: 10,
        },
        Exercise {
            name: "Walking".to_string(),
            xp: 20,
            target: 5000,
            unit: "steps".to_string(),
            step: 500,
        },
        Exercise {
            name: "Ropeflow".to_string(),
            xp: 10,
            target: 180,
            unit: "seconds".to_string(),
            step: 30,
        },
    ]
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            weekday: "Sat".to_string(),
            task: "Ropeflow".to_string(),
            xp: 10,
        }
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            days_per_level: std::env::var("QUEST_DAYS_PER_LEVEL")
                .unwrap_or_else(|_| "14".to_string())
                .parse()
                .unwrap_or(14),
            cycle: vec![
                "Pushups".to_string(),
                "Squats".to_string(),
                "Plank".to_string(),
            ],
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_name: std::env::var("QUEST_DB_NAME")
                .unwrap_or_else(|_| "fitness_quest.db".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            bonus: BonusConfig::default(),
            progression: ProgressionConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl BonusConfig {
    pub fn weekday(&self) -> Weekday {
        self.weekday.parse().unwrap_or(Weekday::Sat)
    }
}

impl Config {
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::load)
    }

    /// Reads the config file if one exists, otherwise falls back to defaults.
    /// Never fails; an unreadable or invalid file is logged and ignored.
    pub fn load() -> Config {
        let path = std::env::var("QUEST_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::config_dir().map(|d| d.join("fitness-quest").join("config.toml")));

        if let Some(path) = path {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match toml::from_str::<Config>(&contents) {
                        Ok(config) => return config,
                        Err(e) => {
                            tracing::warn!("Invalid config at {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        tracing::warn!("Failed to read config at {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config::default()
    }

    pub fn exercise(&self, name: &str) -> Option<&Exercise> {
        self.catalog.iter().find(|e| e.name == name)
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.catalog.iter().map(|e| e.name.as_str())
    }

    /// The base difficulty targets before any progression steps.
    pub fn base_targets(&self) -> BTreeMap<String, u32> {
        self.catalog
            .iter()
            .map(|e| (e.name.clone(), e.target))
            .collect()
    }

    /// A completion map covering every tracked task, all false.
    pub fn empty_completion(&self) -> BTreeMap<String, bool> {
        self.catalog
            .iter()
            .map(|e| (e.name.clone(), false))
            .collect()
    }
}
