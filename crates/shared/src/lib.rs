pub mod design;
pub mod events;
pub mod view;

pub use design::{DesignId, DesignRecord};
pub use events::{AgentRole, ChatTurn, LogEntry, LogLevel};
pub use view::ViewMode;

pub mod settings {
    use serde::{Deserialize, Serialize};
    use std::fs;
    use std::path::{Path, PathBuf};

    fn default_true() -> bool {
        true
    }

    fn default_density() -> f32 {
        0.7
    }

    #[derive(Debug, thiserror::Error)]
    pub enum SettingsError {
        #[error("failed to access settings file {path}: {source}")]
        Io {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        #[error("settings file {path} is not valid JSON: {source}")]
        Parse {
            path: PathBuf,
            #[source]
            source: serde_json::Error,
        },
    }

    #[derive(Debug, Clone, Serialize, Deserialize, Default)]
    pub struct ProviderAuth {
        pub api_key: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ModelProvider {
        pub gemini_model: String, // e.g., "gemini-2.5-flash"
        pub temperature: f32,
        pub gemini_auth: ProviderAuth,
    }

    /// Knobs for the cosmetic CFD view
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct DisplaySettings {
        #[serde(default = "default_true")]
        pub show_streamlines: bool,
        /// Fraction of the particle pool that is drawn (0..=1)
        #[serde(default = "default_density")]
        pub streamline_density: f32,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AppSettings {
        pub model: ModelProvider,
        /// Optional JSON design catalog replacing the built-in one
        #[serde(default)]
        pub catalog_path: Option<String>,
        #[serde(default)]
        pub display: DisplaySettings,
    }

    impl Default for DisplaySettings {
        fn default() -> Self {
            Self {
                show_streamlines: true,
                streamline_density: default_density(),
            }
        }
    }

    impl Default for AppSettings {
        fn default() -> Self {
            Self {
                model: ModelProvider {
                    gemini_model: "gemini-2.5-flash".into(),
                    temperature: 0.7,
                    gemini_auth: ProviderAuth::default(),
                },
                catalog_path: None,
                display: DisplaySettings::default(),
            }
        }
    }

    impl AppSettings {
        pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
            let bytes = fs::read(path).map_err(|source| SettingsError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_slice(&bytes).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })
        }

        pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
            let io_err = |source| SettingsError::Io {
                path: path.to_path_buf(),
                source,
            };
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
            let json = serde_json::to_vec_pretty(self).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            fs::write(path, json).map_err(|source| SettingsError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    }

}
