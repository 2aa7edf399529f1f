use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub narrative: NarrativeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// 上传文件大小上限 (字节)
    pub max_bytes: usize,
}

/// 市场解读 (OpenAI 兼容接口) 配置
#[derive(Clone, Serialize, Deserialize)]
pub struct NarrativeConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

// api_key 不进日志
impl std::fmt::Debug for NarrativeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrativeConfig")
            .field("api_key", &if self.has_api_key() { "***" } else { "" })
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl NarrativeConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            temperature: 0.4,
            timeout_secs: 60,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            upload: UploadConfig {
                max_bytes: 20 * 1024 * 1024,
            },
            narrative: NarrativeConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// 加载配置：默认值 (含旧版环境变量) -> config/default 文件 -> 环境变量 (`SERVER__PORT` 形式)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_key = std::env::var("DEEPSEEK_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .unwrap_or_default();
        let base_url =
            std::env::var("DEEPSEEK_BASE_URL").unwrap_or(defaults.narrative.base_url.clone());
        let host = std::env::var("SERVER_HOST").unwrap_or(defaults.server.host.clone());
        let port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(defaults.server.port);

        Config::builder()
            .set_default("server.host", host)?
            .set_default("server.port", i64::from(port))?
            .set_default("upload.max_bytes", defaults.upload.max_bytes as i64)?
            .set_default("narrative.api_key", api_key)?
            .set_default("narrative.base_url", base_url)?
            .set_default("narrative.model", defaults.narrative.model)?
            .set_default("narrative.temperature", f64::from(defaults.narrative.temperature))?
            .set_default("narrative.timeout_secs", defaults.narrative.timeout_secs as i64)?
            .set_default("logging.level", defaults.logging.level)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::default().separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_masks_api_key() {
        let config = NarrativeConfig {
            api_key: "sk-secret".to_string(),
            ..NarrativeConfig::default()
        };

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn blank_api_key_is_treated_as_missing() {
        let config = NarrativeConfig {
            api_key: "   ".to_string(),
            ..NarrativeConfig::default()
        };
        assert!(!config.has_api_key());
    }
}
