//! Configuration management for Kioku Server

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub anki: AnkiConfig,
    pub ocr: OcrConfig,
    pub enrichment: EnrichmentConfig,
    pub image: ImageConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request body limit for the image upload endpoint
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory where incoming images are kept while a card is built
    pub dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AnkiConfig {
    /// AnkiConnect endpoint
    pub url: String,
    pub timeout_secs: u64,
    /// Media uploads carry whole images, so they get a longer bound
    pub media_timeout_secs: u64,
    pub model_name: String,
    pub tags: Vec<String>,
    pub allow_duplicate: bool,
}

impl AnkiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn media_timeout(&self) -> Duration {
        Duration::from_secs(self.media_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrBackend {
    Tesseract,
    Ollama,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub backend: OcrBackend,
    pub tesseract_bin: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub default_language: String,
    pub timeout_secs: u64,
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// Word/reading dictionary endpoint (Jisho-compatible)
    pub reading_url: String,
    /// Translation endpoint (MyMemory-compatible)
    pub translate_url: String,
    /// ISO 639-1 code every card back is translated into
    pub target_lang: String,
    pub timeout_secs: u64,
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngCompression {
    Fast,
    Default,
    Best,
}

#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
    pub png_compression: PngCompression,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3003,
                max_upload_bytes: 20 * 1024 * 1024,
            },
            upload: UploadConfig {
                dir: PathBuf::from("./uploads"),
            },
            anki: AnkiConfig {
                url: "http://localhost:8765".to_string(),
                timeout_secs: 30,
                media_timeout_secs: 60,
                model_name: "Basic".to_string(),
                tags: vec!["auto-generated".to_string(), "image-import".to_string()],
                allow_duplicate: false,
            },
            ocr: OcrConfig {
                backend: OcrBackend::Tesseract,
                tesseract_bin: "tesseract".to_string(),
                ollama_url: "http://localhost:11434".to_string(),
                ollama_model: "llava".to_string(),
                default_language: "eng".to_string(),
                timeout_secs: 120,
            },
            enrichment: EnrichmentConfig {
                reading_url: "https://jisho.org/api/v1/search/words".to_string(),
                translate_url: "https://api.mymemory.translated.net/get".to_string(),
                target_lang: "es".to_string(),
                timeout_secs: 10,
            },
            image: ImageConfig {
                max_width: 1200,
                max_height: 1200,
                jpeg_quality: 85,
                png_compression: PngCompression::Best,
            },
        }
    }
}

impl Config {
    /// Build the configuration from environment variables, keeping defaults for unset keys
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.server.max_upload_bytes)?,
            },
            upload: UploadConfig {
                dir: env::var("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload.dir),
            },
            anki: AnkiConfig {
                url: env::var("ANKI_CONNECT_URL").unwrap_or(defaults.anki.url),
                timeout_secs: parse_var("ANKI_TIMEOUT_SECS", defaults.anki.timeout_secs)?,
                media_timeout_secs: parse_var(
                    "ANKI_MEDIA_TIMEOUT_SECS",
                    defaults.anki.media_timeout_secs,
                )?,
                model_name: env::var("ANKI_MODEL_NAME").unwrap_or(defaults.anki.model_name),
                tags: env::var("ANKI_TAGS")
                    .map(|tags| split_list(&tags))
                    .unwrap_or(defaults.anki.tags),
                allow_duplicate: parse_var("ANKI_ALLOW_DUPLICATE", defaults.anki.allow_duplicate)?,
            },
            ocr: OcrConfig {
                backend: match env::var("OCR_PROVIDER") {
                    Ok(value) => match value.to_ascii_lowercase().as_str() {
                        "tesseract" => OcrBackend::Tesseract,
                        "ollama" => OcrBackend::Ollama,
                        _ => return Err(ConfigError::Invalid { key: "OCR_PROVIDER", value }),
                    },
                    Err(_) => defaults.ocr.backend,
                },
                tesseract_bin: env::var("TESSERACT_BIN").unwrap_or(defaults.ocr.tesseract_bin),
                ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.ocr.ollama_url),
                ollama_model: env::var("OLLAMA_MODEL").unwrap_or(defaults.ocr.ollama_model),
                default_language: env::var("OCR_DEFAULT_LANGUAGE")
                    .unwrap_or(defaults.ocr.default_language),
                timeout_secs: parse_var("OCR_TIMEOUT_SECS", defaults.ocr.timeout_secs)?,
            },
            enrichment: EnrichmentConfig {
                reading_url: env::var("READING_LOOKUP_URL")
                    .unwrap_or(defaults.enrichment.reading_url),
                translate_url: env::var("TRANSLATE_URL").unwrap_or(defaults.enrichment.translate_url),
                target_lang: env::var("TRANSLATE_TARGET_LANG")
                    .unwrap_or(defaults.enrichment.target_lang),
                timeout_secs: parse_var("ENRICH_TIMEOUT_SECS", defaults.enrichment.timeout_secs)?,
            },
            image: ImageConfig {
                max_width: parse_var("IMAGE_MAX_WIDTH", defaults.image.max_width)?,
                max_height: parse_var("IMAGE_MAX_HEIGHT", defaults.image.max_height)?,
                jpeg_quality: parse_var("IMAGE_JPEG_QUALITY", defaults.image.jpeg_quality)?,
                png_compression: match env::var("IMAGE_PNG_COMPRESSION") {
                    Ok(value) => match value.to_ascii_lowercase().as_str() {
                        "fast" => PngCompression::Fast,
                        "default" => PngCompression::Default,
                        "best" => PngCompression::Best,
                        _ => {
                            return Err(ConfigError::Invalid {
                                key: "IMAGE_PNG_COMPRESSION",
                                value,
                            })
                        }
                    },
                    Err(_) => defaults.image.png_compression,
                },
            },
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_bounds() {
        let config = Config::default();
        assert_eq!(config.image.max_width, 1200);
        assert_eq!(config.image.max_height, 1200);
        assert_eq!(config.enrichment.timeout(), Duration::from_secs(10));
        assert_eq!(config.anki.media_timeout(), Duration::from_secs(60));
        assert!(!config.anki.allow_duplicate);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a, b,,c "), vec!["a", "b", "c"]);
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn test_parse_var_unset_uses_default() {
        let value: u16 = parse_var("KIOKU_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_malformed_value_is_reported() {
        std::env::set_var("KIOKU_TEST_MALFORMED_PORT", "eighty");
        let result: Result<u16, _> = parse_var("KIOKU_TEST_MALFORMED_PORT", 3003);
        std::env::remove_var("KIOKU_TEST_MALFORMED_PORT");

        match result {
            Err(ConfigError::Invalid { key, value }) => {
                assert_eq!(key, "KIOKU_TEST_MALFORMED_PORT");
                assert_eq!(value, "eighty");
            }
            other => panic!("expected an invalid value error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_env_rejects_malformed_port() {
        std::env::set_var("SERVER_PORT", "not-a-port");
        let result = Config::from_env();
        std::env::remove_var("SERVER_PORT");

        assert!(matches!(
            result,
            Err(ConfigError::Invalid { key: "SERVER_PORT", .. })
        ));
    }
}
