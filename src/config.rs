#[cfg(feature = "configs")]
pub mod configuration {
    use config::builder::DefaultState;
    use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
    use serde::Deserialize;

    use crate::ParserConfig;

    const ENV_PREFIX: &str = "TRANSIT_FEED";

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum FeedKind {
        CarPark,
        Traffic,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(default)]
    pub struct ParserSettings {
        pub buffer_size: usize,
        pub max_token_len: usize,
        pub name_array_elements: bool,
    }

    impl Default for ParserSettings {
        fn default() -> Self {
            let defaults = ParserConfig::default();
            Self {
                buffer_size: defaults.buffer_size,
                max_token_len: defaults.max_token_len,
                name_array_elements: defaults.name_array_elements,
            }
        }
    }

    impl From<ParserSettings> for ParserConfig {
        fn from(settings: ParserSettings) -> Self {
            Self {
                buffer_size: settings.buffer_size,
                max_token_len: settings.max_token_len,
                name_array_elements: settings.name_array_elements,
            }
        }
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct FeedSettings {
        pub feed: FeedKind,
        /// File path, or an `http(s)://` URL.
        pub source: String,
        #[serde(default)]
        pub parser: ParserSettings,
        #[serde(default = "default_http_timeout_secs")]
        pub http_timeout_secs: u64,
    }

    fn default_http_timeout_secs() -> u64 {
        30
    }

    impl FeedSettings {
        pub fn is_remote(&self) -> bool {
            self.source.starts_with("http://") || self.source.starts_with("https://")
        }
    }

    /// Loads settings from an optional file, then `TRANSIT_FEED_*` variables
    /// (`TRANSIT_FEED_PARSER__BUFFER_SIZE` for nested keys).
    pub fn load_settings(path: Option<&str>) -> Result<FeedSettings, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        finish(builder)
    }

    pub fn settings_from_toml(text: &str) -> Result<FeedSettings, ConfigError> {
        finish(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<FeedSettings, ConfigError> {
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_settings_with_defaults() {
            let settings = settings_from_toml(
                r#"
                feed = "car-park"
                source = "feeds/carParkData.json"
                "#,
            )
            .unwrap();
            assert_eq!(settings.feed, FeedKind::CarPark);
            assert!(!settings.is_remote());
            assert_eq!(settings.http_timeout_secs, 30);
            assert_eq!(settings.parser.buffer_size, ParserConfig::default().buffer_size);
        }

        #[test]
        fn test_settings_with_parser_section() {
            let settings = settings_from_toml(
                r#"
                feed = "traffic"
                source = "https://example.org/trafficEvents.json"
                http_timeout_secs = 5

                [parser]
                buffer_size = 512
                name_array_elements = true
                "#,
            )
            .unwrap();
            assert_eq!(settings.feed, FeedKind::Traffic);
            assert!(settings.is_remote());
            let config = ParserConfig::from(settings.parser);
            assert_eq!(config.buffer_size, 512);
            assert!(config.name_array_elements);
            assert_eq!(config.max_token_len, ParserConfig::default().max_token_len);
        }

        #[test]
        fn test_missing_feed_kind() {
            assert!(settings_from_toml(r#"source = "x.json""#).is_err());
        }
    }
}
