//! Tests for configuration parsing.

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use figment::Figment;
    use figment::providers::{Format, Yaml};

    use crate::config::CatalogConfig;

    #[test]
    fn test_config_default() {
        let config = CatalogConfig::default();
        assert_eq!(config.database.dsn, "sqlite::memory:");
        assert!(config.hydrate.cache.enabled);
        assert!(config.hydrate.overrides.is_empty());
        assert!(!config.bootstrap_schema);
    }

    #[test]
    fn test_config_parse_nested_sections() {
        let yaml = r#"
database:
  dsn: "sqlite://data/seedbank.db"
  acquire_timeout: "2s"
hydrate:
  cache:
    ttl: "10m"
  overrides:
    license:
      enabled: false
bootstrap_schema: true
"#;
        let config: CatalogConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.database.dsn, "sqlite://data/seedbank.db");
        assert_eq!(config.database.acquire_timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.hydrate.cache.ttl, Some(Duration::from_secs(600)));
        assert!(!config.hydrate.settings_for("license").enabled);
        assert!(config.hydrate.settings_for("accession").enabled);
        assert!(config.bootstrap_schema);
    }

    #[test]
    fn test_config_reject_unknown_fields() {
        let yaml = r#"
database:
  dsn: "sqlite::memory:"
cache_everything: true
"#;
        let result: Result<CatalogConfig, _> = serde_saphyr::from_str(yaml);
        assert!(
            result.is_err(),
            "Config should reject unknown fields due to deny_unknown_fields"
        );
    }

    #[test]
    fn test_config_load_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bootstrap_schema: true").unwrap();
        writeln!(file, "hydrate:").unwrap();
        writeln!(file, "  cache:").unwrap();
        writeln!(file, "    max_entries: 50").unwrap();

        let config = CatalogConfig::load(Some(file.path())).unwrap();
        assert!(config.bootstrap_schema);
        assert_eq!(config.hydrate.cache.max_entries, 50);
        assert_eq!(config.database.dsn, "sqlite::memory:"); // default
    }

    #[test]
    fn test_config_empty_figment_yields_defaults() {
        let config: CatalogConfig = Figment::new().extract().unwrap();
        assert_eq!(config, CatalogConfig::default());
    }

    #[test]
    fn test_config_figment_section_overrides() {
        let figment = Figment::new().merge(Yaml::string(
            "database:\n  dsn: \"sqlite://other.db\"\n  max_conns: 3\n",
        ));
        let config: CatalogConfig = figment.extract().unwrap();
        assert_eq!(config.database.dsn, "sqlite://other.db");
        assert_eq!(config.database.max_conns, Some(3));
        assert_eq!(config.database.acquire_timeout, Some(Duration::from_secs(30)));
    }
}
