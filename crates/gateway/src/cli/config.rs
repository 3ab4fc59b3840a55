use cr_domain::config::{Config, ConfigSeverity};

/// Validate the config, printing any issues.
///
/// Returns `false` when at least one error was found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }
    println!("\n{error_count} error(s), {warning_count} warning(s) in {config_path}");

    error_count == 0
}

/// Render the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shown_config_parses_back() {
        let rendered = show(&Config::default()).unwrap();
        assert!(rendered.contains("[backend.ollama]"));
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.server.port, 3001);
    }

    #[test]
    fn port_zero_fails_validation() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(!validate(&config, "test.toml"));
    }
}
