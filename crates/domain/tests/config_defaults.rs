use cr_domain::config::{Config, ProviderSelection};

#[test]
fn default_listens_on_all_interfaces_port_3001() {
    let config = Config::default();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 3001);
}

#[test]
fn empty_file_is_zero_config_demo_mode() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.backend.selection(), ProviderSelection::Hosted);
    assert_eq!(config.backend.openai.api_key_env, "OPENAI_API_KEY");
    assert!(config.observability.otlp_endpoint.is_none());
}

#[test]
fn full_file_parses() {
    let toml_str = r#"
[server]
host = "127.0.0.1"
port = 9000

[backend]
provider = "huggingface"

[backend.huggingface]
model = "gpt2"
api_key_env = "HF_TOKEN"

[backend.ollama]
base_url = "http://10.0.0.5:11434"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.backend.selection(), ProviderSelection::ThirdParty);
    assert_eq!(config.backend.huggingface.model, "gpt2");
    assert_eq!(config.backend.huggingface.api_key_env, "HF_TOKEN");
    assert_eq!(
        config.backend.huggingface.base_url,
        "https://api-inference.huggingface.co/models"
    );
    assert_eq!(config.backend.ollama.base_url, "http://10.0.0.5:11434");
    assert_eq!(config.backend.ollama.model, "llama2");
}

#[test]
fn config_round_trips_through_toml() {
    let mut config = Config::default();
    config.backend.provider = "ollama".into();
    let rendered = toml::to_string_pretty(&config).unwrap();
    let parsed: Config = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed.backend.selection(), ProviderSelection::Local);
    assert_eq!(parsed.server.cors.allowed_origins, config.server.cors.allowed_origins);
}
