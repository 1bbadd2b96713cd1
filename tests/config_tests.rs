use personadocs::clients::azure::AzureOpenAIClient;
use personadocs::config::ConfigError;
use personadocs::PersonaDocsConfig;
use std::io::Write;
use std::time::Duration;

#[test]
fn test_from_env_file_loads_azure_settings() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "model=docs-gpt4o").unwrap();
    writeln!(file, "api_key=secret").unwrap();
    writeln!(file, "azure_url=https://docs.openai.azure.com/").unwrap();
    writeln!(file, "api_ver=2024-02-15-preview").unwrap();

    let config = PersonaDocsConfig::from_env_file(file.path()).unwrap();

    assert_eq!(config.model, "docs-gpt4o");
    assert_eq!(config.api_key, "secret");
    assert_eq!(config.api_version, "2024-02-15-preview");
    assert_eq!(config.temperature, 0.1);
    assert_eq!(config.seed, Some(100));
    assert_eq!(config.max_rounds, 4);

    let client = AzureOpenAIClient::from_config(&config)
        .with_request_timeout(Duration::from_secs(5));
    assert_eq!(
        client.completions_url(),
        "https://docs.openai.azure.com/openai/deployments/docs-gpt4o/chat/completions?api-version=2024-02-15-preview"
    );
}

#[test]
fn test_missing_env_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = PersonaDocsConfig::from_env_file(dir.path().join("absent.env")).unwrap_err();
    assert!(matches!(err, ConfigError::EnvFile(_)));
}

#[test]
fn test_missing_variable_is_named() {
    let err = PersonaDocsConfig::from_lookup(|name| match name {
        "model" => Some("gpt-4o".to_string()),
        "api_key" => Some("k".to_string()),
        _ => None,
    })
    .unwrap_err();
    assert_eq!(err.to_string(), "Missing required environment variable: azure_url");
}
