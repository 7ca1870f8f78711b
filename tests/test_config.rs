use _formcraft_core::config::{ApiConfig, DEFAULT_API_URL};

#[test]
fn test_config_from_uri_appends_trailing_slash() -> anyhow::Result<()> {
    let config = ApiConfig::from_uri("https://forms.example.com/backend")?;
    assert_eq!(config.base_url().as_str(), "https://forms.example.com/backend/");

    let endpoint = config.endpoint("/api/v1/form/")?;
    assert_eq!(
        endpoint.as_str(),
        "https://forms.example.com/backend/api/v1/form/"
    );
    Ok(())
}

#[test]
fn test_config_rejects_unsupported_schemes() -> anyhow::Result<()> {
    let result = ApiConfig::from_uri("ftp://files.example.com/");
    assert!(result.is_err());
    let message = result.err().map(|e| e.to_string()).unwrap_or_default();
    assert!(message.contains("Unsupported API scheme"));

    assert!(ApiConfig::from_uri("not a url").is_err());
    Ok(())
}

#[test]
fn test_config_default_points_at_local_server() -> anyhow::Result<()> {
    let config = ApiConfig::default();
    assert_eq!(config.base_url().as_str(), DEFAULT_API_URL);
    Ok(())
}

#[test]
fn test_config_endpoint_segments_encode_each_segment() -> anyhow::Result<()> {
    let config = ApiConfig::from_uri("https://forms.example.com/backend/")?;
    let url = config.endpoint_segments(&["api", "v1", "tables", "a b/c", "fields"])?;
    assert_eq!(
        url.as_str(),
        "https://forms.example.com/backend/api/v1/tables/a%20b%2Fc/fields/"
    );
    Ok(())
}
