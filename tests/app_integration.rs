use std::fs;
use tempfile::TempDir;
use xfx::cli::convert::ConvertArgs;
use xfx::cli::favorites::FavoritesAction;
use xfx::cli::history::HistoryAction;
use xfx::core::config::AppConfig;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const RATES_USD: &str = r#"{
        "result": "success",
        "base_code": "USD",
        "conversion_rates": {"USD": 1, "EUR": 0.9, "INR": 83.12, "GBP": 0.8}
    }"#;

    pub async fn create_rates_server(base: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        let url_path = format!("/test-key/latest/{base}");

        Mock::given(method("GET"))
            .and(path(&url_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    /// Writes a config into `dir` pointing at the mock servers.
    pub fn write_config(
        dir: &std::path::Path,
        rates_url: &str,
        backend_url: Option<&str>,
    ) -> std::path::PathBuf {
        let backend = backend_url
            .map(|url| {
                format!(
                    r#"
  backend:
    base_url: "{url}"
    token: "anon""#
                )
            })
            .unwrap_or_default();
        let storage = if backend_url.is_some() {
            "remote"
        } else {
            "local"
        };

        let config_content = format!(
            r#"
providers:
  exchange_rate:
    base_url: "{rates_url}"
    api_key: "test-key"{backend}
storage: {storage}
from_currency: "USD"
to_currency: "EUR"
data_path: "{}"
"#,
            dir.join("data").display()
        );

        let config_path = dir.join("config.yaml");
        std::fs::write(&config_path, config_content).expect("Failed to write config file");
        config_path
    }
}

#[test_log::test(tokio::test)]
async fn test_convert_save_and_list_history() {
    let mock_server = test_utils::create_rates_server("USD", test_utils::RATES_USD).await;
    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(temp_dir.path(), &mock_server.uri(), None);
    let config_path = config_path.to_str().unwrap();

    let result = xfx::run_command(
        xfx::AppCommand::Convert(ConvertArgs {
            amount: "100".to_string(),
            save: Some(Some("rent".to_string())),
            ..Default::default()
        }),
        Some(config_path),
    )
    .await;
    assert!(result.is_ok(), "Convert failed with: {:?}", result.err());

    let result = xfx::run_command(xfx::AppCommand::History(HistoryAction::List), Some(config_path)).await;
    assert!(result.is_ok(), "History failed with: {:?}", result.err());

    let config = AppConfig::load_from_path(config_path).unwrap();
    let converter = xfx::open_converter(&config).await.unwrap();

    let entries = converter.history().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].from_amount, "100");
    assert_eq!(entries[0].from_currency, "USD");
    assert_eq!(entries[0].to_amount, "90");
    assert_eq!(entries[0].to_currency, "EUR");
    assert_eq!(entries[0].description.as_deref(), Some("rent"));

    // The one-shot conversion also counts as a recent amount.
    let recent = converter.recent_amounts();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].from, "100");
    assert_eq!(recent[0].to, "90");
}

#[test_log::test(tokio::test)]
async fn test_reverse_convert_to_other_pair() {
    let mock_server = test_utils::create_rates_server("USD", test_utils::RATES_USD).await;
    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(temp_dir.path(), &mock_server.uri(), None);
    let config_path = config_path.to_str().unwrap();

    let result = xfx::run_command(
        xfx::AppCommand::Convert(ConvertArgs {
            amount: "8312".to_string(),
            to: Some("INR".to_string()),
            reverse: true,
            save: Some(None),
            ..Default::default()
        }),
        Some(config_path),
    )
    .await;
    assert!(result.is_ok(), "Convert failed with: {:?}", result.err());

    let config = AppConfig::load_from_path(config_path).unwrap();
    let converter = xfx::open_converter(&config).await.unwrap();
    let entry = &converter.history().entries()[0];
    assert_eq!(entry.from_amount, "100");
    assert_eq!(entry.to_amount, "8312");
    assert_eq!(entry.to_currency, "INR");
}

#[test_log::test(tokio::test)]
async fn test_convert_rejects_invalid_amount() {
    let mock_server = test_utils::create_rates_server("USD", test_utils::RATES_USD).await;
    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(temp_dir.path(), &mock_server.uri(), None);

    let result = xfx::run_command(
        xfx::AppCommand::Convert(ConvertArgs {
            amount: "1.2.3".to_string(),
            ..Default::default()
        }),
        config_path.to_str(),
    )
    .await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_convert_fails_when_rates_unavailable() {
    let body = r#"{"result": "error", "error-type": "invalid-key"}"#;
    let mock_server = test_utils::create_rates_server("USD", body).await;
    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(temp_dir.path(), &mock_server.uri(), None);

    let result = xfx::run_command(
        xfx::AppCommand::Convert(ConvertArgs {
            amount: "10".to_string(),
            ..Default::default()
        }),
        config_path.to_str(),
    )
    .await;

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("invalid-key"));
}

#[test_log::test(tokio::test)]
async fn test_currencies_and_local_favorites() {
    let mock_server = test_utils::create_rates_server("USD", test_utils::RATES_USD).await;
    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(temp_dir.path(), &mock_server.uri(), None);
    let config_path = config_path.to_str().unwrap();

    let result = xfx::run_command(
        xfx::AppCommand::Currencies {
            search: Some("rupee".to_string()),
        },
        Some(config_path),
    )
    .await;
    assert!(result.is_ok(), "Currencies failed with: {:?}", result.err());

    let toggle = || {
        xfx::AppCommand::Favorites(FavoritesAction::Toggle {
            from: "gbp".to_string(),
            to: "jpy".to_string(),
        })
    };
    xfx::run_command(toggle(), Some(config_path)).await.unwrap();

    let config = AppConfig::load_from_path(config_path).unwrap();
    {
        let converter = xfx::open_converter(&config).await.unwrap();
        let pairs = converter.favorites().pairs();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].is_pair("GBP", "JPY"));
    }

    // Toggling again removes it.
    xfx::run_command(toggle(), Some(config_path)).await.unwrap();
    let converter = xfx::open_converter(&config).await.unwrap();
    assert!(converter.favorites().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_remote_favorites_reload_after_add() {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let rates_server = test_utils::create_rates_server("USD", test_utils::RATES_USD).await;
    let backend = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/history"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": []}"#))
        .mount(&backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/favorites"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": []}"#))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/favorites"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"data": [{"id": 12, "from_currency": "USD", "to_currency": "EUR"}]}"#,
        ))
        .expect(1)
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/favorites"))
        .and(header("authorization", "Bearer anon"))
        .and(body_json(serde_json::json!({
            "from_currency": "USD",
            "to_currency": "EUR"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"data": [{"id": 12, "from_currency": "USD", "to_currency": "EUR"}]}"#,
        ))
        .expect(1)
        .mount(&backend)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config_path =
        test_utils::write_config(temp_dir.path(), &rates_server.uri(), Some(&backend.uri()));

    let result = xfx::run_command(
        xfx::AppCommand::Favorites(FavoritesAction::Toggle {
            from: "USD".to_string(),
            to: "EUR".to_string(),
        }),
        config_path.to_str(),
    )
    .await;
    assert!(result.is_ok(), "Toggle failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_remote_storage_requires_backend() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(
        &config_path,
        format!(
            "storage: remote\ndata_path: \"{}\"\n",
            temp_dir.path().join("data").display()
        ),
    )
    .unwrap();

    let result = xfx::run_command(
        xfx::AppCommand::History(HistoryAction::List),
        config_path.to_str(),
    )
    .await;
    assert!(result.unwrap_err().to_string().contains("providers.backend"));
}
