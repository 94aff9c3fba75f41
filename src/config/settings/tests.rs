use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.model, "all-minilm");
    assert_eq!(config.ollama.embedding_dimension, 384);
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.search.default_top_k, 5);
    assert_eq!(config.search.default_threshold, 0.5);
    assert_eq!(config.search.seed_documents.len(), 3);
    assert!(config.search.seed_documents[0].starts_with("Jio AI-Cloud Welcome Offer"));
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.batch_size = 1001;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.timeout_secs = 0;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidTimeout(0))
    ));

    let mut invalid_config = config.clone();
    invalid_config.server.host = "  ".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidServerHost(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.search.default_top_k = 0;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidTopK(0))
    ));

    let mut invalid_config = config.clone();
    invalid_config.search.default_threshold = f32::NAN;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidThreshold(_))
    ));

    let mut invalid_config = config;
    invalid_config.search.seed_documents.push(String::new());
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::EmptySeedDocument(3))
    ));
}

#[test]
fn ollama_url_generation() {
    let config = Config::default();
    let url = config
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn https_url_generation() {
    let mut config = Config::default();
    config.ollama.protocol = "https".to_string();
    config.ollama.host = "secure.example.com".to_string();
    config.ollama.port = 443;

    let url = config
        .ollama_url()
        .expect("should generate https url successfully");
    assert_eq!(url.as_str(), "https://secure.example.com/");
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn partial_toml_uses_defaults() {
    let partial = r#"
        [ollama]
        host = "gpu-box"

        [search]
        default_threshold = 0.8
    "#;

    let config: Config = toml::from_str(partial).expect("should parse partial toml");
    assert_eq!(config.ollama.host, "gpu-box");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.search.default_threshold, 0.8);
    assert_eq!(config.search.default_top_k, 5);
    assert_eq!(config.server, ServerConfig::default());
}

#[test]
fn ollama_setter_validation() {
    let mut config = OllamaConfig::default();

    assert!(config.set_protocol("https".to_string()).is_ok());
    assert!(config.set_host("example.com".to_string()).is_ok());
    assert!(config.set_port(8080).is_ok());
    assert!(config.set_model("new-model".to_string()).is_ok());
    assert!(config.set_batch_size(128).is_ok());
    assert!(config.set_embedding_dimension(768).is_ok());

    assert!(config.set_protocol("ftp".to_string()).is_err());
    assert!(config.set_protocol("HTTP".to_string()).is_err());
    assert!(config.set_port(0).is_err());
    assert!(config.set_model(String::new()).is_err());
    assert!(config.set_batch_size(0).is_err());
    assert!(config.set_embedding_dimension(32).is_err());

    assert_eq!(config.protocol, "https");
    assert_eq!(config.host, "example.com");
    assert_eq!(config.batch_size, 128);
}

#[test]
fn server_and_search_setters() {
    let mut server = ServerConfig::default();
    assert!(server.set_host("0.0.0.0".to_string()).is_ok());
    assert!(server.set_port(9090).is_ok());
    assert!(server.set_port(0).is_err());
    assert!(server.set_host(String::new()).is_err());
    assert_eq!(server.bind_address(), "0.0.0.0:9090");

    let mut search = SearchConfig::default();
    assert!(search.set_default_top_k(10).is_ok());
    assert!(search.set_default_top_k(0).is_err());
    assert!(search.set_default_threshold(0.0).is_ok());
    assert!(search.set_default_threshold(-0.1).is_err());
    assert_eq!(search.default_top_k, 10);
    assert_eq!(search.default_threshold, 0.0);
}

#[test]
fn load_missing_config_returns_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("should load defaults");

    assert_eq!(config.get_base_dir(), temp_dir.path());
    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.database_path(), temp_dir.path().join("usage.db"));
}

#[test]
fn save_then_load() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config {
        base_dir: temp_dir.path().join("home"),
        ..Config::default()
    };
    config.server.port = 9999;
    config.search.seed_documents = vec!["only document".to_string()];

    config.save().expect("should save config");
    assert!(config.config_file_path().exists());

    let loaded = Config::load(temp_dir.path().join("home")).expect("should load config");
    assert_eq!(loaded, config);
}

#[test]
fn load_rejects_invalid_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[ollama]\nprotocol = \"gopher\"\n",
    )
    .expect("should write config");

    assert!(Config::load(temp_dir.path()).is_err());
}
