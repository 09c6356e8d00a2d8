//! Launcher configuration
//!
//! Versions, URLs and retry budgets, plus the per-run [`C8RunConfig`] built
//! once in `main` from the working directory and environment overrides.

use crate::core::models::{HealthCheckPolicy, Service};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ELASTICSEARCH_VERSION: &str = "8.13.4";
pub const DEFAULT_CAMUNDA_VERSION: &str = "8.7.0-alpha1";
pub const MIN_JAVA_VERSION: u32 = 21;

pub const CAMUNDA_VERSION_ENV: &str = "CAMUNDA_VERSION";
pub const JAVA_HOME_ENV: &str = "JAVA_HOME";
pub const JAVA_VERSION_ENV: &str = "JAVA_VERSION";
pub const JAVA_OPTS_ENV: &str = "JAVA_OPTS";

pub const ELASTICSEARCH_URL: &str = "http://localhost:9200";
pub const ELASTICSEARCH_HEALTH_URL: &str = "http://localhost:9200/_cluster/health?wait_for_status=green&wait_for_active_shards=all&wait_for_no_initializing_shards=true&timeout=120s";
pub const CAMUNDA_HEALTH_URL: &str = "http://localhost:8080/operate/login";
pub const OPERATE_URL: &str = "http://localhost:8080/operate";

pub const ELASTICSEARCH_RETRIES: u32 = 12;
pub const ELASTICSEARCH_RETRY_INTERVAL: Duration = Duration::from_secs(10);
pub const CAMUNDA_RETRIES: u32 = 24;
pub const CAMUNDA_RETRY_INTERVAL: Duration = Duration::from_secs(14);

pub const ES_JAVA_OPTS: &str = "-Xms1g -Xmx1g";
pub const ENDPOINTS_FILE: &str = "endpoints.txt";
pub const DEFAULT_CONFIG_DIR: &str = "configuration";
pub const CONNECTORS_PROPERTIES: &str = "connectors-application.properties";

/// Everything a run needs, resolved once at process entry and passed down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C8RunConfig {
    pub base_dir: PathBuf,
    pub camunda_version: String,
    pub elasticsearch_version: String,
    pub min_java_version: u32,
    pub java_home: Option<PathBuf>,
    /// Pre-set version string that skips the `java --version` probe
    pub java_version: Option<String>,
    pub java_opts: Option<String>,
    pub search_policy: HealthCheckPolicy,
    pub server_policy: HealthCheckPolicy,
}

impl C8RunConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            camunda_version: DEFAULT_CAMUNDA_VERSION.to_string(),
            elasticsearch_version: ELASTICSEARCH_VERSION.to_string(),
            min_java_version: MIN_JAVA_VERSION,
            java_home: None,
            java_version: None,
            java_opts: None,
            search_policy: HealthCheckPolicy::new(
                Service::Elasticsearch.display_name(),
                ELASTICSEARCH_RETRIES,
                ELASTICSEARCH_RETRY_INTERVAL,
                ELASTICSEARCH_HEALTH_URL,
            ),
            server_policy: HealthCheckPolicy::new(
                Service::Camunda.display_name(),
                CAMUNDA_RETRIES,
                CAMUNDA_RETRY_INTERVAL,
                CAMUNDA_HEALTH_URL,
            ),
        }
    }

    /// Read overrides from the orchestrator's environment. Empty values count
    /// as unset.
    pub fn from_env(base_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::new(base_dir);
        if let Some(version) = non_empty_env(CAMUNDA_VERSION_ENV) {
            config.camunda_version = version;
        }
        config.java_home = non_empty_env(JAVA_HOME_ENV).map(PathBuf::from);
        config.java_version = non_empty_env(JAVA_VERSION_ENV);
        config.java_opts = non_empty_env(JAVA_OPTS_ENV);
        config
    }

    pub fn elasticsearch_dir(&self) -> PathBuf {
        self.base_dir
            .join(format!("elasticsearch-{}", self.elasticsearch_version))
    }

    pub fn camunda_dir(&self) -> PathBuf {
        self.base_dir
            .join(format!("camunda-zeebe-{}", self.camunda_version))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.base_dir.join("log")
    }

    pub fn endpoints_file(&self) -> PathBuf {
        self.base_dir.join(ENDPOINTS_FILE)
    }

    /// `--spring.config.location=...` for the Camunda server
    pub fn spring_config_arg(&self, user_config: Option<&Path>) -> String {
        let location = match user_config {
            Some(path) => self.base_dir.join(path),
            None => self.base_dir.join(DEFAULT_CONFIG_DIR),
        };
        format!("--spring.config.location={}", location.display())
    }

    /// Extra environment for a child process. Applied to the child's
    /// `Command`, never to this process.
    pub fn child_env(
        &self,
        service: Service,
        java_home: &Path,
        java_version: &str,
    ) -> Vec<(String, String)> {
        match service {
            Service::Elasticsearch => vec![
                ("ES_JAVA_OPTS".to_string(), ES_JAVA_OPTS.to_string()),
                ("ES_JAVA_HOME".to_string(), java_home.display().to_string()),
            ],
            Service::Connectors | Service::Camunda => vec![
                (
                    "ZEEBE_BROKER_EXPORTERS_ELASTICSEARCH_CLASSNAME".to_string(),
                    "io.camunda.zeebe.exporter.ElasticsearchExporter".to_string(),
                ),
                (
                    "ZEEBE_BROKER_EXPORTERS_ELASTICSEARCH_ARGS_URL".to_string(),
                    ELASTICSEARCH_URL.to_string(),
                ),
                (
                    "ZEEBE_BROKER_EXPORTERS_ELASTICSEARCH_ARGS_INDEX_PREFIX".to_string(),
                    "zeebe-record".to_string(),
                ),
                ("CAMUNDA_REST_QUERY_ENABLED".to_string(), "true".to_string()),
                (
                    "CAMUNDA_OPERATE_CSRFPREVENTIONENABLED".to_string(),
                    "false".to_string(),
                ),
                (
                    "CAMUNDA_TASKLIST_CSRFPREVENTIONENABLED".to_string(),
                    "false".to_string(),
                ),
                ("JAVA_VERSION".to_string(), java_version.to_string()),
            ],
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_policies() {
        let config = C8RunConfig::new("/opt/c8run");
        assert_eq!(config.search_policy.retry_budget, 12);
        assert_eq!(config.search_policy.interval, Duration::from_secs(10));
        assert!(config.search_policy.url.contains("wait_for_status=green"));
        assert_eq!(config.server_policy.retry_budget, 24);
        assert_eq!(config.server_policy.interval, Duration::from_secs(14));
        assert_eq!(config.server_policy.url, CAMUNDA_HEALTH_URL);
    }

    #[test]
    fn test_spring_config_location() {
        let config = C8RunConfig::new("/opt/c8run");
        assert_eq!(
            config.spring_config_arg(None),
            format!(
                "--spring.config.location={}",
                Path::new("/opt/c8run").join("configuration").display()
            )
        );
        assert_eq!(
            config.spring_config_arg(Some(Path::new("custom.yaml"))),
            format!(
                "--spring.config.location={}",
                Path::new("/opt/c8run").join("custom.yaml").display()
            )
        );
    }

    #[test]
    fn test_child_env_is_per_service() {
        let config = C8RunConfig::new("/opt/c8run");
        let es = config.child_env(Service::Elasticsearch, Path::new("/jdk"), "21.0.2");
        assert!(es.contains(&("ES_JAVA_OPTS".to_string(), "-Xms1g -Xmx1g".to_string())));
        assert!(!es.iter().any(|(k, _)| k.starts_with("ZEEBE_")));

        let camunda = config.child_env(Service::Camunda, Path::new("/jdk"), "21.0.2");
        assert!(camunda.contains(&(
            "ZEEBE_BROKER_EXPORTERS_ELASTICSEARCH_ARGS_URL".to_string(),
            "http://localhost:9200".to_string()
        )));
        assert!(camunda.contains(&("JAVA_VERSION".to_string(), "21.0.2".to_string())));
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        std::env::set_var(CAMUNDA_VERSION_ENV, "8.6.3");
        std::env::set_var(JAVA_VERSION_ENV, "  ");
        let config = C8RunConfig::from_env("/opt/c8run");
        std::env::remove_var(CAMUNDA_VERSION_ENV);
        std::env::remove_var(JAVA_VERSION_ENV);

        assert_eq!(config.camunda_version, "8.6.3");
        assert_eq!(config.java_version, None);
        assert_eq!(
            config.camunda_dir(),
            PathBuf::from("/opt/c8run/camunda-zeebe-8.6.3")
        );
    }
}
