use crate::Result;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const POSTGRES_PORT: u16 = 5432;
const READY_LINE: &str = "database system is ready to accept connections";

/// Credentials and image used for a throwaway PostgreSQL instance.
#[derive(Debug, Clone, TypedBuilder)]
pub struct PostgresConfig {
    #[builder(default = "16-alpine".to_string(), setter(into))]
    tag: String,
    #[builder(default = "burrow".to_string(), setter(into))]
    database: String,
    #[builder(default = "burrow".to_string(), setter(into))]
    username: String,
    #[builder(default = "burrow".to_string(), setter(into))]
    password: String,
}

impl PostgresConfig {
    fn connection_url(&self, host: &str, port: u16) -> String {
        format!(
            "postgres://{}:{}@{host}:{port}/{}",
            self.username, self.password, self.database
        )
    }
}

/// A PostgreSQL container that lives as long as this value.
///
/// The connection URL is resolved once at startup.
pub struct PostgresServer {
    _container: ContainerAsync<GenericImage>,
    url: String,
}

impl PostgresServer {
    pub async fn start(config: PostgresConfig) -> Result<Self> {
        let container = GenericImage::new("postgres", &config.tag)
            .with_exposed_port(POSTGRES_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr(READY_LINE))
            .with_env_var("POSTGRES_DB", config.database.as_str())
            .with_env_var("POSTGRES_USER", config.username.as_str())
            .with_env_var("POSTGRES_PASSWORD", config.password.as_str())
            .start()
            .await?;

        let host = container.get_host().await?.to_string();
        let port = container.get_host_port_ipv4(POSTGRES_PORT).await?;
        let url = config.connection_url(&host, port);

        Ok(Self {
            _container: container,
            url,
        })
    }

    /// URL accepted by `sqlx` connection options.
    pub fn database_url(&self) -> &str {
        &self.url
    }
}
