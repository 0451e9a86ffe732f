use std::collections::BTreeMap;

use async_trait::async_trait;

use super::repository::{PayrollRepository, RepositoryError};

/// Where the payroll data lives.
///
/// `backend` selects a registered [`RepositoryFactory`] by name and
/// `connection_string` is handed to it untouched. For `sqlite` that is a file
/// path such as `payroll.db`, or `:memory:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl DbConfig {
    pub fn new(
        backend: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self {
            backend: backend.into(),
            connection_string: connection_string.into(),
        }
    }
}

/// A throwaway in-memory SQLite database.
impl Default for DbConfig {
    fn default() -> Self {
        Self::new("sqlite", ":memory:")
    }
}

/// Opens payroll repositories for one database backend.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Lowercase identifier matched against [`DbConfig::backend`].
    fn backend_name(&self) -> &'static str;

    /// Opens a connection and returns a repository with its schema and seed
    /// data in place.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn PayrollRepository>, RepositoryError>;
}

/// The backends a binary ships with.
#[derive(Default)]
pub struct RepositoryRegistry {
    backends: BTreeMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a backend. A later factory with the same name wins.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.backends.insert(factory.backend_name(), factory);
    }

    /// Backend names in alphabetical order.
    pub fn available_backends(&self) -> Vec<&'static str> {
        self.backends.keys().copied().collect()
    }

    /// Opens a repository through the backend named in `config`.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Configuration`] for an unregistered backend,
    /// otherwise whatever the factory reports.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn PayrollRepository>, RepositoryError> {
        let Some(factory) = self.backends.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "no '{}' database backend; this build supports {}",
                config.backend,
                self.available_backends().join(", ")
            )));
        };
        factory.create(config).await
    }
}
