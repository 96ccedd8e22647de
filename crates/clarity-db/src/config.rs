/// Connection settings for the clarity database.
///
/// The URL is the only knob here; pool sizing and timeouts live in
/// [`crate::pool`]. Resolution of where the URL comes from (CLI flag, env
/// var, config file) is the server's job.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL, database path included.
    pub database_url: String,
}

impl DbConfig {
    /// URL used when nothing else is configured.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/clarity";

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Split the URL at its final path segment: the server part before the
    /// last `/`, the database name after it. `None` when the URL carries no
    /// database path (the last segment of a path-less URL is the host, which
    /// the `:` or `@` check rejects).
    fn split_url(&self) -> Option<(&str, &str)> {
        let (server, name) = self.database_url.rsplit_once('/')?;
        if name.is_empty() || name.contains(':') || name.contains('@') {
            return None;
        }
        Some((server, name))
    }

    /// The database name addressed by the URL, if any.
    pub fn database_name(&self) -> Option<&str> {
        self.split_url().map(|(_, name)| name)
    }

    /// The same server, pointed at the `postgres` maintenance database.
    ///
    /// `CREATE DATABASE` must be issued from a connection that is not the
    /// target database itself.
    pub fn maintenance_url(&self) -> String {
        match self.split_url() {
            Some((server, _)) => format!("{server}/postgres"),
            None => self.database_url.clone(),
        }
    }
}
