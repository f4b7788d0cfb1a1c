//! Installation configuration

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{InstallError, InstallResult};
use crate::poll::PollPolicy;

/// Language installed when the caller asks for a multilingual site without
/// naming any languages.
pub const DEFAULT_EXTRA_LANGUAGE: &str = "French";

/// Everything the setup wizard asks for. Supplied by the caller and never
/// mutated during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Site name shown in the wizard's first step
    pub site_name: String,

    /// Super user account created by the installer
    pub admin: AdminIdentity,

    /// Database connection settings
    pub database: DatabaseSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub name: String,
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub dialect: DbDialect,

    /// Hostname, IPv4 or IPv6 literal (bracketed or not)
    pub host: String,

    /// Port as written by the user; blank counts as absent
    #[serde(default, deserialize_with = "string_or_number")]
    pub port: Option<String>,

    pub user: String,

    #[serde(default)]
    pub password: Option<String>,

    pub name: String,

    pub prefix: String,
}

impl DatabaseSettings {
    /// The port, if one was given and is not blank.
    pub fn effective_port(&self) -> Option<&str> {
        self.port
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Database backends offered by the installer.
///
/// Parsing accepts both the option value and the option label shown in the
/// wizard's dropdown; nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DbDialect {
    MySqli,
    MySqlPdo,
    PostgresPdo,
}

impl DbDialect {
    /// Value of the `<option>` for this backend in the database type select.
    pub fn option_value(&self) -> &'static str {
        match self {
            DbDialect::MySqli => "mysqli",
            DbDialect::MySqlPdo => "mysql",
            DbDialect::PostgresPdo => "pgsql",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DbDialect::MySqli => "MySQLi",
            DbDialect::MySqlPdo => "MySQL (PDO)",
            DbDialect::PostgresPdo => "PostgreSQL (PDO)",
        }
    }

    /// PostgreSQL's driver accepts a bare IPv6 host when no port follows it.
    pub fn accepts_bare_ipv6(&self) -> bool {
        matches!(self, DbDialect::PostgresPdo)
    }
}

impl FromStr for DbDialect {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mysqli" | "MySQLi" => Ok(DbDialect::MySqli),
            "mysql" | "MySQL" | "MySQL (PDO)" => Ok(DbDialect::MySqlPdo),
            "pgsql" | "PostgreSQL (PDO)" => Ok(DbDialect::PostgresPdo),
            other => Err(InstallError::InvalidConfig(format!(
                "unsupported database type '{}' (expected mysqli, mysql or pgsql)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for DbDialect {
    type Error = InstallError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DbDialect> for String {
    fn from(value: DbDialect) -> Self {
        value.option_value().to_string()
    }
}

impl fmt::Display for DbDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Port>::deserialize(deserializer)?.map(|p| match p {
        Port::Text(s) => s,
        Port::Number(n) => n.to_string(),
    }))
}

impl InstallConfig {
    /// Parse from TOML text
    pub fn from_toml(text: &str) -> InstallResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| InstallError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from YAML text
    pub fn from_yaml(text: &str) -> InstallResult<Self> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| InstallError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml`, `.yaml` or `.yml` file
    pub fn load(path: &Path) -> InstallResult<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Err(InstallError::InvalidConfig(format!(
                "unrecognised config format: {}",
                path.display()
            ))),
        }
    }

    /// Check the invariants a run relies on.
    pub fn validate(&self) -> InstallResult<()> {
        let required = [
            ("site_name", &self.site_name),
            ("admin.name", &self.admin.name),
            ("admin.username", &self.admin.username),
            ("admin.password", &self.admin.password),
            ("admin.email", &self.admin.email),
            ("database.user", &self.database.user),
            ("database.name", &self.database.name),
            ("database.prefix", &self.database.prefix),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(InstallError::InvalidConfig(format!("{} must not be empty", field)));
            }
        }

        if self.database.host.trim().is_empty() {
            return Err(InstallError::InvalidConfig("database.host must not be empty".into()));
        }

        if let Some(port) = self.database.effective_port() {
            if !port.chars().all(|c| c.is_ascii_digit()) {
                return Err(InstallError::InvalidConfig(format!(
                    "database.port must be numeric, got '{}'",
                    port
                )));
            }
        }

        Ok(())
    }

    /// Connection string typed into the database host field.
    pub fn connection_string(&self) -> String {
        crate::connection::build(
            &self.database.host,
            self.database.effective_port(),
            self.database.dialect,
        )
    }
}

/// Languages to add on top of the base install. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSelection(Vec<String>);

impl LanguageSelection {
    /// Build from caller input, falling back to [`DEFAULT_EXTRA_LANGUAGE`]
    /// when nothing usable was given.
    pub fn new<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels: Vec<String> = Vec::new();
        for language in languages {
            let language = language.into().trim().to_string();
            if !language.is_empty() && !labels.contains(&language) {
                labels.push(language);
            }
        }
        if labels.is_empty() {
            labels.push(DEFAULT_EXTRA_LANGUAGE.to_string());
        }
        Self(labels)
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }
}

impl Default for LanguageSelection {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

/// Tuning knobs for the orchestrator. Defaults match the installer's
/// observed timings.
#[derive(Debug, Clone)]
pub struct InstallerSettings {
    /// Path of the setup wizard, relative to the site base URL
    pub installer_path: String,

    /// Absolute URL probed after teardown; must answer 404 once removed
    pub probe_url: String,

    /// Deadline for the backend calls triggered by the setup button
    pub sync_timeout: Duration,

    /// Deadline for the second congratulation page after installing languages
    pub language_install_timeout: Duration,

    /// Implicit wait applied to assertions and element queries
    pub assertion_timeout: Duration,

    /// Deadline for single backend requests awaited outside the setup step
    pub request_timeout: Duration,

    /// Retry budget for confirming the installer is gone
    pub poll: PollPolicy,
}

impl InstallerSettings {
    /// Settings for a site served at `base_url`.
    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            probe_url: format!("{}/installation", base_url.trim_end_matches('/')),
            ..Self::default()
        }
    }
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            installer_path: "installation/index.php".to_string(),
            probe_url: "http://localhost/installation".to_string(),
            sync_timeout: Duration::from_secs(120),
            language_install_timeout: Duration::from_secs(30),
            assertion_timeout: Duration::from_secs(4),
            request_timeout: Duration::from_secs(30),
            poll: PollPolicy::default(),
        }
    }
}
