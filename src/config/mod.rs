use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_CATALOG_URL: &str = "http://localhost:8080/db.json";
pub const DEFAULT_OUTPUT: &str = "mirrordesk.html";

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(alias = "api")]
    pub api_url: Option<String>,
    #[serde(alias = "catalog")]
    pub catalog_url: Option<String>,
    pub update_mode: Option<String>,
    pub check_status: Option<bool>,
    pub page_size: Option<usize>,
    pub timeout: Option<u64>,
    pub output: Option<String>,
    pub no_color: Option<bool>,
    pub assume_yes: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".mirrordesk").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

pub fn parse_config(contents: &str) -> Result<ConfigFile, serde_yaml::Error> {
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str::<ConfigFile>(contents)
}

fn default_config_yaml() -> String {
    format!(
        r#"# mirrordesk config
#
# Location (default):
#   ~/.mirrordesk/config.yml

# Collection API (json-server style: /posts, /comments)
api_url: {DEFAULT_API_URL}

# Static product snapshot. Must be served over http(s); a local file path
# will be rejected.
catalog_url: {DEFAULT_CATALOG_URL}

# How updates are sent:
#   patch   - PATCH with only the changed fields
#   replace - GET the record, overlay the changes, PUT the full object
update_mode: patch

# Treat non-2xx responses to create/update/delete as failures.
check_status: true

# Catalog page size
page_size: 10

# Request timeout in seconds (leave unset for no timeout)
# timeout: 30

# HTML snapshot written after each command
output: {DEFAULT_OUTPUT}

# Terminal
no_color: false
# Answer yes to every confirmation prompt
assume_yes: false
"#
    )
}

pub fn ensure_default_config_file(path: &PathBuf) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}
