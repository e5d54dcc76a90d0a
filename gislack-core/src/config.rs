//! The persisted `gislack.cfg` file: client credentials and access tokens for both services.
//! The field layout matches files written by earlier gislack releases.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::options::Credentials;

pub const CONFIG_FILE_NAME: &str = "gislack.cfg";
pub const CONFIG_DIR_ENV: &str = "GISLACK_CFG_PATH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GistAccessToken {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackAccessToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A token obtained by the authorization flow.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessToken {
    Gist(GistAccessToken),
    Slack(SlackAccessToken),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GistSection {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    #[serde(rename = "GistAccesstoken", default)]
    pub token: GistAccessToken,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackSection {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    #[serde(rename = "SlackAccesstoken", default)]
    pub token: SlackAccessToken,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GislackConfig {
    #[serde(default)]
    pub gist: GistSection,
    #[serde(default)]
    pub slack: SlackSection,
}

impl GislackConfig {
    /// `Ok(None)` when the file does not exist; a malformed file is always an error.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match std::fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(config_path = %path.display(), "No config file present");
                return Ok(None);
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config: GislackConfig =
            serde_json::from_slice(&content).map_err(|source| ConfigError::Format {
                path: path.to_path_buf(),
                source,
            })?;
        config.trace_loaded();
        Ok(Some(config))
    }

    /// Writes the file tab-indented, replacing any previous content.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)
            .map_err(|source| ConfigError::Format {
                path: path.to_path_buf(),
                source,
            })?;
        std::fs::write(path, out).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(config_path = %path.display(), "Saved config file");
        Ok(())
    }

    pub fn gist_token(&self) -> Option<&str> {
        Some(self.gist.token.access_token.as_str()).filter(|t| !t.is_empty())
    }

    pub fn slack_token(&self) -> Option<&str> {
        Some(self.slack.token.access_token.as_str()).filter(|t| !t.is_empty())
    }

    /// Tokens for the submission pipeline; missing tokens become empty strings.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            gist_token: self.gist_token().unwrap_or_default().to_string(),
            slack_token: self.slack_token().unwrap_or_default().to_string(),
        }
    }

    /// Stores a freshly obtained token in its section.
    pub fn apply_token(&mut self, token: AccessToken) {
        match token {
            AccessToken::Gist(t) => self.gist.token = t,
            AccessToken::Slack(t) => self.slack.token = t,
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            gist_token = self.gist_token().is_some(),
            slack_token = self.slack_token().is_some(),
            "Loaded config"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_files_written_by_earlier_releases() {
        let raw = r#"{
	"gist": {
		"client_id": "gid",
		"client_secret": "gsecret",
		"GistAccesstoken": {"access_token": "gtoken", "token_type": "bearer", "scope": "gist,repo"}
	},
	"slack": {
		"SlackAccesstoken": {"access_token": "xoxp-1", "team_name": "team"}
	}
}"#;
        let config: GislackConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.gist_token(), Some("gtoken"));
        assert_eq!(config.slack_token(), Some("xoxp-1"));
        assert_eq!(config.gist.client_id, "gid");
        assert_eq!(config.slack.token.team_name, "team");
    }

    #[test]
    fn save_then_load_keeps_tokens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut config = GislackConfig::default();
        config.apply_token(AccessToken::Slack(SlackAccessToken {
            access_token: "xoxp-2".into(),
            ..Default::default()
        }));
        config.save(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n\t\"slack\""));

        let loaded = GislackConfig::load(&path).unwrap().expect("file exists");
        assert_eq!(loaded, config);
        assert_eq!(loaded.credentials().gist_token, "");
    }

    #[test]
    fn missing_file_is_none_and_garbage_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(GislackConfig::load(&path).unwrap().is_none());
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            GislackConfig::load(&path),
            Err(ConfigError::Format { .. })
        ));
    }
}
