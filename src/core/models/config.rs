//! 凭据来源配置

use std::fmt;
use url::Url;

use super::Credential;

/// A secret held by the secret store, always read at its latest version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    pub project_id: String,
    pub secret_name: String,
}

impl SecretRef {
    pub fn new(project_id: impl Into<String>, secret_name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            secret_name: secret_name.into(),
        }
    }

    /// Resource name of the latest version, e.g. `projects/p/secrets/s/versions/latest`.
    pub fn latest_version(&self) -> String {
        format!(
            "projects/{}/secrets/{}/versions/latest",
            self.project_id, self.secret_name
        )
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projects/{}/secrets/{}", self.project_id, self.secret_name)
    }
}

/// Endpoints used by the remote credential source.
#[derive(Debug, Clone)]
pub struct SecretStoreConfig {
    pub secret: SecretRef,
    /// Secret Manager API root
    pub api_url: Url,
    /// Instance metadata server root, used to mint the access token for `api_url`
    pub metadata_url: Url,
}

/// Where the API key comes from. Exactly one per deployment.
#[derive(Debug, Clone)]
pub enum CredentialSourceConfig {
    Static(Credential),
    SecretStore(SecretStoreConfig),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_version_resource_name() {
        let secret = SecretRef::new("mlab-sandbox", "speed-api-key");
        assert_eq!(
            secret.latest_version(),
            "projects/mlab-sandbox/secrets/speed-api-key/versions/latest"
        );
    }
}
