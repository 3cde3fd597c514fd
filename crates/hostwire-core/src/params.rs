use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Running,
    Stopped,
    Error,
    PendingCreate,
    Creating,
    PendingDelete,
    PendingForceDelete,
    Deleting,
    Deleted,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsType {
    Linux,
    Windows,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsArch {
    #[serde(rename = "amd64")]
    Amd64,
    #[serde(rename = "386")]
    I386,
    #[serde(rename = "arm")]
    Arm,
    #[serde(rename = "arm64")]
    Arm64,
    #[default]
    #[serde(rename = "unknown", other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    Public,
    #[default]
    Private,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address: String,
    #[serde(rename = "type", default)]
    pub address_type: AddressType,
}

/// Artifact the instance downloads while bootstrapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDownload {
    pub os: String,
    pub architecture: String,
    pub download_url: String,
    pub filename: String,
    pub sha256_checksum: String,
    pub temp_download_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDataOptions {
    pub disable_updates_on_boot: bool,
    pub extra_packages: Vec<String>,
    pub enable_boot_debug: bool,
}

/// Everything a provider needs to create one instance. Delivered on stdin
/// for the create command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapInstance {
    pub name: String,
    pub tools: Vec<ToolDownload>,
    pub repo_url: String,
    pub callback_url: String,
    pub metadata_url: String,
    pub instance_token: String,
    pub ssh_keys: Vec<String>,
    /// Pool-level provider specific settings, passed through untouched.
    pub extra_specs: serde_json::Value,
    pub runner_group: String,
    #[serde(with = "base64_bytes")]
    pub ca_cert_bundle: Vec<u8>,
    pub os_arch: OsArch,
    pub os_type: OsType,
    pub flavor: String,
    pub image: String,
    pub labels: Vec<String>,
    pub pool_id: String,
    pub user_data_options: UserDataOptions,
    pub jit_config_enabled: bool,
}

/// Instance record as reported by a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderInstance {
    pub provider_id: String,
    pub name: String,
    pub os_type: OsType,
    pub os_name: String,
    pub os_version: String,
    pub os_arch: OsArch,
    pub addresses: Vec<Address>,
    pub status: InstanceStatus,
    #[serde(with = "base64_bytes")]
    pub provider_fault: Vec<u8>,
}

/// Byte fields travel as standard base64 strings; `null` decodes to empty.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        match encoded {
            Some(text) => STANDARD
                .decode(text.as_bytes())
                .map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}
