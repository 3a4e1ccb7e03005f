//! Infrastructure config generation and provisioning-result handling.
//!
//! `generate_config` is pure: given the same inputs and suffix it always
//! produces the same payload. Randomness lives in `generate_suffix`, which
//! callers drive with their own RNG.

use std::fmt;
use std::net::Ipv4Addr;

use rand::Rng;
use serde::Serialize;

use crate::domain::analysis::RepoAnalysis;
use crate::domain::error::ProvisioningError;
use crate::domain::framework::Framework;

/// SSH port, always opened in addition to the application ports.
pub const SSH_PORT: u16 = 22;

/// Length of the random resource-name suffix.
pub const SUFFIX_LEN: usize = 6;

const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Security group reused across runs when it already exists.
pub const SHARED_SECURITY_GROUP: &str = "autoship_sg";

/// Output names the payload declares and the driver reads back.
pub const OUTPUT_PUBLIC_IP: &str = "public_ip";
pub const OUTPUT_PRIVATE_KEY: &str = "private_key_pem";

// ── Provider ──────────────────────────────────────────────────────────────────

/// Target cloud provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    /// Any provider without an implementation; carries the requested name.
    Unsupported(String),
}

impl Provider {
    /// Map a provider name to a provider. Never fails: unknown names become
    /// `Unsupported` so the driver can refuse them explicitly.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "aws" | "amazon" | "ec2" => Self::Aws,
            other => Self::Unsupported(other.to_string()),
        }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aws => f.write_str("aws"),
            Self::Unsupported(name) => f.write_str(name),
        }
    }
}

// ── Config generation ─────────────────────────────────────────────────────────

/// Account-level settings that are not derived from the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerraformSettings {
    pub region: String,
    pub ami: String,
}

/// Generated provisioning payload plus the facts it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningConfig {
    pub provider: Provider,
    pub region: String,
    pub instance_size: String,
    /// Application ports followed by the SSH port; no duplicates.
    pub ingress_ports: Vec<u16>,
    pub framework: Framework,
    pub suffix: String,
    /// Terraform HCL, or a placeholder comment for unsupported providers.
    pub payload: String,
}

/// Draw a resource-name suffix: 6 characters uniform over `[a-z0-9]`.
pub fn generate_suffix(rng: &mut impl Rng) -> String {
    (0..SUFFIX_LEN)
        .map(|_| char::from(SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())]))
        .collect()
}

/// Ingress port set: distinct application ports in order, then SSH once.
#[must_use]
pub fn ingress_ports(app_ports: &[u16]) -> Vec<u16> {
    let mut ports: Vec<u16> = Vec::with_capacity(app_ports.len() + 1);
    for &port in app_ports {
        if port != SSH_PORT && !ports.contains(&port) {
            ports.push(port);
        }
    }
    ports.push(SSH_PORT);
    ports
}

/// Instance bootstrap (`user_data`) for a framework's toolchain.
#[must_use]
pub fn user_data_script(framework: Framework) -> &'static str {
    if framework.is_node() {
        "#!/bin/bash\nset -e\napt-get update -y\napt-get install -y nodejs npm git\n"
    } else {
        "#!/bin/bash\nset -e\napt-get update -y\napt-get install -y python3 python3-pip git\n"
    }
}

/// Build the provisioning config for one run.
#[must_use]
pub fn generate_config(
    provider: &Provider,
    analysis: &RepoAnalysis,
    instance_size: &str,
    suffix: &str,
    settings: &TerraformSettings,
) -> ProvisioningConfig {
    let ingress = ingress_ports(&analysis.ports);
    let payload = match provider {
        Provider::Aws => aws_payload(analysis.framework, &ingress, instance_size, suffix, settings),
        Provider::Unsupported(name) => format!("# provider '{name}' is not supported yet\n"),
    };
    ProvisioningConfig {
        provider: provider.clone(),
        region: settings.region.clone(),
        instance_size: instance_size.to_string(),
        ingress_ports: ingress,
        framework: analysis.framework,
        suffix: suffix.to_string(),
        payload,
    }
}

fn ingress_block(port: u16) -> String {
    let description = if port == SSH_PORT {
        "Allow inbound SSH on port 22".to_string()
    } else {
        format!("Allow inbound on port {port}")
    };
    format!(
        r#"
  ingress {{
    description = "{description}"
    from_port   = {port}
    to_port     = {port}
    protocol    = "tcp"
    cidr_blocks = ["0.0.0.0/0"]
  }}
"#
    )
}

fn aws_payload(
    framework: Framework,
    ingress: &[u16],
    instance_size: &str,
    suffix: &str,
    settings: &TerraformSettings,
) -> String {
    let ingress_blocks: String = ingress.iter().map(|p| ingress_block(*p)).collect();
    let user_data = user_data_script(framework);
    let region = &settings.region;
    let ami = &settings.ami;
    format!(
        r#"terraform {{
  required_providers {{
    aws = {{
      source  = "hashicorp/aws"
      version = ">= 4.0"
    }}
    tls = {{
      source  = "hashicorp/tls"
      version = ">= 4.0"
    }}
  }}
  required_version = ">= 1.0"
}}

provider "aws" {{
  region = "{region}"
}}

data "aws_vpc" "default" {{
  default = true
}}

data "aws_subnets" "default" {{
  filter {{
    name   = "vpc-id"
    values = [data.aws_vpc.default.id]
  }}
}}

data "aws_security_groups" "existing" {{
  filter {{
    name   = "group-name"
    values = ["{SHARED_SECURITY_GROUP}"]
  }}

  filter {{
    name   = "vpc-id"
    values = [data.aws_vpc.default.id]
  }}
}}

resource "aws_security_group" "app" {{
  count = length(data.aws_security_groups.existing.ids) == 0 ? 1 : 0

  name        = "{SHARED_SECURITY_GROUP}_{suffix}"
  description = "Ingress for autoship-deployed application"
  vpc_id      = data.aws_vpc.default.id
{ingress_blocks}
  egress {{
    description = "Allow all outbound"
    from_port   = 0
    to_port     = 0
    protocol    = "-1"
    cidr_blocks = ["0.0.0.0/0"]
  }}
}}

locals {{
  security_group_id = length(data.aws_security_groups.existing.ids) > 0 ? data.aws_security_groups.existing.ids[0] : aws_security_group.app[0].id
}}

resource "tls_private_key" "ssh" {{
  algorithm = "RSA"
  rsa_bits  = 4096
}}

resource "aws_key_pair" "generated" {{
  key_name   = "autoship_key_{suffix}"
  public_key = tls_private_key.ssh.public_key_openssh
}}

resource "aws_instance" "app" {{
  ami                         = "{ami}"
  instance_type               = "{instance_size}"
  key_name                    = aws_key_pair.generated.key_name
  subnet_id                   = element(data.aws_subnets.default.ids, 0)
  vpc_security_group_ids      = [local.security_group_id]
  associate_public_ip_address = true

  user_data = <<-EOT
{user_data}  EOT

  tags = {{
    Name      = "autoship-{suffix}"
    Framework = "{framework}"
  }}
}}

output "{OUTPUT_PUBLIC_IP}" {{
  description = "Public IP of the instance"
  value       = aws_instance.app.public_ip
}}

output "{OUTPUT_PRIVATE_KEY}" {{
  description = "Private key in PEM format"
  value       = tls_private_key.ssh.private_key_pem
  sensitive   = true
}}
"#
    )
}

// ── Tool version ──────────────────────────────────────────────────────────────

/// Oldest provisioning tool release the payload is written for.
pub const MIN_TOOL_VERSION: &str = "1.0.0";

/// Check `terraform version -json` output against [`MIN_TOOL_VERSION`].
///
/// # Errors
///
/// `ToolUnavailable` when the version cannot be read, `ToolTooOld` when it
/// is below the minimum.
pub fn check_tool_version(version_json: &str) -> Result<semver::Version, ProvisioningError> {
    let value: serde_json::Value = serde_json::from_str(version_json)
        .map_err(|e| ProvisioningError::ToolUnavailable(format!("unreadable version: {e}")))?;
    let raw = value
        .get("terraform_version")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| {
            ProvisioningError::ToolUnavailable("version output has no terraform_version".into())
        })?;
    let found = semver::Version::parse(raw.trim_start_matches('v'))
        .map_err(|e| ProvisioningError::ToolUnavailable(format!("bad version '{raw}': {e}")))?;
    let required = semver::Version::new(1, 0, 0);
    if found < required {
        return Err(ProvisioningError::ToolTooOld {
            found: found.to_string(),
            required: MIN_TOOL_VERSION.to_string(),
        });
    }
    Ok(found)
}

// ── Provisioning results ──────────────────────────────────────────────────────

/// What the provisioning tool reported back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionResult {
    pub public_address: Option<String>,
    pub private_key: Option<String>,
}

/// Validated connection material for the provisioned instance.
#[derive(Clone, PartialEq, Eq)]
pub struct SshCredentials {
    pub address: Ipv4Addr,
    pub private_key: String,
}

impl fmt::Debug for SshCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshCredentials")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl ProvisionResult {
    /// Require both an address and a key.
    ///
    /// # Errors
    ///
    /// `NoEndpoint` when both are absent, `InconsistentOutputs` when exactly
    /// one is present, `InvalidAddress` when the address is not IPv4.
    pub fn into_credentials(self) -> Result<SshCredentials, ProvisioningError> {
        match (self.public_address, self.private_key) {
            (Some(address), Some(private_key)) => {
                let address = address
                    .trim()
                    .parse::<Ipv4Addr>()
                    .map_err(|_| ProvisioningError::InvalidAddress(address.clone()))?;
                Ok(SshCredentials {
                    address,
                    private_key,
                })
            }
            (None, None) => Err(ProvisioningError::NoEndpoint),
            (Some(_), None) => Err(ProvisioningError::InconsistentOutputs {
                address: "present",
                key: "absent",
            }),
            (None, Some(_)) => Err(ProvisioningError::InconsistentOutputs {
                address: "absent",
                key: "present",
            }),
        }
    }
}

/// Parse `terraform output -json`.
///
/// The expected shape is `{"<name>": {"value": ..., "sensitive": bool, ...}}`.
/// Missing or null outputs, and empty strings, are reported as absent.
///
/// # Errors
///
/// Returns `MalformedOutputs` if the text is not a JSON object.
pub fn parse_outputs(json: &str) -> Result<ProvisionResult, ProvisioningError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| ProvisioningError::MalformedOutputs(e.to_string()))?;
    let Some(outputs) = value.as_object() else {
        return Err(ProvisioningError::MalformedOutputs(
            "expected a JSON object".to_string(),
        ));
    };
    let read = |name: &str| {
        outputs
            .get(name)
            .and_then(|o| o.get("value"))
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Ok(ProvisionResult {
        public_address: read(OUTPUT_PUBLIC_IP),
        private_key: read(OUTPUT_PRIVATE_KEY),
    })
}
