use crate::command::Command;
use crate::common::{lookup, vars, EnvVars};
use crate::error::{ExecutionResult, ValidationError};
use crate::provider::ExternalProvider;
use crate::v010::EnvironmentV010;
use crate::v011::EnvironmentV011;
use crate::version::InterfaceVersion;
use std::io::Read;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Execution environment of one supported protocol revision.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    V010(EnvironmentV010),
    V011(EnvironmentV011),
}

impl Descriptor {
    pub fn interface_version(&self) -> InterfaceVersion {
        match self {
            Descriptor::V010(_) => InterfaceVersion::V010,
            Descriptor::V011(_) => InterfaceVersion::V011,
        }
    }

    pub fn command(&self) -> &Command {
        match self {
            Descriptor::V010(env) => &env.command,
            Descriptor::V011(env) => &env.command,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Descriptor::V010(env) => env.validate(),
            Descriptor::V011(env) => env.validate(),
        }
    }
}

/// Validated execution environment for a single provider invocation.
///
/// Only the descriptor of the negotiated revision exists. The value can only
/// be built through validation, so holding one means dispatch is safe.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    descriptor: Descriptor,
    /// `HOSTWIRE_INTERFACE_VERSION` exactly as received.
    requested_version: String,
}

impl Environment {
    /// Resolves the environment of the current process.
    pub fn from_process() -> ExecutionResult<Self> {
        let env: EnvVars = std::env::vars().collect();
        let stdin = std::io::stdin();
        Self::resolve(&env, stdin.lock())
    }

    /// Negotiates the revision, populates its descriptor and validates it.
    pub fn resolve<R: Read>(env: &EnvVars, stdin: R) -> ExecutionResult<Self> {
        let requested_version = lookup(env, vars::INTERFACE_VERSION);
        let version = InterfaceVersion::negotiate(&requested_version)?;
        debug!(%version, "Negotiated interface version");

        let descriptor = match version {
            InterfaceVersion::V010 => Descriptor::V010(EnvironmentV010::from_env(env, stdin)?),
            InterfaceVersion::V011 => Descriptor::V011(EnvironmentV011::from_env(env, stdin)?),
        };

        let mut environment = Self::from_descriptor(descriptor)?;
        environment.requested_version = requested_version;
        Ok(environment)
    }

    pub fn from_descriptor(descriptor: Descriptor) -> ExecutionResult<Self> {
        descriptor.validate()?;
        let requested_version = match &descriptor {
            Descriptor::V010(_) => String::new(),
            Descriptor::V011(env) => env.interface_version.clone(),
        };
        Ok(Self {
            descriptor,
            requested_version,
        })
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn interface_version(&self) -> InterfaceVersion {
        self.descriptor.interface_version()
    }

    pub fn command(&self) -> &Command {
        self.descriptor.command()
    }

    /// Version answered to `GetVersion`: the requested version unchanged, or
    /// the oldest revision when the controller sent none.
    pub fn reported_version(&self) -> &str {
        if self.requested_version.trim().is_empty() {
            InterfaceVersion::OLDEST.as_str()
        } else {
            &self.requested_version
        }
    }

    /// Pool extra specs, only carried by v0.1.1 and later.
    pub fn extra_specs(&self) -> Option<&str> {
        match &self.descriptor {
            Descriptor::V010(_) => None,
            Descriptor::V011(env) => Some(env.extra_specs.as_str()),
        }
    }

    /// Dispatches the command to `provider` and returns the stdout payload.
    pub async fn run<P>(&self, provider: &P, cancel: &CancellationToken) -> ExecutionResult<String>
    where
        P: ExternalProvider + ?Sized,
    {
        info!(
            version = %self.interface_version(),
            command = %self.command(),
            "Running provider command"
        );

        if *self.command() == Command::GetVersion {
            return Ok(self.reported_version().to_string());
        }

        match &self.descriptor {
            Descriptor::V010(env) => env.run(provider, cancel).await,
            Descriptor::V011(env) => env.run(provider, cancel).await,
        }
    }
}
