use crate::common::EnvVars;
use crate::environment::Environment;
use crate::error::{render_error_chain, ExecutionError, ExecutionResult};
use crate::exit::exit_code_for;
use crate::provider::ExternalProvider;
use std::io::{Read, Write};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub const LOG_ENV: &str = "HOSTWIRE_LOG";
pub const TIMEOUT_ENV: &str = "HOSTWIRE_PROVIDER_TIMEOUT_SECS";

/// Installs the global subscriber. Logs go to stderr because stdout carries
/// the protocol payload.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Cancel the invocation once this much time has passed.
    pub timeout: Option<Duration>,
}

impl RunnerConfig {
    pub fn from_env() -> Self {
        let env: EnvVars = std::env::vars().collect();
        Self::from_vars(&env)
    }

    pub fn from_vars(env: &EnvVars) -> Self {
        let timeout = match env.get(TIMEOUT_ENV) {
            None => None,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    warn!(value = %raw, "Ignoring invalid {}", TIMEOUT_ENV);
                    None
                }
            },
        };
        Self { timeout }
    }
}

/// Entry point of a provider binary: resolves the process environment, runs
/// the command and reports through stdout, stderr and the returned exit code.
///
/// Ctrl-C cancels the in-flight provider call.
pub async fn run_provider<P>(provider: &P, config: &RunnerConfig) -> i32
where
    P: ExternalProvider + ?Sized,
{
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling provider call");
            on_interrupt.cancel();
        }
    });

    let env: EnvVars = std::env::vars().collect();
    let code = run_with(
        provider,
        config,
        &env,
        std::io::stdin(),
        &mut std::io::stdout(),
        &mut std::io::stderr(),
        cancel,
    )
    .await;

    interrupt.abort();
    code
}

/// Same as [`run_provider`] with every process resource passed in.
pub async fn run_with<P, R, O, E>(
    provider: &P,
    config: &RunnerConfig,
    env: &EnvVars,
    stdin: R,
    stdout: &mut O,
    stderr: &mut E,
    cancel: CancellationToken,
) -> i32
where
    P: ExternalProvider + ?Sized,
    R: Read + Send + 'static,
    O: Write,
    E: Write,
{
    let timer = config.timeout.map(|timeout| {
        let on_timeout = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            warn!(timeout_secs = timeout.as_secs(), "Provider call timed out");
            on_timeout.cancel();
        })
    });

    let result = execute(provider, env, stdin, &cancel).await;

    if let Some(timer) = timer {
        timer.abort();
    }

    let code = exit_code_for(&result);
    match result {
        Ok(payload) => {
            if !payload.is_empty() {
                if let Err(err) = stdout.write_all(payload.as_bytes()).and_then(|_| stdout.flush())
                {
                    let rendered = format!("Failed to write response to stdout: {err}");
                    error!(error = %err, "Failed to write response to stdout");
                    let _ = writeln!(stderr, "{rendered}");
                    return crate::exit::EXIT_CODE_FAILURE;
                }
            }
            info!("Provider command completed");
        }
        Err(err) => {
            let rendered = render_error_chain(&err);
            error!(exit_code = code, error = %rendered, "Provider command failed");
            // stderr is the last channel left; nothing to do if it is gone too.
            let _ = writeln!(stderr, "{rendered}");
        }
    }
    code
}

/// Resolves the environment on a blocking thread so a stalled stdin cannot
/// outlive the token, then dispatches.
async fn execute<P, R>(
    provider: &P,
    env: &EnvVars,
    stdin: R,
    cancel: &CancellationToken,
) -> ExecutionResult<String>
where
    P: ExternalProvider + ?Sized,
    R: Read + Send + 'static,
{
    let env = env.clone();
    let resolving = tokio::task::spawn_blocking(move || Environment::resolve(&env, stdin));

    let environment = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ExecutionError::ResolveCancelled),
        joined = resolving => joined.map_err(ExecutionError::ResolveTask)??,
    };
    environment.run(provider, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::vars;
    use crate::test_support::{config_file, full_env, instance, RecordingProvider};
    use hostwire_core::{ProviderError, ProviderInstance};
    use std::io::Cursor;

    async fn run_captured(
        provider: &RecordingProvider,
        env: &EnvVars,
        stdin: &str,
    ) -> (i32, String, String) {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run_with(
            provider,
            &RunnerConfig::default(),
            env,
            Cursor::new(stdin.to_string()),
            &mut stdout,
            &mut stderr,
            CancellationToken::new(),
        )
        .await;
        (
            code,
            String::from_utf8(stdout).unwrap(),
            String::from_utf8(stderr).unwrap(),
        )
    }

    #[test]
    fn test_runner_config_timeout_parsing() {
        let mut env = EnvVars::new();
        assert_eq!(RunnerConfig::from_vars(&env).timeout, None);

        env.insert(TIMEOUT_ENV.to_string(), "45".to_string());
        assert_eq!(
            RunnerConfig::from_vars(&env).timeout,
            Some(Duration::from_secs(45))
        );

        env.insert(TIMEOUT_ENV.to_string(), "0".to_string());
        assert_eq!(RunnerConfig::from_vars(&env).timeout, None);

        env.insert(TIMEOUT_ENV.to_string(), "soon".to_string());
        assert_eq!(RunnerConfig::from_vars(&env).timeout, None);
    }

    #[tokio::test]
    async fn test_list_writes_json_array_to_stdout() {
        let config = config_file();
        let env = full_env("ListInstances", &config);
        let provider = RecordingProvider::with_instances(vec![
            instance("vm-1", "runner-1"),
            instance("vm-2", "runner-2"),
        ]);

        let (code, stdout, stderr) = run_captured(&provider, &env, "").await;
        assert_eq!(code, 0);
        assert!(stderr.is_empty());
        let listed: Vec<ProviderInstance> = serde_json::from_str(&stdout).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].provider_id, "vm-1");
        assert_eq!(listed[1].provider_id, "vm-2");
    }

    #[tokio::test]
    async fn test_delete_writes_nothing_to_stdout() {
        let config = config_file();
        let env = full_env("DeleteInstance", &config);
        let provider = RecordingProvider::new();

        let (code, stdout, _) = run_captured(&provider, &env, "").await;
        assert_eq!(code, 0);
        assert!(stdout.is_empty());
    }

    #[tokio::test]
    async fn test_validation_failure_reports_on_stderr() {
        let config = config_file();
        let mut env = full_env("DeleteInstance", &config);
        env.remove(vars::INSTANCE_ID);
        let provider = RecordingProvider::new();

        let (code, stdout, stderr) = run_captured(&provider, &env, "").await;
        assert_eq!(code, 1);
        assert!(stdout.is_empty());
        assert!(stderr.contains("instance ID"));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_exits_with_reserved_code() {
        let config = config_file();
        let env = full_env("GetInstance", &config);
        let provider = RecordingProvider::failing(ProviderError::not_found("vm-1"));

        let (code, stdout, stderr) = run_captured(&provider, &env, "").await;
        assert_eq!(code, 30);
        assert!(stdout.is_empty());
        assert!(stderr.contains("Not found: vm-1"));
    }

    #[tokio::test]
    async fn test_duplicate_exits_with_reserved_code() {
        let config = config_file();
        let env = full_env("CreateInstance", &config);
        let provider = RecordingProvider::failing(ProviderError::duplicate("runner-1"));

        let (code, _, _) = run_captured(&provider, &env, r#"{"name":"runner-1"}"#).await;
        assert_eq!(code, 31);
    }

    #[tokio::test]
    async fn test_pre_cancelled_run_fails_generically() {
        let config = config_file();
        let env = full_env("StartInstance", &config);
        let provider = RecordingProvider::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run_with(
            &provider,
            &RunnerConfig::default(),
            &env,
            Cursor::new(String::new()),
            &mut stdout,
            &mut stderr,
            cancel,
        )
        .await;
        assert_eq!(code, 1);
        assert!(String::from_utf8(stderr).unwrap().contains("Cancelled"));
    }

    /// Stdout whose reader has gone away.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "controller closed stdout",
            ))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Stdin that blocks until `release` fires or its sender is dropped.
    struct StalledStdin {
        release: std::sync::mpsc::Receiver<()>,
    }

    impl Read for StalledStdin {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.release.recv();
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_stdout_write_failure_is_reported_on_stderr() {
        let config = config_file();
        let env = full_env("ListInstances", &config);
        let provider = RecordingProvider::with_instances(vec![instance("vm-1", "runner-1")]);

        let mut stderr = Vec::new();
        let code = run_with(
            &provider,
            &RunnerConfig::default(),
            &env,
            Cursor::new(String::new()),
            &mut ClosedPipe,
            &mut stderr,
            CancellationToken::new(),
        )
        .await;

        assert_eq!(code, crate::exit::EXIT_CODE_FAILURE);
        let stderr = String::from_utf8(stderr).unwrap();
        assert!(stderr.contains("Failed to write response to stdout"));
        assert!(stderr.contains("controller closed stdout"));
    }

    #[tokio::test]
    async fn test_timeout_interrupts_stalled_stdin() {
        let config = config_file();
        let env = full_env("CreateInstance", &config);
        let provider = RecordingProvider::new();
        let (release, stalled) = std::sync::mpsc::channel();
        let runner_config = RunnerConfig {
            timeout: Some(Duration::from_millis(50)),
        };

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = tokio::time::timeout(
            Duration::from_secs(5),
            run_with(
                &provider,
                &runner_config,
                &env,
                StalledStdin { release: stalled },
                &mut stdout,
                &mut stderr,
                CancellationToken::new(),
            ),
        )
        .await
        .expect("runner should give up on a stalled stdin");
        drop(release);

        assert_eq!(code, crate::exit::EXIT_CODE_FAILURE);
        assert!(stdout.is_empty());
        assert!(String::from_utf8(stderr)
            .unwrap()
            .contains("Cancelled while reading the execution environment"));
        assert!(provider.calls().is_empty());
    }
}
