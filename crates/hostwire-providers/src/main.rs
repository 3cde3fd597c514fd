use hostwire_execution::{init_tracing, run_provider, RunnerConfig};
use hostwire_providers::InMemoryProvider;

#[tokio::main]
async fn main() {
    if let Err(error) = init_tracing() {
        eprintln!("failed to initialise logging: {error}");
    }

    let provider = InMemoryProvider::new();
    let config = RunnerConfig::from_env();
    let code = run_provider(&provider, &config).await;

    std::process::exit(code);
}
