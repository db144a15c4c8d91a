use configuration::{init_tracing, load_settings};

// This main function is the entry point when running `cargo run -p web-server`.
// It loads settings, installs logging and hands over to `run_server`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = load_settings(None)?;
    let _guard = init_tracing(&settings.logging)?;
    web_server::run_server(settings).await
}
