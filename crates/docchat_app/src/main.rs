mod app;
mod config;
mod effects;

use engine_logging::engine_info;

fn main() -> anyhow::Result<()> {
    engine_logging::initialize_for_app(engine_logging::LogDestination::File);

    let cwd = std::env::current_dir()?;
    let mut config = config::load(&cwd);
    if std::env::args().any(|arg| arg == "--baseline") {
        config.baseline = true;
    }

    engine_info!("Starting doc-chat against {}", config.base_url);
    app::run_shell(config)
}
