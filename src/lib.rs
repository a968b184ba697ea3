// United report chat - chat-driven airline incident reporting
//
// Each chat screen is backed by a ChatSession that:
// - Greets the user and resumes stored conversations
// - Persists every message and a running chat summary
// - Replies with canned assistant messages after a short delay
// - Uploads library and camera images to an object store

// Core modules
pub mod chat;
pub mod config;
pub mod console;
pub mod database;
pub mod media;
pub mod state;
pub mod store;

// ============== Main App Entry ==============

pub fn run() {
    // Initialize env_logger to output to stderr (reads RUST_LOG env var)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Report chat starting...");
    let config = config::AppConfig::from_env();
    log::info!("Data directory: {:?}", config.data_dir);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(console::run_console(config)) {
        log::error!("Report chat failed: {:#}", e);
        std::process::exit(1);
    }
}
