use clap::Parser;
use tourmarket::core::ConfigProvider;
use tourmarket::utils::{logger, validation::Validate};
use tourmarket::CliArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting tourmarket");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    if args.check {
        println!("Listen:      {}", config.bind_address());
        println!("Backend:     {}", config.backend_url());
        println!("Timeout:     {}s", config.request_timeout().as_secs());
        println!("Login path:  {}", config.login_path());
        for rule in config.access_policy().rules() {
            match rule.role {
                Some(role) => println!("Rule:        {} -> {}", rule.prefix, role),
                None => println!("Rule:        {} -> any session", rule.prefix),
            }
        }
        return Ok(());
    }

    if let Err(e) = tourmarket::serve(config).await {
        tracing::error!("❌ Server failed: {} (Category: {:?})", e, e.category());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    Ok(())
}
