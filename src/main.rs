use clap::Parser;
use shaketune_installer::utils::logger;
use shaketune_installer::{CliConfig, Installer, SystemHost};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.into_install_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    let installer = Installer::new(config, Arc::new(SystemHost::new()));

    match installer.run().await {
        Ok(reports) => {
            let summary = installer.summary(&reports);
            tracing::info!(
                "📊 Summary: {}",
                serde_json::to_string(&summary).unwrap_or_default()
            );
            println!("✅ Shake&Tune installed successfully!");
        }
        Err(e) => {
            tracing::error!(
                "❌ Installation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}
