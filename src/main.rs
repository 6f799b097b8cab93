#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_web::{middleware::Logger, App, HttpServer};
use twitter_winner::{AppServices, WinnerSettings};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = WinnerSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let services = AppServices::from_settings(settings.clone())
        .map_err(|e| std::io::Error::other(format!("Failed to initialize services: {e}")))?;

    println!("✓ Using stateless sessions with encrypted cookies");
    start_server(services, &settings).await
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(services: AppServices, settings: &WinnerSettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &services, settings);

    HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(Logger::default())
            .configure(move |cfg| services.configure(cfg))
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, services: &AppServices, settings: &WinnerSettings) {
    println!("Starting Twitter Winner on http://{bind_address}");
    println!();
    println!("Pages:");
    println!("  GET  /                 - Landing page");
    println!("  GET  /profile          - Linked accounts");
    println!("  GET  /followers        - Draw a random follower");
    println!("  GET  /retweets[?id=]   - Retweeted tweets / draw a retweeter");
    println!("  GET  /searches[?id=]   - Saved searches / draw a matching author");
    println!("  GET  /logout           - Sign out");
    println!();
    println!("Sign-in providers:");
    let providers = services.registry.summaries();
    if providers.is_empty() {
        println!("  (none configured)");
    }
    for provider in providers {
        println!(
            "  {:<12} callback: {}",
            provider.name,
            settings.callback_url(&provider.name)
        );
    }
    println!();
    println!("System endpoints:");
    println!("  GET  /ping            - Health check");
    println!("  GET  /static/*        - Static files");
    println!(
        "  Static files folder: {}",
        settings.static_files.assets_folder
    );
}
