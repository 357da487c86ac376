use clap::Parser;
use placemap::adapters::place_file::{ensure_unique_ids, parse_places_document};
use placemap::adapters::{FilePlaceSource, KakaoRestGeocoder, PlacesClient};
use placemap::app::{run_preview, PreviewOptions, PreviewReport};
use placemap::config::cli::{CheckArgs, Cli, Command, PreviewArgs};
use placemap::config::toml_config::TomlConfig;
use placemap::domain::model::Category;
use placemap::presentation::filter::{neighborhood_of, NEIGHBORHOODS};
use placemap::utils::validation::{validate_required_field, Validate};
use placemap::utils::{error::PlaceMapError, logger};
use placemap::{AppConfig, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Command::Serve(args) => {
            let result = match load_config(&cli) {
                Ok(mut config) => {
                    args.apply(&mut config);
                    logger::init_server_logger(config.server.json_logs);
                    serve(config).await
                }
                Err(e) => {
                    logger::init_server_logger(false);
                    Err(e)
                }
            };
            exit_on_error(result);
        }
        Command::Preview(args) => {
            logger::init_cli_logger(cli.verbose);
            exit_on_error(preview(&cli, args).await);
        }
        Command::Check(args) => {
            logger::init_cli_logger(cli.verbose);
            exit_on_error(check(&cli, args));
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let file = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            TomlConfig::from_file(path)?
        }
        None => TomlConfig::default(),
    };
    Ok(AppConfig::from_toml(file))
}

async fn serve(config: AppConfig) -> Result<()> {
    config.validate()?;
    let addr = config.socket_addr()?;
    tracing::info!("Serving places from {}", config.data.path);
    placemap::server::serve(addr, Arc::new(FilePlaceSource::new(&config.data.path))).await
}

async fn preview(cli: &Cli, args: &PreviewArgs) -> Result<()> {
    let mut config = load_config(cli)?;
    args.apply(&mut config);
    config.validate()?;
    if cli.verbose {
        tracing::debug!("Effective config: {:?}", config);
    }

    let rest_api_key = validate_required_field("map.rest_api_key", &config.map.rest_api_key)?;
    let geocoder = Arc::new(KakaoRestGeocoder::new(&config.map.local_api_url, rest_api_key.clone()));
    let options = PreviewOptions {
        category: args.category,
        neighborhood: args.neighborhood.clone(),
    };

    let report: PreviewReport = match &config.data.api_url {
        Some(api_url) => {
            let client = PlacesClient::new(api_url)?;
            run_preview(&client, config.sdk_config(), config.controller_config(), geocoder, &options)
                .await?
        }
        None => {
            let source = FilePlaceSource::new(&config.data.path);
            run_preview(&source, config.sdk_config(), config.controller_config(), geocoder, &options)
                .await?
        }
    };

    if let Some(message) = report.message {
        eprintln!("⚠️  {}", message);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn check(cli: &Cli, args: &CheckArgs) -> Result<()> {
    let mut config = load_config(cli)?;
    args.apply(&mut config);

    let contents = std::fs::read_to_string(&config.data.path)?;
    let document = parse_places_document(&contents)?;
    ensure_unique_ids(&document.places)?;

    let mut per_category: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut per_neighborhood: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut outside_neighborhoods = 0;
    let mut blank_addresses = 0;
    for place in &document.places {
        *per_category
            .entry(place.effective_category().label())
            .or_default() += 1;
        match neighborhood_of(place) {
            Some(name) => *per_neighborhood.entry(name).or_default() += 1,
            None => outside_neighborhoods += 1,
        }
        if place.address.trim().is_empty() {
            blank_addresses += 1;
        }
    }

    println!(
        "✅ {}: {} place(s)",
        config.data.path,
        document.places.len()
    );
    for category in Category::SELECTOR_ORDER.iter().skip(1) {
        let count = per_category.get(category.label()).copied().unwrap_or(0);
        println!("   {:<8} {}", category.label(), count);
    }
    for name in NEIGHBORHOODS.iter().skip(1) {
        let count = per_neighborhood.get(name).copied().unwrap_or(0);
        println!("   {:<8} {}", name, count);
    }
    if outside_neighborhoods > 0 {
        println!(
            "⚠️  {} place(s) are outside every selectable neighborhood",
            outside_neighborhoods
        );
    }
    if blank_addresses > 0 {
        println!(
            "⚠️  {} place(s) have no address and will never get a marker",
            blank_addresses
        );
    }
    Ok(())
}

fn exit_on_error(result: Result<()>) {
    if let Err(e) = result {
        report_error(&e);
        std::process::exit(e.exit_code());
    }
}

fn report_error(e: &PlaceMapError) {
    tracing::error!("❌ {}", e);
    tracing::error!("💡 {}", e.recovery_suggestion());
    eprintln!("❌ {}: {}", e.user_message(), e);
    eprintln!("💡 {}", e.recovery_suggestion());
}
