use crate::config::ResolvedConfig;
use crate::errors::AppResult;
use crate::server;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing::info;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

/// Builds the command-line definition.
pub fn command() -> Command<'static> {
    Command::new("nfse-faturamento")
        .version(APP_VERSION)
        .about(APP_ABOUT)
        .after_help("Example:\n  nfse-faturamento --service full --bind 0.0.0.0:8001")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a TOML configuration file")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("bind")
                .short('b')
                .long("bind")
                .help("Address to listen on (overrides bind_addr)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("service")
                .short('s')
                .long("service")
                .help("Endpoints to expose: 'full' (emissao), 'paginated' (paginado) or 'all'")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("portal")
                .long("portal-url")
                .help("Base URL of the NFS-e portal (overrides portal_base_url)")
                .action(ArgAction::Set),
        )
}

/// Resolves the configuration from the parsed arguments.
///
/// Values from `--config` are loaded first; explicit flags override them.
pub fn resolve_config(matches: &ArgMatches) -> AppResult<ResolvedConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ResolvedConfig::from_toml_file(path)?,
        None => ResolvedConfig::default(),
    };

    if let Some(bind) = matches.get_one::<String>("bind") {
        config.bind_addr = bind.clone();
    }
    if let Some(service) = matches.get_one::<String>("service") {
        config.service = service.clone();
    }
    if let Some(portal) = matches.get_one::<String>("portal") {
        config.portal_base_url = portal.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Parses command-line arguments and runs the HTTP server.
pub async fn cli() -> AppResult<()> {
    let matches = command().get_matches();
    let config = resolve_config(&matches)?;

    info!(
        portal = %config.portal_base_url,
        service = config.service_kind().display_name(),
        timeout_secs = config.request_timeout_secs,
        "Configuration resolved"
    );

    server::serve(config).await
}
