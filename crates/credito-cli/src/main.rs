// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use credito_app::AppState;
use credito_tui::UiOptions;
use runtime::{ApiRuntime, DEMO_SEED, DemoRuntime};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `credito --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let log_path = config.log_path()?;
    logging::init_tracing(&config.log_filter(), &log_path)?;
    info!(config = %options.config_path.display(), demo = options.demo, "starting credito");

    let ui_options = UiOptions {
        rows_per_page: config.rows_per_page(),
        start_tab: config.start_tab(),
        username: config.username().map(str::to_owned),
    };
    let mut state = AppState::default();

    if options.demo {
        if options.check_only {
            return Ok(());
        }
        let mut runtime = DemoRuntime::new(DEMO_SEED);
        return credito_tui::run_app(&mut state, &mut runtime, ui_options);
    }

    let base_url = config.api_base_url();
    let mut client = credito_api::Client::new(&base_url, config.api_timeout()?).with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/timeout or set CREDITO_API_URL",
            options.config_path.display()
        )
    })?;
    if options.check_only {
        client.health()?;
        println!("{} is reachable", client.base_url());
        return Ok(());
    }

    restore_session(&mut client, config.username());
    let mut runtime = ApiRuntime::new(client);
    credito_tui::run_app(&mut state, &mut runtime, ui_options)
}

/// Signs in before the UI starts when credentials are available. Failures
/// are logged and leave the login prompt to the console.
fn restore_session(client: &mut credito_api::Client, username: Option<&str>) {
    if let Ok(token) = env::var("CREDITO_TOKEN")
        && !token.trim().is_empty()
    {
        let restored = client
            .restore_token(&token)
            .and_then(|()| client.current_user());
        match restored {
            Ok(user) => {
                info!(user = user.display_name(), "session restored from CREDITO_TOKEN");
                return;
            }
            Err(error) => warn!(error = %format!("{error:#}"), "CREDITO_TOKEN rejected"),
        }
    }

    let (Some(username), Ok(password)) = (username, env::var("CREDITO_PASSWORD")) else {
        return;
    };
    match client.login(username, &password) {
        Ok(user) => info!(user = user.display_name(), "signed in from config"),
        Err(error) => warn!(error = %format!("{error:#}"), "automatic login failed"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("credito - credit sales CRM console");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Launch against generated in-memory data");
    println!("  --check                  Validate config and API reachability, then exit");
    println!("  --help                   Show this help");
    println!();
    println!("environment:");
    println!("  CREDITO_CONFIG_PATH  config file location");
    println!("  CREDITO_API_URL      API base URL (overrides [api].base_url)");
    println!("  CREDITO_PASSWORD     password for [auth].username");
    println!("  CREDITO_TOKEN        existing access token to reuse");
    println!("  CREDITO_LOG          log filter (overrides [log].level)");
}
