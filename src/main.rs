// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use currency_exchanger::api::{ErApiClient, RateFetcher};
use currency_exchanger::catalog::CurrencyCatalog;
use currency_exchanger::config::{self, Config};
use currency_exchanger::models::CurrencyCode;
use currency_exchanger::state::RefreshPolicy;
use currency_exchanger::theme::ThemePreference;
use currency_exchanger::tui;
use currency_exchanger::view::ConverterView;

#[derive(Parser)]
#[command(
    name = "currency-exchanger",
    version,
    about = "Convert money between currencies using live exchange rates"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Rate service root URL (overrides config.toml)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Base currency to preselect (overrides config.toml)
    #[arg(long, global = true)]
    base: Option<String>,

    /// When to refresh rates (overrides config.toml)
    #[arg(long, global = true, value_enum)]
    refresh: Option<RefreshPolicy>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive converter (default)
    Tui,
    /// List supported currencies, optionally filtered
    Currencies { query: Option<String> },
    /// Show the current rate table for a base currency (default USD)
    Rates { base: Option<String> },
    /// Convert AMOUNT from one currency to another
    Convert {
        amount: String,
        from: String,
        to: String,
    },
    /// Show or toggle the dark theme
    Theme {
        #[arg(value_enum, default_value_t = ThemeAction::Show)]
        action: ThemeAction,
    },
    /// Show the effective configuration or write it to config.toml
    Config {
        #[arg(value_enum, default_value_t = ConfigAction::Show)]
        action: ConfigAction,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum ThemeAction {
    Show,
    Toggle,
}

#[derive(ValueEnum, Clone, Copy)]
enum ConfigAction {
    Show,
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // The TUI owns the terminal, so it stays quiet unless RUST_LOG asks otherwise
    let default_level = match cli.command {
        None | Some(Command::Tui) => "off",
        _ => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = effective_config(&cli)?;

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => run_tui(&config)?,
        Command::Currencies { query } => list_currencies(query.as_deref().unwrap_or(""))?,
        Command::Rates { base } => show_rates(&config, base.as_deref()).await?,
        Command::Convert { amount, from, to } => convert(&config, &amount, &from, &to).await?,
        Command::Theme { action } => theme(action)?,
        Command::Config { action } => show_config(&config, action)?,
    }

    Ok(())
}

fn effective_config(cli: &Cli) -> Result<Config> {
    let mut config = config::load_config()?;
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(base) = &cli.base {
        config.default_base = Some(CurrencyCode::new(base)?);
    }
    if let Some(refresh) = cli.refresh {
        config.refresh = refresh;
    }
    Ok(config)
}

fn client(config: &Config) -> Result<Arc<ErApiClient>> {
    let client = ErApiClient::new(&config.api_base_url, config.request_timeout())
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(client))
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn run_tui(config: &Config) -> Result<()> {
    let catalog = CurrencyCatalog::load()?;
    let theme = ThemePreference::load()?;
    let mut view = ConverterView::new(catalog, client(config)?, config.refresh).with_theme(theme);

    if let Some(base) = &config.default_base {
        view.select_base(base.as_str())?;
    }

    tui::start_tui(view)
}

fn list_currencies(query: &str) -> Result<()> {
    let catalog = CurrencyCatalog::load()?;
    let matches = catalog.filter(query);
    if matches.is_empty() {
        println!("Nothing found.");
        return Ok(());
    }

    for code in matches {
        println!("{}", code);
    }
    Ok(())
}

async fn show_rates(config: &Config, base: Option<&str>) -> Result<()> {
    let fetcher = client(config)?;
    let base = match base {
        Some(code) => Some(CurrencyCode::new(code)?),
        None => config.default_base.clone(),
    };

    let pb = spinner(format!(
        "Fetching rates for {} ⌛️",
        base.as_ref().map_or(CurrencyCode::DEFAULT_BASE, CurrencyCode::as_str)
    ));
    let result = match &base {
        Some(code) => fetcher.fetch(code).await,
        None => fetcher.fetch_default().await,
    };
    pb.finish_and_clear();
    let table = result?;

    match table.updated() {
        Some(updated) => println!(
            "✅ {} rates for {} as of {}",
            table.len(),
            table.base(),
            updated.format("%Y-%m-%d %H:%M UTC")
        ),
        None => println!("✅ {} rates for {}", table.len(), table.base()),
    }
    for (code, rate) in table.iter() {
        println!("{:<5} {}", code, rate);
    }
    Ok(())
}

async fn convert(config: &Config, amount: &str, from: &str, to: &str) -> Result<()> {
    let catalog = CurrencyCatalog::load()?;
    let mut view = ConverterView::new(catalog, client(config)?, config.refresh);

    view.select_base(from)?;
    view.select_target(to)?;
    view.set_amount(amount);

    let pb = spinner(format!("Fetching rates for {} ⌛️", from.trim().to_uppercase()));
    let rates = view.wait_for_rates().await.map(|_| ());
    pb.finish_and_clear();
    rates?;

    let result = view.submit()?;
    println!("✅ {}", result);
    Ok(())
}

fn theme(action: ThemeAction) -> Result<()> {
    let mut theme = ThemePreference::load()?;
    if let ThemeAction::Toggle = action {
        theme.toggle()?;
    }
    println!(
        "Theme: {} ({})",
        if theme.dark_mode() { "dark" } else { "light" },
        theme.path().display()
    );
    Ok(())
}

fn show_config(config: &Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => print!("{}", toml::to_string_pretty(config)?),
        ConfigAction::Init => {
            let path = config::get_config_path();
            if path.exists() {
                anyhow::bail!("{} already exists", path.display());
            }
            config::save_config(config, &path)?;
            println!("✅ Config written to {}", path.display());
        }
    }
    Ok(())
}
