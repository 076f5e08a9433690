//! Command-line dashboard for the Indian market
//!
//! ```bash
//! dalal price RELIANCE --indicators SMA_20,RSI --volume
//! dalal price "TCS, INFY, NIFTY" --period 1y
//! dalal indices "NIFTY 50" SENSEX
//! dalal financials RELIANCE --frequency quarterly
//! dalal fno --select RELIANCE.NS,TCS.NS
//! ```

mod render;

use clap::{Args, Parser, Subcommand};
use dalal_market::engine::indicators::INDICATOR_MENU;
use dalal_market::indices::index_names;
use dalal_market::resolver::split_tickers;
use dalal_market::{
    DashConfig, Dashboard, Frequency, Interval, Period, PortfolioSelection, PriceRequest,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dalal")]
#[command(about = "NSE/BSE stocks, indices and financials in the terminal", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Invalidate failed requests and fetch them once more
    #[arg(long, global = true)]
    retry_failed: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Price history with indicators, or a comparison of several tickers
    Price {
        /// Comma-separated tickers or index names
        tickers: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Index levels and six-month trends
    Indices {
        /// Index names or aliases; NIFTY 50 and SENSEX when omitted
        names: Vec<String>,
        /// List the known index names and exit
        #[arg(long)]
        list: bool,
    },
    /// Balance sheet, income statement, cash flow and capital structure
    Financials {
        /// Comma-separated tickers
        tickers: String,
        /// annual or quarterly
        #[arg(short, long, default_value = "annual")]
        frequency: Frequency,
    },
    /// Derivative-eligible stocks
    Fno {
        /// Comma-separated F&O symbols to chart instead of listing the universe
        #[arg(long)]
        select: Option<String>,
        #[command(flatten)]
        view: ViewArgs,
    },
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// History period
    #[arg(short, long, default_value = "3mo")]
    period: Period,

    /// Bar width; defaults to a width suited to the period
    #[arg(short, long)]
    interval: Option<Interval>,

    /// Comma-separated indicators for single-ticker views
    #[arg(long, value_delimiter = ',')]
    indicators: Vec<String>,

    /// Window of SMA_X and EMA_X
    #[arg(long)]
    window: Option<usize>,

    /// Add the volume change column
    #[arg(long)]
    volume: bool,

    /// Number of trailing bars to print
    #[arg(long, default_value_t = 10)]
    rows: usize,
}

impl ViewArgs {
    fn price_request(&self, config: &DashConfig) -> anyhow::Result<PriceRequest> {
        let window = self.window.unwrap_or(config.default_custom_window);
        let indicators = PriceRequest::parse_indicators(&self.indicators, window, config)?;
        let mut request = PriceRequest::new(self.period)
            .with_indicators(indicators)
            .with_volume(self.volume);
        if let Some(interval) = self.interval {
            request = request.with_interval(interval);
        }
        request.validate()?;
        Ok(request)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dalal_utils::init_tracing_with_default(if cli.verbose { "debug" } else { "warn" });

    let config = DashConfig::default().with_env_overrides()?;
    let dashboard = Dashboard::with_yahoo(config)?;
    info!("Starting dalal");

    match &cli.command {
        Command::Price { tickers, view } => {
            let selection = select(&dashboard, &split_tickers(tickers), cli.retry_failed).await;
            price(&dashboard, &selection, view, cli.retry_failed).await?;
        }
        Command::Indices { names, list } => {
            if *list {
                for name in index_names() {
                    println!("{name}");
                }
                return Ok(());
            }
            let names = if names.is_empty() {
                vec!["NIFTY 50".to_string(), "SENSEX".to_string()]
            } else {
                names.clone()
            };
            let selection = select(&dashboard, &names, cli.retry_failed).await;
            render::selection_notes(&selection);

            let mut overview = dashboard.index_overview(&selection.symbols).await;
            if cli.retry_failed && !overview.failures.is_empty() {
                dashboard.refresh_failures(&overview.failures).await;
                overview = dashboard.index_overview(&selection.symbols).await;
            }
            render::index_overview(&overview);
        }
        Command::Financials { tickers, frequency } => {
            let selection = select(&dashboard, &split_tickers(tickers), cli.retry_failed).await;
            render::selection_notes(&selection);
            anyhow::ensure!(
                !selection.is_empty(),
                "Please enter at least one valid NSE/BSE stock or Indian index"
            );

            for symbol in &selection.symbols {
                let mut report = dashboard.financials_view(symbol, *frequency).await;
                if cli.retry_failed && !report.failures.is_empty() {
                    dashboard.refresh_failures(&report.failures).await;
                    report = dashboard.financials_view(symbol, *frequency).await;
                }
                render::financials(&report);
            }
        }
        Command::Fno { select, view } => {
            let universe = dashboard.derivative_universe().await;
            match select {
                None => {
                    println!("{} derivative-eligible stocks", universe.len());
                    for symbol in &universe {
                        println!("{symbol}");
                    }
                }
                Some(chosen) => {
                    let chosen = split_tickers(chosen);
                    for ticker in &chosen {
                        if !universe.iter().any(|s| s.eq_ignore_ascii_case(ticker)) {
                            eprintln!("warning: {ticker} is not in the F&O list");
                        }
                    }
                    let selection = self::select(&dashboard, &chosen, cli.retry_failed).await;
                    price(&dashboard, &selection, view, cli.retry_failed).await?;
                }
            }
        }
    }

    Ok(())
}

/// Resolve tickers, probing failed exchange lookups once more on request
async fn select(
    dashboard: &Dashboard,
    tickers: &[String],
    retry_failed: bool,
) -> PortfolioSelection {
    let selection = dashboard.select(tickers).await;
    if retry_failed && !selection.failures.is_empty() {
        dashboard.refresh_failures(&selection.failures).await;
        return dashboard.select(tickers).await;
    }
    selection
}

async fn price(
    dashboard: &Dashboard,
    selection: &PortfolioSelection,
    view: &ViewArgs,
    retry_failed: bool,
) -> anyhow::Result<()> {
    render::selection_notes(selection);
    anyhow::ensure!(
        !selection.is_empty(),
        "Please select or enter at least one ticker"
    );

    let request = view.price_request(dashboard.config())?;
    if selection.symbols.len() > 1 && !request.indicators.is_empty() {
        eprintln!(
            "note: indicators apply to single-ticker views only (available: {})",
            INDICATOR_MENU.join(" ")
        );
    }

    let mut report = dashboard.price_view(selection, &request).await?;
    if retry_failed && !report.failures.is_empty() {
        dashboard.refresh_failures(&report.failures).await;
        report = dashboard.price_view(selection, &request).await?;
    }
    render::price_report(&report, view.rows);
    Ok(())
}
