//! Tradelog - strategy backtesting for the trading journal
//!
//! Usage:
//!   tradelog serve --port 3001                          Launch the HTTP API
//!   tradelog run --source demo --strategy RSI           Backtest from the CLI
//!   tradelog strategies                                 List strategy types

mod config;
mod sources;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use backtest_engine::{
    get_catalog, BacktestConfig, BacktestEngine, BacktestResult, Candle, CandleQuery,
    OpenPositionPolicy, Strategy, UnsupportedStrategyPolicy,
};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use config::AppConfig;
use sources::{demo_candles, read_candles_file, DataSource, MarketData};

const APP_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));
const DEFAULT_SEED: u64 = 42;

#[derive(Parser)]
#[command(name = "tradelog")]
#[command(about = "Backtest trading strategies over historical candles", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the backtest HTTP API
    Serve {
        /// Host to bind to (default: TRADELOG_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (default: TRADELOG_PORT or 3001)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one backtest from the CLI
    Run(RunArgs),
    /// List the supported strategy types and their defaults
    Strategies,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Where candles come from
    #[arg(long, value_enum, default_value_t = DataSource::Binance)]
    source: DataSource,
    #[arg(long, default_value = "BTCUSDT")]
    symbol: String,
    #[arg(long, default_value = "1h")]
    interval: String,
    /// Number of candles to request
    #[arg(long)]
    limit: Option<u32>,
    /// Range start (ms since epoch)
    #[arg(long)]
    start_time: Option<i64>,
    /// Range end (ms since epoch)
    #[arg(long)]
    end_time: Option<i64>,
    /// JSON candle file, required with `--source file`
    #[arg(long)]
    candles: Option<PathBuf>,
    /// Seed for `--source demo`
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    /// Strategy type: SMA_CROSS, RSI, MACD (case-insensitive here)
    #[arg(long, default_value = "SMA_CROSS")]
    strategy: String,
    /// Display name for the strategy
    #[arg(long)]
    name: Option<String>,
    /// Strategy parameter, repeatable: --param fastPeriod=10
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, f64)>,
    #[arg(long, default_value = "10000")]
    capital: Decimal,
    /// Commission per leg as a fraction (0.001 = 0.1%)
    #[arg(long, default_value = "0.001")]
    commission: Decimal,
    /// Close a position still open at the end on the last candle
    #[arg(long)]
    close_open: bool,
    /// Hold on every candle instead of failing for unknown strategy types
    #[arg(long)]
    allow_unsupported: bool,
    /// Optional JSON export path
    #[arg(long)]
    export: Option<PathBuf>,
}

impl RunArgs {
    fn trading_strategy(&self) -> Strategy {
        let strategy_type = self.strategy.trim().to_uppercase();
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| format!("{} {}", strategy_type, self.symbol));
        self.params
            .iter()
            .fold(Strategy::new(name, strategy_type), |s, (k, v)| {
                s.with_param(k.as_str(), *v)
            })
    }

    fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            initial_capital: self.capital,
            commission: self.commission,
            unsupported_strategy: if self.allow_unsupported {
                UnsupportedStrategyPolicy::HoldAll
            } else {
                UnsupportedStrategyPolicy::Reject
            },
            open_position: if self.close_open {
                OpenPositionPolicy::CloseAtLastCandle
            } else {
                OpenPositionPolicy::Abandon
            },
        }
    }

    fn query(&self) -> CandleQuery {
        CandleQuery {
            limit: self.limit,
            start_time: self.start_time,
            end_time: self.end_time,
            ..CandleQuery::new(self.symbol.as_str(), self.interval.as_str())
        }
    }
}

#[derive(Clone)]
struct AppState {
    market: Arc<MarketData>,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,backtest_engine=debug,tradelog=debug")
    } else {
        EnvFilter::new("info,backtest_engine=info,tradelog=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

/// `key=value` with a numeric value
fn parse_param(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing parameter name in '{}'", s));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    Ok((key.to_string(), value))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.host.clone());
            let port = port.unwrap_or(config.port);
            cmd_serve(&config, &host, port).await?;
        }
        Commands::Run(args) => {
            cmd_run(&config, args).await?;
        }
        Commands::Strategies => cmd_strategies(),
    }

    Ok(())
}

// ============================================================================
// Serve command - Axum web server
// ============================================================================

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(api_health))
        .route("/strategies", get(api_strategies))
        .route("/backtest", post(api_backtest))
        .route("/binance/klines", get(api_binance_klines))
        .route("/binance/symbols", get(api_binance_symbols))
        .route("/binance/price", get(api_binance_price))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(cors)
}

async fn cmd_serve(config: &AppConfig, host: &str, port: u16) -> anyhow::Result<()> {
    info!("Tradelog v{} starting...", APP_VERSION);

    let state = AppState {
        market: Arc::new(MarketData::from_config(config)),
    };
    let app = build_router(state);

    let addr: std::net::SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("\n=== Tradelog v{} ===", APP_VERSION);
    println!("Backtest API Server");
    println!("Listening on http://{}", addr);
    println!("\nEndpoints:");
    println!("  GET  /api/health              - Health check");
    println!("  GET  /api/strategies          - Strategy catalog");
    println!("  POST /api/backtest            - Run a backtest");
    println!("  GET  /api/binance/klines      - Fetch Binance klines (proxy)");
    println!("  GET  /api/binance/symbols     - Trading USDT symbols");
    println!("  GET  /api/binance/price       - Latest price for a symbol");
    println!("\nPress Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Run command - CLI mode (no web server)
// ============================================================================

async fn cmd_run(config: &AppConfig, args: RunArgs) -> anyhow::Result<()> {
    println!("\n=== Tradelog v{} ===", APP_VERSION);

    let candles = match (&args.source, &args.candles) {
        (DataSource::File, Some(path)) => read_candles_file(path).await?,
        (DataSource::File, None) => anyhow::bail!("--source file needs --candles <path>"),
        (source, _) => {
            MarketData::from_config(config)
                .load(*source, &args.query(), args.seed)
                .await?
        }
    };

    let strategy = args.trading_strategy();
    println!(
        "Source: {:?} | Symbol: {} | Interval: {} | Candles: {}",
        args.source,
        args.symbol,
        args.interval,
        candles.len()
    );
    println!(
        "Strategy: {} ({}) | Capital: {} | Commission: {}",
        strategy.name, strategy.strategy_type, args.capital, args.commission
    );

    let engine = BacktestEngine::new(args.backtest_config());
    let result = engine.run(&candles, &strategy)?;

    print_summary(&result);

    if let Some(export_path) = &args.export {
        let export_data = build_export_json(&args, &result);
        let json = serde_json::to_string_pretty(&export_data)?;
        std::fs::write(export_path, &json)?;
        println!("\nResult exported to {}", export_path.display());
    }

    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;

    println!("\nResult: {}", result.strategy_name);
    println!(
        "  Equity: {} -> {} | Net: {:+} | Trades: {} ({} won, {} lost)",
        result.initial_capital.round_dp(2),
        result.final_equity.round_dp(2),
        m.net_profit.round_dp(2),
        m.total_trades,
        m.winning_trades,
        m.losing_trades,
    );
    println!(
        "  Win rate: {}% | Profit factor: {} | Max DD: {} ({}%) | Sharpe: {}",
        m.win_rate.round_dp(2),
        m.profit_factor,
        m.max_drawdown.round_dp(2),
        m.max_drawdown_percent.round_dp(2),
        m.sharpe_ratio.round_dp(2),
    );

    if result.trades.is_empty() {
        println!("\nNo trades.");
        return;
    }

    println!(
        "\n  {:>3}  {:>14} {:>14} {:>12} {:>12} {:>10} {:>8}",
        "#", "Entry", "Exit", "Entry px", "Exit px", "PnL", "PnL%"
    );
    println!("  {}", "-".repeat(82));
    for (i, t) in result.trades.iter().enumerate() {
        println!(
            "  {:>3}  {:>14} {:>14} {:>12} {:>12} {:>+10} {:>7}%",
            i + 1,
            t.entry_time,
            t.exit_time,
            t.entry_price,
            t.exit_price,
            t.pnl.round_dp(4),
            t.pnl_percent.round_dp(2),
        );
    }
}

fn build_export_json(args: &RunArgs, result: &BacktestResult) -> serde_json::Value {
    serde_json::json!({
        "generated_at": Utc::now().to_rfc3339(),
        "version": APP_VERSION,
        "request": {
            "source": args.source,
            "symbol": args.symbol,
            "interval": args.interval,
            "limit": args.limit,
            "start_time": args.start_time,
            "end_time": args.end_time,
            "config": args.backtest_config(),
        },
        "result": result,
    })
}

// ============================================================================
// Strategies command
// ============================================================================

fn cmd_strategies() {
    println!("\nSupported strategies:");
    for entry in get_catalog() {
        let params = entry
            .default_strategy
            .parameters
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "  {:<10} {:<16} warm-up {:>3}  defaults: {}",
            entry.strategy_type, entry.display_name, entry.warmup, params
        );
        println!("             {}", entry.description);
    }
}

// ============================================================================
// API Handlers
// ============================================================================

type ApiResult = Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)>;

fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<serde_json::Value>) {
    (
        status,
        Json(serde_json::json!({
            "success": false,
            "message": message.into(),
        })),
    )
}

/// GET /api/health
async fn api_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "tradelog",
        "version": APP_VERSION,
    }))
}

/// GET /api/strategies
async fn api_strategies() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "strategies": get_catalog(),
    }))
}

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn default_interval() -> String {
    "1h".to_string()
}

/// Body of POST /api/backtest
#[derive(Debug, Deserialize)]
struct BacktestRequest {
    #[serde(default)]
    source: DataSource,
    #[serde(default = "default_symbol")]
    symbol: String,
    #[serde(default = "default_interval")]
    interval: String,
    limit: Option<u32>,
    start_time: Option<i64>,
    end_time: Option<i64>,
    seed: Option<u64>,
    /// Inline candles; when present no source is queried
    candles: Option<Vec<Candle>>,
    strategy: Strategy,
    initial_capital: Option<Decimal>,
    commission: Option<Decimal>,
    #[serde(default)]
    unsupported_strategy: UnsupportedStrategyPolicy,
    #[serde(default)]
    open_position: OpenPositionPolicy,
}

impl BacktestRequest {
    fn backtest_config(&self) -> BacktestConfig {
        let defaults = BacktestConfig::default();
        BacktestConfig {
            initial_capital: self.initial_capital.unwrap_or(defaults.initial_capital),
            commission: self.commission.unwrap_or(defaults.commission),
            unsupported_strategy: self.unsupported_strategy,
            open_position: self.open_position,
        }
    }

    fn query(&self) -> CandleQuery {
        CandleQuery {
            limit: self.limit,
            start_time: self.start_time,
            end_time: self.end_time,
            ..CandleQuery::new(self.symbol.as_str(), self.interval.as_str())
        }
    }
}

/// POST /api/backtest
async fn api_backtest(
    State(state): State<AppState>,
    Json(mut request): Json<BacktestRequest>,
) -> ApiResult {
    let candles = match request.candles.take() {
        Some(mut candles) => {
            candles.sort_by_key(|c| c.time);
            candles.dedup_by_key(|c| c.time);
            candles
        }
        None if request.source == DataSource::File => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "The file source is only available from the CLI; send candles inline instead",
            ));
        }
        None if request.source == DataSource::Demo => {
            demo_candles(&request.query(), request.seed.unwrap_or(DEFAULT_SEED))
                .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("{:#}", e)))?
        }
        None => state
            .market
            .load(
                request.source,
                &request.query(),
                request.seed.unwrap_or(DEFAULT_SEED),
            )
            .await
            .map_err(|e| {
                error!("Candle fetch error: {:#}", e);
                api_error(StatusCode::BAD_GATEWAY, format!("{:#}", e))
            })?,
    };

    let engine = BacktestEngine::new(request.backtest_config());
    let strategy = request.strategy;
    let candle_count = candles.len();

    let outcome = tokio::task::spawn_blocking(move || engine.run(&candles, &strategy))
        .await
        .map_err(|e| {
            error!("Backtest task failed: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Backtest task failed")
        })?;

    match outcome {
        Ok(result) => Ok(Json(serde_json::json!({
            "success": true,
            "symbol": request.symbol,
            "interval": request.interval,
            "candles": candle_count,
            "result": result,
        }))),
        Err(e) => Err(api_error(StatusCode::BAD_REQUEST, e.to_string())),
    }
}

/// GET /api/binance/klines - proxy endpoint for Binance klines
async fn api_binance_klines(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let symbol = params
        .get("symbol")
        .cloned()
        .unwrap_or_else(default_symbol);
    let interval = params
        .get("interval")
        .cloned()
        .unwrap_or_else(|| "15m".to_string());
    let start_time: Option<i64> = params.get("start_time").and_then(|s| s.parse().ok());
    let end_time: Option<i64> = params.get("end_time").and_then(|s| s.parse().ok());
    let limit: Option<u32> = params.get("limit").and_then(|s| s.parse().ok());

    let binance = state.market.binance();
    let result = if let (Some(start), Some(end)) = (start_time, end_time) {
        binance
            .get_candles_paginated(&symbol, &interval, start, end)
            .await
    } else {
        binance
            .get_candles(&symbol, &interval, start_time, end_time, limit)
            .await
    };

    match result {
        Ok(klines) => Ok(Json(serde_json::json!({
            "success": true,
            "symbol": symbol,
            "interval": interval,
            "count": klines.len(),
            "klines": klines,
        }))),
        Err(e) => {
            error!("Binance klines error: {}", e);
            Err(api_error(
                StatusCode::BAD_GATEWAY,
                format!("Failed to fetch klines: {}", e),
            ))
        }
    }
}

#[derive(Deserialize)]
struct SymbolsParams {
    #[serde(default = "default_symbols_limit")]
    limit: usize,
}

fn default_symbols_limit() -> usize {
    50
}

/// GET /api/binance/symbols
async fn api_binance_symbols(
    State(state): State<AppState>,
    Query(params): Query<SymbolsParams>,
) -> ApiResult {
    match state.market.binance().get_usdt_symbols(params.limit).await {
        Ok(symbols) => Ok(Json(serde_json::json!({
            "success": true,
            "count": symbols.len(),
            "symbols": symbols,
        }))),
        Err(e) => {
            error!("Binance symbols error: {}", e);
            Err(api_error(
                StatusCode::BAD_GATEWAY,
                format!("Failed to fetch symbols: {}", e),
            ))
        }
    }
}

#[derive(Deserialize)]
struct PriceParams {
    #[serde(default = "default_symbol")]
    symbol: String,
}

/// GET /api/binance/price
async fn api_binance_price(
    State(state): State<AppState>,
    Query(params): Query<PriceParams>,
) -> ApiResult {
    match state.market.binance().get_current_price(&params.symbol).await {
        Ok(price) => Ok(Json(serde_json::json!({
            "success": true,
            "symbol": params.symbol,
            "price": price,
        }))),
        Err(e) => {
            error!("Binance price error: {}", e);
            Err(api_error(
                StatusCode::BAD_GATEWAY,
                format!("Failed to fetch price: {}", e),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rust_decimal_macros::dec;

    fn test_state() -> AppState {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        AppState {
            market: Arc::new(MarketData::from_config(&config)),
        }
    }

    fn request(body: serde_json::Value) -> BacktestRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_args() {
        let cli = Cli::try_parse_from([
            "tradelog",
            "run",
            "--source",
            "demo",
            "--strategy",
            "rsi",
            "--param",
            "period=7",
            "--param",
            "oversold = 25",
            "--capital",
            "2500",
            "--close-open",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };

        assert_eq!(args.source, DataSource::Demo);
        let strategy = args.trading_strategy();
        assert_eq!(strategy.name, "RSI BTCUSDT");
        assert_eq!(strategy.strategy_type, "RSI");
        assert_eq!(strategy.parameters.get("period"), Some(&7.0));
        assert_eq!(strategy.parameters.get("oversold"), Some(&25.0));

        let config = args.backtest_config();
        assert_eq!(config.initial_capital, dec!(2500));
        assert_eq!(config.commission, dec!(0.001));
        assert_eq!(config.open_position, OpenPositionPolicy::CloseAtLastCandle);
        assert_eq!(config.unsupported_strategy, UnsupportedStrategyPolicy::Reject);
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("fastPeriod=10").unwrap(), ("fastPeriod".to_string(), 10.0));
        assert!(parse_param("fastPeriod").is_err());
        assert!(parse_param("=10").is_err());
        assert!(parse_param("fastPeriod=ten").is_err());
    }

    #[tokio::test]
    async fn test_backtest_demo_source() {
        let body = request(serde_json::json!({
            "source": "demo",
            "limit": 300,
            "strategy": { "name": "Fast cross", "type": "SMA_CROSS", "parameters": { "fastPeriod": 5, "slowPeriod": 20 } },
            "initial_capital": "5000"
        }));

        let Json(json) = api_backtest(State(test_state()), Json(body)).await.unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["candles"], 300);
        assert_eq!(json["result"]["strategy_name"], "Fast cross");
        assert_eq!(json["result"]["initial_capital"], "5000");
    }

    #[tokio::test]
    async fn test_backtest_inline_candles() {
        let candles: Vec<serde_json::Value> = (0..40)
            .map(|i| {
                let price = 100 + i;
                serde_json::json!({
                    "time": 1_000 * (40 - i),
                    "open": price, "high": price, "low": price, "close": price, "volume": 0
                })
            })
            .collect();
        let body = request(serde_json::json!({
            "source": "file",
            "candles": candles,
            "strategy": { "name": "RSI", "type": "RSI" }
        }));

        let Json(json) = api_backtest(State(test_state()), Json(body)).await.unwrap();
        assert_eq!(json["candles"], 40);
        assert_eq!(json["result"]["start_time"], 1_000);
        assert_eq!(json["result"]["end_time"], 40_000);
    }

    #[tokio::test]
    async fn test_backtest_rejections() {
        let unsupported = request(serde_json::json!({
            "source": "demo",
            "strategy": { "name": "Bands", "type": "BOLLINGER" }
        }));
        let (status, Json(json)) = api_backtest(State(test_state()), Json(unsupported))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert!(json["message"].as_str().unwrap().contains("BOLLINGER"));

        let file = request(serde_json::json!({
            "source": "file",
            "strategy": { "name": "RSI", "type": "RSI" }
        }));
        let (status, _) = api_backtest(State(test_state()), Json(file)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let bad_capital = request(serde_json::json!({
            "source": "demo",
            "strategy": { "name": "RSI", "type": "RSI" },
            "initial_capital": "0"
        }));
        let (status, _) = api_backtest(State(test_state()), Json(bad_capital))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_backtest_demo_limits_are_client_errors() {
        let oversized = request(serde_json::json!({
            "source": "demo",
            "limit": 4_000_000_000u32,
            "strategy": { "name": "RSI", "type": "RSI" }
        }));
        let (status, Json(json)) = api_backtest(State(test_state()), Json(oversized))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].as_str().unwrap().contains("limited to"));

        let past_end_of_time = request(serde_json::json!({
            "source": "demo",
            "interval": "1d",
            "limit": 20,
            "start_time": i64::MAX - 10,
            "strategy": { "name": "RSI", "type": "RSI" }
        }));
        let (status, _) = api_backtest(State(test_state()), Json(past_end_of_time))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let bad_interval = request(serde_json::json!({
            "source": "demo",
            "interval": "99999999999999w",
            "strategy": { "name": "RSI", "type": "RSI" }
        }));
        let (status, _) = api_backtest(State(test_state()), Json(bad_interval))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_backtest_hold_all_policy() {
        let body = request(serde_json::json!({
            "source": "demo",
            "strategy": { "name": "Bands", "type": "BOLLINGER" },
            "unsupported_strategy": "hold_all"
        }));
        let Json(json) = api_backtest(State(test_state()), Json(body)).await.unwrap();
        assert_eq!(json["result"]["trades"].as_array().unwrap().len(), 0);
        assert_eq!(json["result"]["metrics"]["total_trades"], 0);
    }

    #[tokio::test]
    async fn test_health_and_strategies() {
        let Json(health) = api_health().await;
        assert_eq!(health["status"], "ok");

        let Json(json) = api_strategies().await;
        let types: Vec<&str> = json["strategies"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|s| s["strategy_type"].as_str())
            .collect();
        assert_eq!(types, vec!["SMA_CROSS", "RSI", "MACD"]);
    }
}
