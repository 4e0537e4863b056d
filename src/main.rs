use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use selforder::application::engine::{
    CheckoutRequest, DEFAULT_HISTORY_LIMIT, EngineSettings, OrderEngine, PaymentRequest,
};
use selforder::config::{AppConfig, LoadOptions};
use selforder::domain::menu::MenuItem;
use selforder::domain::money::{Currency, Money};
use selforder::domain::order::{OrderId, OrderLine};
use selforder::domain::payment::PaymentMethod;
use selforder::domain::ports::OrderStoreBox;
use selforder::domain::promotion::Promotion;
use selforder::infrastructure::in_memory::{
    InMemoryCatalog, InMemoryOrderStore, InMemoryPromotionStore, InMemorySessionStore,
};
#[cfg(feature = "storage-rocksdb")]
use selforder::infrastructure::rocksdb::RocksDBStore;
use selforder::interfaces::agent::build_executor;
use selforder::interfaces::csv::menu_reader::MenuReader;
use selforder::interfaces::csv::promotion_reader::PromotionReader;
use selforder::interfaces::tools::ToolCall;
use selforder::interfaces::tools::order_tools::order_tools;
use selforder::telemetry::init_logging;
use serde_json::{Value, json};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

#[derive(Parser)]
#[command(name = "selforder", author, version, about, long_about = None)]
struct Cli {
    /// TOML config file. Defaults to ./selforder.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Menu CSV (`id,name,price,category,available`)
    #[arg(long, global = true)]
    menu: Option<PathBuf>,

    /// Promotions CSV (`promo_code,discount_percent,min_order_amount,valid_until,active`)
    #[arg(long, global = true)]
    promos: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, orders and payments use RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the menu
    Menu,
    /// Price and save an order, optionally paying for it straight away
    Checkout {
        /// Line as ITEM_ID=QUANTITY, repeatable
        #[arg(long = "item", value_parser = parse_line, required = true)]
        items: Vec<OrderLine>,
        #[arg(long)]
        promo: Option<String>,
        #[arg(long)]
        customer: Option<String>,
        /// Caller-chosen id; re-running with the same id returns the stored order
        #[arg(long)]
        order_id: Option<OrderId>,
        #[arg(long)]
        pay: Option<PaymentMethod>,
    },
    /// Show a saved order
    Order { order_id: OrderId },
    /// Pay a pending order in full
    Pay {
        order_id: OrderId,
        #[arg(long)]
        amount: Money,
        #[arg(long)]
        method: PaymentMethod,
        #[arg(long, value_parser = parse_currency)]
        currency: Option<Currency>,
    },
    /// Most recent orders for a customer name or email
    History {
        customer: String,
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },
    /// Run one agent tool with JSON arguments
    Tool { name: String, args: Option<String> },
    /// Send a free-form prompt to the agent
    Ask { prompt: String },
}

fn parse_line(raw: &str) -> std::result::Result<OrderLine, String> {
    let (item_id, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ITEM_ID=QUANTITY, got `{raw}`"))?;
    let quantity: i64 = quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity in `{raw}`"))?;
    OrderLine::new(item_id.trim(), quantity).map_err(|e| e.to_string())
}

fn parse_currency(raw: &str) -> std::result::Result<Currency, String> {
    Currency::new(raw).map_err(|e| e.to_string())
}

fn load_menu(path: Option<&Path>) -> Result<InMemoryCatalog> {
    let Some(path) = path else {
        return Ok(InMemoryCatalog::new());
    };
    let file = File::open(path).into_diagnostic()?;
    let items: Vec<MenuItem> = MenuReader::new(file)
        .items()
        .filter_map(|result| match result {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(event_name = "seed.skipped", source = "menu", error = %e, "skipping menu row");
                None
            }
        })
        .collect();
    Ok(InMemoryCatalog::with_items(items))
}

fn load_promotions(path: Option<&Path>) -> Result<InMemoryPromotionStore> {
    let Some(path) = path else {
        return Ok(InMemoryPromotionStore::new());
    };
    let file = File::open(path).into_diagnostic()?;
    let promotions: Vec<Promotion> = PromotionReader::new(file)
        .promotions()
        .filter_map(|result| match result {
            Ok(promotion) => Some(promotion),
            Err(e) => {
                warn!(event_name = "seed.skipped", source = "promotions", error = %e, "skipping promotion row");
                None
            }
        })
        .collect();
    Ok(InMemoryPromotionStore::with_promotions(promotions))
}

fn order_store(db_path: Option<&Path>) -> Result<OrderStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = RocksDBStore::open(path).into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryOrderStore::new()))
        }
        None => Ok(Box::new(InMemoryOrderStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config.clone(),
    })
    .into_diagnostic()?;
    init_logging(&config.logging);

    let engine = Arc::new(OrderEngine::new(
        Box::new(load_menu(cli.menu.as_deref())?),
        Box::new(load_promotions(cli.promos.as_deref())?),
        order_store(cli.db_path.as_deref())?,
        Box::new(InMemorySessionStore::new()),
        EngineSettings::from(&config),
    ));

    let output = run(cli.command, engine, &config).await?;
    println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
    Ok(())
}

async fn run(command: Command, engine: Arc<OrderEngine>, config: &AppConfig) -> Result<Value> {
    let output = match command {
        Command::Menu => json!({ "items": engine.menu().await.into_diagnostic()? }),
        Command::Checkout {
            items,
            promo,
            customer,
            order_id,
            pay,
        } => {
            let mut request = CheckoutRequest::new(items);
            if let Some(code) = promo {
                request = request.with_promotion(code);
            }
            if let Some(customer) = customer {
                request = request.for_customer(customer);
            }
            if let Some(order_id) = order_id {
                request = request.with_order_id(order_id);
            }
            let order = engine.aggregate(request).await.into_diagnostic()?;

            match pay {
                Some(method) => {
                    let payment = engine
                        .confirm_payment(PaymentRequest {
                            order_id: order.id,
                            amount: order.total,
                            currency: order.currency.clone(),
                            method,
                        })
                        .await
                        .into_diagnostic()?;
                    let order = engine.get_order(order.id).await.into_diagnostic()?;
                    json!({ "order": order, "payment": payment })
                }
                None => json!({ "order": order }),
            }
        }
        Command::Order { order_id } => {
            json!({ "order": engine.get_order(order_id).await.into_diagnostic()? })
        }
        Command::Pay {
            order_id,
            amount,
            method,
            currency,
        } => {
            let currency = currency.unwrap_or_else(|| engine.settings().currency.clone());
            let payment = engine
                .confirm_payment(PaymentRequest {
                    order_id,
                    amount,
                    currency,
                    method,
                })
                .await
                .into_diagnostic()?;
            json!({ "payment": payment })
        }
        Command::History { customer, limit } => {
            let orders = engine
                .order_history(&customer, limit)
                .await
                .into_diagnostic()?;
            json!({ "orders": orders })
        }
        Command::Tool { name, args } => {
            let args = match args {
                Some(raw) => serde_json::from_str(&raw).into_diagnostic()?,
                None => Value::Null,
            };
            let executor = build_executor(&config.agent, Arc::new(order_tools(engine)), None);
            executor.execute(&ToolCall::new(name, args)).await
        }
        Command::Ask { prompt } => {
            let executor = build_executor(&config.agent, Arc::new(order_tools(engine)), None);
            let response = executor.respond(&prompt).await.into_diagnostic()?;
            json!({
                "agent": &executor.profile().name,
                "executor": executor.kind(),
                "response": response,
            })
        }
    };
    Ok(output)
}
