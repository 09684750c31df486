use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use sourcing_pricing::{
    config::{self, AppConfig},
    errors::ErrorResponse,
    models::{BulkPurchaseOrder, Currency, Milestone, PurchaseOrder},
    services::{CheckoutService, CheckoutSummary, DepositQuote, PricingService},
    CachedFeeSchedules, Money, PricingError, StaticFeeSchedules,
};
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let app_config = config::load_config().context("failed to load configuration")?;
    config::init_tracing(app_config.log_level(), app_config.log_json);

    let context = CliContext::initialize(&app_config)?;
    let json = cli.json;
    let outcome = match cli.command {
        Commands::Sample { path } => handle_sample(&context, &path, json),
        Commands::Bulk { path } => handle_bulk(&context, &path, json),
        Commands::Deposit { path, amount } => handle_deposit(&context, &path, amount, json),
        Commands::Checkout {
            currency,
            samples,
            bulks,
        } => handle_checkout(&context, currency, &samples, &bulks, json),
    };

    match outcome {
        Err(CommandError::Pricing(err)) if json => {
            print_json(&ErrorResponse::from(&err))?;
            Err(anyhow!(err))
        }
        Err(CommandError::Pricing(err)) => Err(anyhow!(err)),
        Err(CommandError::Other(err)) => Err(err),
        Ok(()) => Ok(()),
    }
}

#[derive(Parser)]
#[command(
    name = "price-order",
    about = "Recompute sample and bulk order pricing from order JSON files",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a sample order
    Sample { path: PathBuf },
    /// Recompute the milestone ladder of a bulk order
    Bulk { path: PathBuf },
    /// Quote a card-paid deposit for a bulk order
    Deposit {
        path: PathBuf,
        #[arg(long)]
        amount: Decimal,
    },
    /// Sum what is due now across several orders
    Checkout {
        /// Defaults to the currency of the first order
        #[arg(long)]
        currency: Option<Currency>,
        #[arg(long = "sample", value_name = "PATH")]
        samples: Vec<PathBuf>,
        #[arg(long = "bulk", value_name = "PATH")]
        bulks: Vec<PathBuf>,
    },
}

/// Keeps pricing failures typed so `--json` can render their error body.
enum CommandError {
    Pricing(PricingError),
    Other(anyhow::Error),
}

impl From<PricingError> for CommandError {
    fn from(err: PricingError) -> Self {
        CommandError::Pricing(err)
    }
}

impl From<anyhow::Error> for CommandError {
    fn from(err: anyhow::Error) -> Self {
        CommandError::Other(err)
    }
}

type CommandResult = std::result::Result<(), CommandError>;

struct CliContext {
    pricing: PricingService,
}

impl CliContext {
    fn initialize(app_config: &AppConfig) -> Result<Self> {
        let schedules =
            StaticFeeSchedules::from_config(app_config).context("invalid fee schedules")?;
        debug!(count = schedules.len(), "fee schedules ready");
        let pricing = PricingService::new(Arc::new(CachedFeeSchedules::new(schedules)));
        Ok(Self { pricing })
    }

    fn checkout_service(&self) -> CheckoutService {
        CheckoutService::new(self.pricing.clone())
    }
}

fn read_order<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn handle_sample(context: &CliContext, path: &Path, json: bool) -> CommandResult {
    let mut order: PurchaseOrder = read_order(path)?;
    context.pricing.update_sample_prices(&mut order)?;

    if json {
        print_json(&order)?;
    } else {
        render_sample(&order);
    }
    Ok(())
}

fn handle_bulk(context: &CliContext, path: &Path, json: bool) -> CommandResult {
    let mut order: BulkPurchaseOrder = read_order(path)?;
    context.pricing.update_bulk_prices(&mut order)?;

    if json {
        print_json(&order)?;
    } else {
        render_bulk(&order);
    }
    Ok(())
}

fn handle_deposit(context: &CliContext, path: &Path, amount: Decimal, json: bool) -> CommandResult {
    let order: BulkPurchaseOrder = read_order(path)?;
    let quote = context.pricing.quote_deposit(&order, Money::new(amount))?;

    if json {
        print_json(&quote)?;
    } else {
        render_deposit(&quote, order.currency);
    }
    Ok(())
}

fn handle_checkout(
    context: &CliContext,
    currency: Option<Currency>,
    sample_paths: &[PathBuf],
    bulk_paths: &[PathBuf],
    json: bool,
) -> CommandResult {
    let samples = sample_paths
        .iter()
        .map(|path| read_order::<PurchaseOrder>(path))
        .collect::<Result<Vec<_>>>()?;
    let bulks = bulk_paths
        .iter()
        .map(|path| read_order::<BulkPurchaseOrder>(path))
        .collect::<Result<Vec<_>>>()?;

    let currency = currency
        .or_else(|| samples.first().map(|order| order.currency))
        .or_else(|| bulks.first().map(|order| order.currency))
        .ok_or_else(|| anyhow!("pass at least one --sample or --bulk order"))?;

    let summary = context
        .checkout_service()
        .summarize(currency, &samples, &bulks)?;

    if json {
        print_json(&summary)?;
    } else {
        render_checkout(&summary);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fmt_opt(amount: Option<Money>, currency: Currency) -> String {
    amount
        .map(|value| value.format(currency))
        .unwrap_or_else(|| "-".to_string())
}

fn render_sample(order: &PurchaseOrder) {
    let c = order.currency;
    let pricing = &order.pricing;
    println!("Sample order {} ({})", order.id, c);
    println!("  sub-total        {}", fmt_opt(pricing.sub_total, c));
    println!("  shipping         {}", fmt_opt(pricing.shipping_fee, c));
    println!("  tax              {}", fmt_opt(pricing.tax, c));
    println!("  transaction fee  {}", fmt_opt(pricing.transaction_fee, c));
    println!("  total            {}", fmt_opt(pricing.total_price, c));
}

fn render_bulk(order: &BulkPurchaseOrder) {
    let c = order.currency;
    let pricing = &order.pricing;
    println!("Bulk order {} ({})", order.id, c);
    println!(
        "  sub-total {} • after deduction {} • shipping {}",
        fmt_opt(pricing.sub_total, c),
        fmt_opt(pricing.sub_total_after_deduction, c),
        fmt_opt(pricing.shipping_fee, c)
    );
    for milestone in [Milestone::FirstPayment, Milestone::FinalPayment] {
        let step = match milestone {
            Milestone::FirstPayment => &order.first_payment,
            _ => &order.final_payment,
        };
        println!(
            "  • {} {} (goods {}, tax {}, fee {}){}",
            milestone,
            fmt_opt(step.total, c),
            fmt_opt(step.sub_total, c),
            fmt_opt(step.tax, c),
            fmt_opt(step.transaction_fee, c),
            if order.is_milestone_paid(milestone) { " paid" } else { "" }
        );
    }
    if let Some(paid) = order.deposit.paid_amount {
        println!("  • deposit paid {}", paid.format(c));
    }
    println!("  total {}", fmt_opt(pricing.total_price, c));
    if let Some(next) = order.next_payable_milestone() {
        println!("  next payable: {}", next);
    }
}

fn render_deposit(quote: &DepositQuote, currency: Currency) {
    println!(
        "Deposit {} + card fee {} = {} ({} minor units)",
        quote.amount.format(currency),
        quote.transaction_fee.format(currency),
        quote.total.format(currency),
        quote.total_minor_units
    );
}

fn render_checkout(summary: &CheckoutSummary) {
    let c = summary.currency;
    println!("Checkout ({} order(s))", summary.lines.len());
    for line in &summary.lines {
        match line.milestone {
            Some(milestone) => println!(
                "- {} order {} • {} • {}",
                line.kind,
                line.order_id,
                milestone,
                line.amount.format(c)
            ),
            None => println!("- {} order {} • {}", line.kind, line.order_id, line.amount.format(c)),
        }
    }
    println!(
        "Amount due {} ({} minor units)",
        summary.amount_due.format(c),
        summary.amount_due_minor_units
    );
}
