use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::env;
use tracing_subscriber::EnvFilter;

use finapp_client::{
    AppSession, CategoryType, ClientConfig, CreationStatus, NewTransaction, SeedOutcome,
};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    match command {
        "login" => run_login(&args).await?,
        "categories" => run_categories().await?,
        "seed" => run_seed().await?,
        "transactions" => run_transactions().await?,
        "add-transaction" => run_add_transaction(&args).await?,
        _ => print_usage(),
    }

    Ok(())
}

fn print_usage() {
    println!("💰 FinApp Analytics CLI v{}", finapp_client::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Usage:");
    println!("  finapp login <email> [--print-token]  (password from FINAPP_PASSWORD)");
    println!("  finapp categories");
    println!("  finapp seed");
    println!("  finapp transactions");
    println!("  finapp add-transaction <descricao> <valor> <YYYY-MM-DD> <despesa|receita> [categoria_id]");
    println!();
    println!("Authenticated commands read the token from FINAPP_ACCESS_TOKEN.");
}

/// Session from FINAPP_* variables, with FINAPP_ACCESS_TOKEN if present
fn open_session() -> Result<AppSession> {
    let config = ClientConfig::from_env();

    let session = match env::var("FINAPP_ACCESS_TOKEN") {
        Ok(token) if !token.trim().is_empty() => AppSession::with_token(config, token.trim()),
        _ => AppSession::new(config),
    }
    .context("Failed to create session")?;

    println!("🌐 Backend: {}", session.api().client().base_url());
    Ok(session)
}

fn require_token(session: &AppSession) -> Result<()> {
    if !session.is_authenticated() {
        bail!("Not logged in. Run `finapp login <email> --print-token` and export FINAPP_ACCESS_TOKEN");
    }
    Ok(())
}

async fn run_login(args: &[String]) -> Result<()> {
    let email = args.get(2).context("Missing <email>")?;
    let password = env::var("FINAPP_PASSWORD").context("FINAPP_PASSWORD is not set")?;

    let session = open_session()?;

    println!("\n🔑 Logging in as {}...", email);
    let outcome = session
        .login(email, &password)
        .await
        .context("Login failed")?;
    println!("✓ Logged in");

    print_seed_outcome(&outcome);

    // The token is a live credential: only on request, and never on stdout
    match session.tokens().get_token() {
        Some(token) if wants_token_export(args) => {
            eprintln!("⚠️  This is a live access token, do not share or log it");
            eprintln!("   export FINAPP_ACCESS_TOKEN={}", token);
        }
        Some(_) => println!("   (pass --print-token to get an export line for FINAPP_ACCESS_TOKEN)"),
        None => {}
    }

    Ok(())
}

/// `--print-token` anywhere after `login <email>`
fn wants_token_export(args: &[String]) -> bool {
    args.iter().skip(3).any(|arg| arg == "--print-token")
}

async fn run_categories() -> Result<()> {
    let session = open_session()?;
    require_token(&session)?;

    println!("\n📂 Loading categories...");
    let categories = session
        .api()
        .list_categories()
        .await
        .context("Failed to list categories")?;

    for category in &categories {
        println!(
            "  {:<8} {:<24} {}",
            category.category_type.as_str(),
            category.name,
            category.color.as_deref().unwrap_or("-")
        );
    }
    println!("✓ {} categories", categories.len());

    Ok(())
}

async fn run_seed() -> Result<()> {
    let session = open_session()?;
    require_token(&session)?;

    println!("\n🌱 Ensuring predefined categories...");
    let outcome = session
        .seeder()
        .ensure_predefined_categories()
        .await
        .context("Seeding failed")?;

    print_seed_outcome(&outcome);
    Ok(())
}

fn print_seed_outcome(outcome: &SeedOutcome) {
    match outcome {
        SeedOutcome::Completed(report) => {
            for result in &report.results {
                match &result.status {
                    CreationStatus::Created => println!("  ✓ {} created", result.name),
                    CreationStatus::AlreadyExisted => println!("  = {} already existed", result.name),
                    CreationStatus::Failed { reason } => {
                        println!("  ❌ {} failed: {}", result.name, reason)
                    }
                }
            }
            println!("✓ {}", report.summary());
        }
        SeedOutcome::ListingFailed(status) => {
            println!("⚠️  Could not list categories ({}), nothing seeded", status)
        }
        SeedOutcome::NoCredential => println!("⚠️  No access token, nothing seeded"),
        SeedOutcome::AlreadyInitialized | SeedOutcome::AlreadyRunning => {
            println!("✓ Categories already handled in this session")
        }
    }
}

async fn run_transactions() -> Result<()> {
    let session = open_session()?;
    require_token(&session)?;

    println!("\n📊 Loading transactions...");
    let transactions = session
        .api()
        .list_transactions()
        .await
        .context("Failed to list transactions")?;

    let mut balance = 0.0;
    for tx in &transactions {
        balance += tx.signed_amount();
        println!(
            "  {}  {:>12.2}  {}",
            tx.date,
            tx.signed_amount(),
            tx.description
        );
    }

    println!("✓ {} transactions, balance {:.2}", transactions.len(), balance);
    Ok(())
}

async fn run_add_transaction(args: &[String]) -> Result<()> {
    if args.len() < 6 {
        bail!("Usage: finapp add-transaction <descricao> <valor> <YYYY-MM-DD> <despesa|receita> [categoria_id]");
    }

    let amount: f64 = args[3]
        .replace(',', ".")
        .parse()
        .with_context(|| format!("Invalid amount: {}", args[3]))?;
    let date = NaiveDate::parse_from_str(&args[4], "%Y-%m-%d")
        .with_context(|| format!("Invalid date: {}", args[4]))?;
    let kind: CategoryType = args[5].parse().map_err(anyhow::Error::msg)?;

    let mut payload =
        NewTransaction::new(args[2].clone(), amount, date, kind).map_err(anyhow::Error::msg)?;
    if let Some(category_id) = args.get(6) {
        payload = payload.with_category(category_id.clone());
    }

    let session = open_session()?;
    require_token(&session)?;

    println!("\n💾 Creating transaction...");
    let created = session
        .api()
        .create_transaction(&payload)
        .await
        .context("Failed to create transaction")?;

    println!(
        "✓ Created {} ({} {:.2})",
        created.id.as_deref().unwrap_or("?"),
        created.transaction_type,
        created.amount
    );
    Ok(())
}
