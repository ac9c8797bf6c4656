use salary_management_api::infra::logging::init_tracing;
use salary_management_api::{AppConfig, DatabaseService};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--apply-schema]\n\
         \n\
         Requires env vars:\n\
           DATABASE_URL\n\
         Optional:\n\
           BIND_ADDR, DB_MAX_CONNECTIONS, DB_ACQUIRE_TIMEOUT_SECS,\n\
           QUERY_ALLOWED_KEYWORDS, QUERY_MAX_STATEMENT_CHARS, QUERY_MAX_ROWS, QUERY_TIMEOUT_MS\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let apply_schema = args.iter().any(|a| a == "--apply-schema");

    // Force-read config (nice error messages if missing or malformed)
    let config = AppConfig::from_env()?;

    println!("> Preflight:");
    println!("  BIND_ADDR={}", config.bind_addr);
    println!("  DB_MAX_CONNECTIONS={}", config.database.max_connections);
    println!(
        "  QUERY_ALLOWED_KEYWORDS={}",
        config.gateway.allowed_keywords.join(",")
    );
    println!("  QUERY_MAX_STATEMENT_CHARS={}", config.gateway.max_statement_chars);
    println!("  QUERY_MAX_ROWS={}", config.gateway.max_rows);
    println!("  QUERY_TIMEOUT_MS={}", config.gateway.timeout.as_millis());

    let db_service = DatabaseService::connect(&config.database).await?;

    let version: String = sqlx::query_scalar("SELECT version()")
        .fetch_one(db_service.pool())
        .await?;
    println!("  Database: {}", version);

    let mut missing = db_service.missing_tables().await?;
    if !missing.is_empty() && apply_schema {
        println!("  Missing tables {:?} -> applying schema...", missing);
        db_service.apply_schema().await?;
        missing = db_service.missing_tables().await?;
    }

    db_service.close().await;

    if !missing.is_empty() {
        return Err(anyhow::anyhow!(
            "Managed tables are missing: {}. Re-run with --apply-schema",
            missing.join(", ")
        ));
    }

    println!("  Managed tables present.");
    println!("> Preflight OK.");
    Ok(())
}
