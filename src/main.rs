use shopforge::config::{database, generator::load_or_default};
use shopforge::core::report;
use shopforge::errors::Result;
use shopforge::{generator, schema};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal when absent
    dotenvy::dotenv().ok();

    // 3. Generator configuration, falling back to built-in defaults
    let config = load_or_default("config.toml")?;

    // 4. Connect and define the schema
    let db = database::create_connection().await?;
    schema::define_schema(&db).await?;

    // 5. Populate and reconcile
    let outcome = generator::populate(&db, &config).await?;
    info!(
        "Dataset ready: {} users, {} products, {} orders, {} reviews ({} duplicates skipped)",
        outcome.users_created,
        outcome.products_created,
        outcome.orders_created,
        outcome.reviews_created,
        outcome.reviews_skipped
    );

    // 6. Render the read-only views
    println!("=== CATEGORIES ===");
    print!("{}", report::render_category_tree(&db).await?);

    println!("\n=== TOP RATED PRODUCTS ===");
    print!(
        "{}",
        report::render_table(&report::top_rated_products(&db, 5).await?)
    );

    println!("\n=== RECENT ORDERS ===");
    print!(
        "{}",
        report::render_table(&report::recent_orders(&db, 5).await?)
    );

    println!("\n=== LATEST REVIEWS ===");
    print!(
        "{}",
        report::render_table(&report::review_listing(&db, 5).await?)
    );

    println!("\n=== SALES BY CATEGORY ===");
    print!(
        "{}",
        report::render_table(&report::sales_by_category(&db).await?)
    );

    println!("\n=== REVENUE BY MONTH ===");
    print!(
        "{}",
        report::render_table(&report::revenue_by_month(&db).await?)
    );

    println!("\n=== STATISTICS ===");
    let statistics = report::store_statistics(&db).await?;
    print!("{}", report::render_table(&statistics.to_rows()));

    Ok(())
}
