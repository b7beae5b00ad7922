use anyhow::Result;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use banner_tracker::{run_rebuild, TrackerConfig};

/// Optional config file picked up from the working directory
const CONFIG_PATH: &str = "tracker.json";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("🗄️  Banner Tracker - Store Rebuild");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = TrackerConfig::load_or_default(Path::new(CONFIG_PATH))?;
    println!(
        "✓ Store: {:?} (policy: {})",
        config.db_path,
        config.rebuild_policy.name()
    );

    match run_rebuild(&config) {
        Ok(summary) => {
            println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!("🎉 Store rebuilt!");
            println!(
                "✓ {} tracked characters, {} banner appearances ({} raw records fetched)",
                summary.tracked_characters, summary.appearances, summary.raw_characters
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("\n❌ Rebuild failed: {}", e);
            if config.rebuild_policy == banner_tracker::RebuildPolicy::InPlace {
                eprintln!("   The previous store contents were left untouched.");
            }
            std::process::exit(1);
        }
    }
}
