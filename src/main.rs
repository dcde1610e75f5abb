//! Entry point. Wires config -> universe -> recommendations, and the stored
//! ledger -> valuation summary.

use std::fs;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use screener_ledger::config::AppConfig;
use screener_ledger::recommend::recommend;
use screener_ledger::session::ViewState;
use screener_ledger::store::FileStore;
use screener_ledger::valuation::{holding_rows, summarize, PriceBook};
use screener_ledger::{export, Ledger, Universe};

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cfg_path = std::env::var("SCREENER_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let cfg = match AppConfig::load(&cfg_path) {
        Ok(c) => c,
        Err(e) => {
            warn!("config unavailable ({e:#}), using defaults");
            AppConfig::default()
        }
    };

    let raw = fs::read_to_string(&cfg.universe.path)
        .with_context(|| format!("read universe {}", cfg.universe.path.display()))?;
    let universe: Universe = serde_json::from_str(&raw).context("parse universe json")?;
    info!(
        "Loaded {} markets ({} securities), rule set {:?}",
        universe.len(),
        universe.values().map(Vec::len).sum::<usize>(),
        cfg.recommend.rule_set
    );

    let roles = cfg.universe.roles();
    for (market, picks) in recommend(&universe, &roles, &cfg.recommend.rules()) {
        if picks.is_empty() {
            info!("[{market}] no candidates");
        }
        for c in picks {
            info!(
                "[{}] {} {} price/ATH={:?} green={}",
                market, c.ticker, c.name, c.price_to_ath, c.green_cells
            );
        }
    }

    if let Some(path) = &cfg.export.path {
        let rows = ViewState::new(roles.primary.clone()).rows(&universe);
        export::export_to_path(&rows, path)?;
        info!("Exported {} rows to {}", rows.len(), path.display());
    }

    let store = FileStore::new(cfg.state.resolve_dir()?);
    let ledger = Ledger::new(store, cfg.fees.clone());
    let st = ledger.snapshot();
    let prices = PriceBook::from_universe(&universe);

    for row in holding_rows(&st.positions, &prices, ledger.fees()) {
        info!(
            "HOLD {} {} @ {:.2} now {:.2} -> {:+.2} ({:+.2}%)",
            row.ticker, row.quantity, row.avg_price, row.current_price, row.unrealized, row.unrealized_rate
        );
    }
    let summary = summarize(&st.positions, &st.history, &prices, ledger.fees());
    for (label, b) in [("domestic", summary.domestic), ("foreign", summary.foreign)] {
        info!(
            "{label}: eval {:.2}, cost {:.2}, unrealized {:+.2} ({:+.2}%), realized {:+.2}",
            b.evaluation, b.cost, b.unrealized, b.unrealized_rate, b.realized
        );
    }

    Ok(())
}
