use std::collections::VecDeque;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;
use zt_search::{ZoSearch, ZoSearchConfig};
use zt_types::{Configuration, DimensionSpec, TrialMetrics};

/// Synthetic objective: a shifted bowl with a penalty on the discrete knob.
fn objective(config: &Configuration) -> f64 {
    let height = config.get("height").map(|v| v.as_f64()).unwrap_or(0.0);
    let width = config.get("width").map(|v| v.as_f64()).unwrap_or(0.0);
    (height - 3.0).powi(2) + 0.5 * (width + 2.0).abs()
}

fn default_config() -> ZoSearchConfig {
    let dimensions = DimensionSpec::new()
        .add_continuous("height", -10.0, 10.0, 1e-2)
        .add_discrete("width", -10, 10, true);

    ZoSearchConfig::new(120, dimensions)
        .with_max_concurrent(4)
        .with_objective("mean_loss", "min")
        .with_seed(42)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ZoSearchConfig::from_json_file(path)?,
        None => default_config(),
    };
    let metric = config.metric.clone();
    let mut search = ZoSearch::new(config)?;

    // In-flight trials complete in submission order.
    let mut running: VecDeque<(String, Configuration)> = VecDeque::new();
    let mut next_trial = 0usize;

    loop {
        let trial_id = format!("trial_{next_trial:04}");
        match search.suggest(&trial_id)? {
            Some(config) => {
                running.push_back((trial_id, config));
                next_trial += 1;
            }
            None => {
                let Some((trial_id, config)) = running.pop_front() else {
                    break;
                };
                let result = TrialMetrics::from([(metric.clone(), objective(&config))]);
                search.on_trial_complete(&trial_id, Some(&result), false, false)?;
            }
        }
    }

    if let Ok(path) = std::env::var("ZT_CHECKPOINT") {
        search.save(&PathBuf::from(path))?;
    }

    info!(
        trials = next_trial,
        finished = search.is_finished(),
        "Search finished"
    );
    match search.best_configuration() {
        Some(best) => println!("best configuration: {best}"),
        None => println!("no trial completed"),
    }
    Ok(())
}
