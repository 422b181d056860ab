// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: Classify colour zones on rendered plan pages
//!
//! Usage:
//!   plan-batch <output_dir> <page_image>... [options]

use anyhow::{bail, Context, Result};
use flatplan_vision::{run_batch, PlanConfig};
use std::env;
use std::path::PathBuf;

fn init_logging(verbose: bool) {
    let default = if verbose { "info,flatplan_vision=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return Ok(());
    }

    let output_dir = PathBuf::from(&args[1]);
    let mut pages: Vec<PathBuf> = Vec::new();
    let mut config_path: Option<PathBuf> = None;
    let mut seed: Option<u64> = None;
    let mut verbose = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let value = args.get(i).context("--config expects a path")?;
                config_path = Some(PathBuf::from(value));
            }
            "--seed" => {
                i += 1;
                let value = args.get(i).context("--seed expects a value")?;
                seed = Some(
                    value
                        .parse()
                        .with_context(|| format!("Invalid seed: {}", value))?,
                );
            }
            "--verbose" | "-v" => {
                verbose = true;
            }
            flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
            page => pages.push(PathBuf::from(page)),
        }
        i += 1;
    }

    if pages.is_empty() {
        bail!("No page images given");
    }

    init_logging(verbose);

    let config = match &config_path {
        Some(path) => PlanConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PlanConfig::default(),
    };
    let seed = seed.unwrap_or(config.zones.seed);

    let summary = run_batch(&pages, &output_dir, &config.zones, seed)
        .with_context(|| format!("Batch into {} failed", output_dir.display()))?;

    for plan in &summary.plans {
        println!(
            "{:>3}  {:<40} main={} balcony={} water={}",
            plan.page_index,
            plan.output_svg,
            plan.main_component_ids.len(),
            plan.balcony_component_ids.len(),
            plan.water_points.len()
        );
    }

    Ok(())
}

fn print_usage() {
    println!(
        r#"Plan Page Zone Classifier
=========================

Finds the room-fill colour of each rendered plan page, classifies its
regions into main area, balconies and wet areas, and writes an SVG overlay
per page plus plan_data.json.

USAGE:
  plan-batch <output_dir> <page_image>... [OPTIONS]

OPTIONS:
  --config <path>           JSON file overriding pipeline thresholds
  --seed <n>                Seed for colour sampling (default: from config)
  -v, --verbose             Debug logging (RUST_LOG overrides)
  -h, --help                Show this help message"#
    );
}
