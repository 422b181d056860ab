// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: Extract an `apartment.v1` plan document from a floor plan image
//!
//! Usage:
//!   plan-to-json <image_path> [options]

use anyhow::{bail, Context, Result};
use flatplan_vision::{extract_plan_from_path, PlanConfig};
use std::env;
use std::fs;
use std::path::PathBuf;

struct Options {
    image_path: PathBuf,
    config_path: Option<PathBuf>,
    reference_mm: Option<f64>,
    reference_px: Option<f64>,
    output_path: Option<PathBuf>,
    with_zones: bool,
    seed: Option<u64>,
    verbose: bool,
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> Result<T> {
    let raw = args
        .get(i)
        .with_context(|| format!("{} expects a value", flag))?;
    raw.parse()
        .map_err(|_| anyhow::anyhow!("Invalid value for {}: {}", flag, raw))
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options {
        image_path: PathBuf::from(&args[1]),
        config_path: None,
        reference_mm: None,
        reference_px: None,
        output_path: None,
        with_zones: false,
        seed: None,
        verbose: false,
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                options.config_path = Some(parse_value::<String>(args, i, "--config")?.into());
            }
            "--reference-mm" => {
                i += 1;
                options.reference_mm = Some(parse_value(args, i, "--reference-mm")?);
            }
            "--reference-px" => {
                i += 1;
                options.reference_px = Some(parse_value(args, i, "--reference-px")?);
            }
            "--output" => {
                i += 1;
                options.output_path = Some(parse_value::<String>(args, i, "--output")?.into());
            }
            "--with-zones" => {
                options.with_zones = true;
            }
            "--seed" => {
                i += 1;
                options.seed = Some(parse_value(args, i, "--seed")?);
            }
            "--verbose" | "-v" => {
                options.verbose = true;
            }
            other => bail!("Unknown option: {}", other),
        }
        i += 1;
    }

    Ok(options)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info,flatplan_vision=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return Ok(());
    }

    let options = parse_args(&args)?;
    init_logging(options.verbose);

    let mut config = match &options.config_path {
        Some(path) => PlanConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PlanConfig::default(),
    };
    if let Some(mm) = options.reference_mm {
        config.calibration.reference_mm = mm;
    }
    if let Some(px) = options.reference_px {
        config.calibration.reference_px = px;
    }
    if let Some(seed) = options.seed {
        config.zones.seed = seed;
    }
    config.enrich_water_points |= options.with_zones;

    let plan = extract_plan_from_path(&options.image_path, &config)
        .with_context(|| format!("Failed to extract plan from {}", options.image_path.display()))?;
    let json = plan.to_json_pretty()?;

    match &options.output_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(output = %path.display(), "Saved plan");
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn print_usage() {
    println!(
        r#"Floor Plan to JSON
==================

Extracts the apartment outline, windows, balcony door and balcony from a
line-art floor plan image and writes an apartment.v1 JSON document.

USAGE:
  plan-to-json <image_path> [OPTIONS]

ARGUMENTS:
  <image_path>              Path to floor plan image (PNG, JPEG)

OPTIONS:
  --config <path>           JSON file overriding pipeline thresholds
  --reference-mm <mm>       Known length in millimetres (default: 1410)
  --reference-px <px>       Same length measured in pixels (default: 166)
  --output <path>           Output JSON path (default: stdout)
  --with-zones              Classify colour zones and emit water points
  --seed <n>                Seed for colour sampling (default: 0)
  -v, --verbose             Debug logging (RUST_LOG overrides)
  -h, --help                Show this help message

EXAMPLE:
  plan-to-json plan_7_1.png --reference-mm 1410 --reference-px 166 \
    --output out/plan_7_1.json"#
    );
}
