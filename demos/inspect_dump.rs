// Decode a dump file offline and print decode stats, analysis and stats as JSON.
//
// Usage: cargo run --example inspect_dump -- DUMP_PATH [FORMAT]
//   FORMAT  mp | mdg | mixed (default: detect from content)
// Set CONFIG_FILE to use the pipeline sections of a config file instead of the defaults.

use dumpscope::config::AppConfig;
use dumpscope::models::{DumpFormat, now_millis};
use dumpscope::pipeline::{self, PipelineConfig};
use std::env;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let path = args
        .get(1)
        .ok_or_else(|| anyhow::anyhow!("usage: inspect_dump DUMP_PATH [FORMAT]"))?;
    let declared = args
        .get(2)
        .map(|s| DumpFormat::parse(s).ok_or_else(|| anyhow::anyhow!("unknown format {:?}", s)))
        .transpose()?;

    let config = match env::var("CONFIG_FILE") {
        Ok(_) => AppConfig::load()?.pipeline(),
        Err(_) => PipelineConfig::default(),
    };

    let bytes = std::fs::read(path)?;
    let processed = pipeline::process(&bytes, declared, &config, now_millis())?;

    let report = serde_json::json!({
        "decodeStats": processed.decode_stats,
        "analysis": processed.analysis,
        "stats": processed.stats,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
