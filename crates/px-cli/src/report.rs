//! Report driver: turns a container snapshot into stack artifacts and
//! tables for one run.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use px_pileup::{
    aggregate_region, find_modules, load_pileup_reference, open_clean, remap_to_pileup,
    spread_at, spread_by_eta, EtaSpreadConfig, RegionConfig, RemapConfig, SpreadConfig, VetoSet,
};
use px_store::{MemoryStore, SeriesStore};
use px_viz::{SeriesStack, StackConfig};

use crate::{RemapArgs, StoreArgs};

/// Detector regions reported by default.
pub(crate) fn default_regions() -> Vec<String> {
    ["B0", "B1", "B2", "ECA", "ECC"].map(String::from).to_vec()
}

/// Visible lumi-block range of the vs-lumi stacks.
const LB_VIEW_MAX: f64 = 1200.0;
/// Tick divisions for the pile-up axis.
const MU_TICKS: u32 = 210;
/// Tick divisions for the lumi-block axis; don't cram the x axis.
const LB_TICKS: u32 = 508;

/// The two reported occupancy flavors: series-name infix and y title.
const KINDS: [(&str, &str, &str); 2] = [
    ("Errors", "Average error bandwidth usage", "avg_bitstr_occ_errors"),
    ("Tot", "Average bandwidth usage", "avg_bitstr_occ"),
];

#[derive(Debug, Serialize)]
struct ReportMeta {
    tool: String,
    tool_version: String,
    created_unix_ms: u128,
    run: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fill: Option<String>,
}

impl ReportMeta {
    fn new(run: &str, fill: Option<String>) -> Self {
        let created_unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Self {
            tool: "pixband".into(),
            tool_version: env!("CARGO_PKG_VERSION").into(),
            created_unix_ms,
            run: run.to_string(),
            fill,
        }
    }
}

/// Open the snapshot and check that the run directory exists before
/// any pipeline work happens.
fn open_validated(store_args: &StoreArgs) -> Result<(MemoryStore, String)> {
    let store = MemoryStore::from_json_path(&store_args.input)
        .with_context(|| format!("open snapshot {}", store_args.input.display()))?;
    let prefix = run_prefix(&store_args.run);
    if !store.has_group(&prefix) {
        bail!("Directory {prefix} does not exist. Check run number");
    }
    Ok((store, prefix))
}

fn run_prefix(run: &str) -> String {
    format!("run_{run}/Pixel/")
}

fn remap_config(args: &RemapArgs) -> RemapConfig {
    RemapConfig {
        pu_min: args.pu_min,
        pu_max: args.pu_max,
        bin_width: args.bin_width,
        error_scale: args.error_scale,
        ..Default::default()
    }
}

fn veto_set(args: &RemapArgs) -> VetoSet {
    args.veto.iter().copied().collect()
}

fn region_series_path(prefix: &str, kind: &str, region: &str) -> String {
    format!("{prefix}Errors/Bitstr_Occ_{kind}_LB_{region}")
}

/// Build the vs-pile-up stack for one occupancy flavor from the
/// precomputed per-region lumi-block series.
fn build_vs_mu_stack(
    store: &dyn SeriesStore,
    prefix: &str,
    kind: &str,
    y_title: &str,
    args: &RemapArgs,
    margin: f64,
) -> Result<SeriesStack> {
    let pileup = load_pileup_reference(store, prefix, args.bad_lbs)?;
    let vetoes = veto_set(args);
    let cfg = remap_config(args);

    let mut stack =
        SeriesStack::with_config(StackConfig { margin, ..Default::default() });
    for region in default_regions() {
        let path = region_series_path(prefix, kind, &region);
        let lb_series = open_clean(store, &path, args.bad_lbs)?;
        let mut remapped = remap_to_pileup(&lb_series, &pileup, &vetoes, &cfg)?;
        remapped.name = format!("Bitstr_Occ_{kind}_LB_{region}");
        stack.push(remapped)?;
    }
    stack.set_x_title("Average #mu per lumi block");
    stack.set_y_title(y_title);
    stack.set_x_ticks(MU_TICKS);
    Ok(stack)
}

/// Build the vs-lumi-block stack for one occupancy flavor.
fn build_vs_lumi_stack(
    store: &dyn SeriesStore,
    prefix: &str,
    kind: &str,
    y_title: &str,
    args: &RemapArgs,
    margin: f64,
) -> Result<SeriesStack> {
    let mut stack =
        SeriesStack::with_config(StackConfig { margin, ..Default::default() });
    for region in default_regions() {
        let path = region_series_path(prefix, kind, &region);
        let lb_series = open_clean(store, &path, args.bad_lbs)?;
        stack.push(lb_series)?;
    }
    stack.set_x_title("Lumi block");
    stack.set_y_title(y_title);
    stack.set_x_ticks(LB_TICKS);
    stack.set_x_view(LB_VIEW_MAX);
    Ok(stack)
}

fn out_path(output: Option<&Path>, name: &str) -> PathBuf {
    output.unwrap_or_else(|| Path::new(".")).join(name)
}

fn write_json<T: Serialize>(output: Option<&Path>, name: &str, value: &T) -> Result<()> {
    if let Some(dir) = output {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let path = out_path(output, name);
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    tracing::info!(path = %path.display(), "artifact written");
    Ok(())
}

fn write_text(output: Option<&Path>, name: &str, text: &str) -> Result<()> {
    if let Some(dir) = output {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let path = out_path(output, name);
    std::fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
    tracing::info!(path = %path.display(), "table written");
    Ok(())
}

/// The standard per-run report: both occupancy flavors vs. pile-up and
/// vs. lumi block, the pile-up table, and the run metadata.
pub(crate) fn cmd_report(
    store_args: &StoreArgs,
    args: &RemapArgs,
    fill: Option<String>,
    margin: f64,
    output: Option<&Path>,
) -> Result<()> {
    let (store, prefix) = open_validated(store_args)?;

    for (kind, y_title, stem) in KINDS {
        let mut vs_mu = build_vs_mu_stack(&store, &prefix, kind, y_title, args, margin)?;
        write_json(output, &format!("{stem}_vs_mu.json"), &vs_mu.to_artifact())?;

        let mut vs_lumi = build_vs_lumi_stack(&store, &prefix, kind, y_title, args, margin)?;
        write_json(output, &format!("{stem}_vs_lumi.json"), &vs_lumi.to_artifact())?;

        if kind == "Tot" {
            write_text(output, "bitstr_occ_table.txt", &vs_mu.render_table())?;
        }
    }

    write_json(output, "report_meta.json", &ReportMeta::new(&store_args.run, fill))?;
    Ok(())
}

/// List module names matching a pattern.
pub(crate) fn cmd_modules(store_args: &StoreArgs, pattern: &str) -> Result<()> {
    let (store, prefix) = open_validated(store_args)?;
    let modules = find_modules(&store, &prefix, pattern)?;
    for name in &modules {
        println!("{name}");
    }
    println!("Found {} modules matching pattern: {pattern}", modules.len());
    Ok(())
}

/// Aggregate per-module series into one pile-up curve per region.
pub(crate) fn cmd_regions(
    store_args: &StoreArgs,
    args: &RemapArgs,
    regions: &[String],
    output: Option<&Path>,
) -> Result<()> {
    let (store, prefix) = open_validated(store_args)?;
    let pileup = load_pileup_reference(&store, &prefix, args.bad_lbs)?;
    let vetoes = veto_set(args);

    let mut stack = SeriesStack::new();
    for region in regions {
        let names = find_modules(&store, &prefix, &format!("^{region}/"))?;
        let cfg = RegionConfig {
            label: format!("Module_Occ_{region}"),
            bad_lbs: args.bad_lbs,
            remap: remap_config(args),
            x_view: None,
        };
        let outcome = aggregate_region(&store, &prefix, &names, &pileup, &vetoes, &cfg)?;
        tracing::info!(
            region = region.as_str(),
            used = outcome.used,
            skipped = outcome.skipped.len(),
            "region aggregated"
        );
        stack.push(outcome.series)?;
    }
    stack.set_x_title("Average #mu per lumi block");
    stack.set_y_title("Average bandwidth usage/module");
    stack.set_x_ticks(MU_TICKS);
    write_json(output, "avg_module_occ_vs_mu.json", &stack.to_artifact())?;
    Ok(())
}

/// Print the pile-up occupancy table to stdout.
pub(crate) fn cmd_table(store_args: &StoreArgs, args: &RemapArgs) -> Result<()> {
    let (store, prefix) = open_validated(store_args)?;
    let (kind, y_title, _) = KINDS[1];
    let stack = build_vs_mu_stack(&store, &prefix, kind, y_title, args, 1.3)?;
    print!("{}", stack.render_table());
    Ok(())
}

/// Module spread distributions at one pile-up point, flat or sliced
/// by eta index.
pub(crate) fn cmd_spread(
    store_args: &StoreArgs,
    args: &RemapArgs,
    pu: f64,
    tolerance: f64,
    pattern: &str,
    eta: bool,
    output: Option<&Path>,
) -> Result<()> {
    let (store, prefix) = open_validated(store_args)?;
    let names = find_modules(&store, &prefix, pattern)?;
    let pileup = load_pileup_reference(&store, &prefix, args.bad_lbs)?;
    let vetoes = veto_set(args);

    let mut stack = SeriesStack::new();
    if eta {
        let cfg = EtaSpreadConfig { tolerance, bad_lbs: args.bad_lbs, ..EtaSpreadConfig::new(pu) };
        let outcome = spread_by_eta(&store, &prefix, &names, &pileup, &vetoes, &cfg)?;
        tracing::info!(skipped = outcome.skipped.len(), "eta spread complete");
        for slice in outcome.slices {
            stack.push(slice)?;
        }
    } else {
        let cfg = SpreadConfig { tolerance, bad_lbs: args.bad_lbs, ..SpreadConfig::new(pu) };
        let outcome = spread_at(&store, &prefix, &names, &pileup, &vetoes, &cfg)?;
        tracing::info!(
            modules = outcome.modules,
            skipped = outcome.skipped.len(),
            "spread complete"
        );
        stack.push(outcome.histogram)?;
    }
    stack.set_x_title("Bandwidth usage/module");
    stack.set_y_title("Module fraction");

    let name =
        if eta { format!("module_spread_eta_pu{pu:.0}.json") } else { format!("module_spread_pu{pu:.0}.json") };
    write_json(output, &name, &stack.to_artifact())?;
    Ok(())
}
