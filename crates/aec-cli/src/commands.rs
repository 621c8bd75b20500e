use std::io;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use aec_cli::pipeline::{compute_statistics, convert_products, load_products, unit_overview};
use aec_model::{OutlierPolicy, StatisticsRequest, UnitTarget};
use aec_output::{write_csv, write_csv_file, write_epdx_file, write_json_file};

use crate::cli::{ConvertArgs, EpdxArgs, InputArgs, NormalizeArgs, StatsArgs, TableFormatArg};
use crate::summary::{print_flat_table, print_units};

pub fn run_normalize(args: &NormalizeArgs) -> Result<()> {
    let data = load_products(&args.input.input)?;
    let span = info_span!("output", path = %args.output.display());
    let _guard = span.enter();
    match args.format {
        TableFormatArg::Csv => write_csv_file(&args.output, data.table(), None),
        TableFormatArg::Json => write_json_file(&args.output, data.records()),
    }
    .with_context(|| format!("write {}", args.output.display()))?;
    info!(products = data.len(), "wrote normalized products");
    println!("Wrote {} products to {}", data.len(), args.output.display());
    Ok(())
}

pub fn run_convert(args: &ConvertArgs) -> Result<()> {
    let data = load_products(&args.input.input)?;
    let table = convert_products(&data, &UnitTarget::parse(&args.unit), args.amount)?;
    match &args.output {
        Some(path) => {
            write_csv_file(path, &table, None)
                .with_context(|| format!("write {}", path.display()))?;
            println!("Wrote {} products to {}", table.height(), path.display());
        }
        None => write_csv(&table, io::stdout().lock(), None).context("write CSV to stdout")?,
    }
    Ok(())
}

pub fn run_units(args: &InputArgs) -> Result<()> {
    let data = load_products(&args.input)?;
    print_units(&unit_overview(&data));
    Ok(())
}

pub fn run_stats(args: &StatsArgs) -> Result<()> {
    let data = load_products(&args.input.input)?;
    let table = compute_statistics(&data, UnitTarget::parse(&args.unit), &statistics_request(args))?;
    print_flat_table(&table);
    if let Some(path) = &args.output {
        write_csv_file(path, &table, None).with_context(|| format!("write {}", path.display()))?;
        println!("Statistics: {}", path.display());
    }
    Ok(())
}

pub fn run_epdx(args: &EpdxArgs) -> Result<()> {
    let data = load_products(&args.input.input)?;
    let records = write_epdx_file(&args.output, data.table(), None)
        .with_context(|| format!("export EPDx to {}", args.output.display()))?;
    println!("Wrote {} EPDx records to {}", records.len(), args.output.display());
    Ok(())
}

fn statistics_request(args: &StatsArgs) -> StatisticsRequest {
    let mut request = StatisticsRequest::new()
        .with_min_count(args.min_count)
        .with_include_estimated(args.include_estimated)
        .with_outliers(
            OutlierPolicy::default()
                .with_method(args.method)
                .with_sqrt_transform(!args.no_sqrt)
                .with_remove_outliers(!args.keep_outliers),
        );
    if !args.group_by.is_empty() {
        request = request.with_group_by(args.group_by.iter().cloned());
    }
    if !args.fields.is_empty() {
        request = request.with_fields(args.fields.iter().cloned());
    }
    if !args.metrics.is_empty() {
        request = request.with_metrics(args.metrics.iter().copied());
    }
    request
}
