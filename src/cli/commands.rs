//! Command implementations for the BikeMi CLI

use crate::analysis::{
    AdfOptions, AdfReport, Decomposition, RollingKind, RollingStatistics, acf, adfuller_with,
    pacf, render_correlogram, seasonal_decompose, station_missing_obs, subunit_summary,
};
use crate::cli::args::{Args, Commands, DiagnoseArgs, FeaturesArgs, FlowArgs, ReconcileArgs};
use crate::config::{BikeMiConfig, ReportStyle};
use crate::features::create_ts_features;
use crate::flow::{FlowStore, FrameFlowStore, PgFlowStore, pivot_bike_flow, retrieve_bike_flow};
use crate::models::{FlowQuery, RentalTable};
use crate::output::{read_csv, write_csv};
use crate::stations::{MismatchMode, clean_frame, mismatches};
use crate::utils::f64_values;
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Main entry point for the CLI application
pub async fn run(args: Args) -> Result<()> {
    setup_logging(args.get_log_level());

    let mut config = BikeMiConfig::from_env().context("Invalid database configuration")?;
    if args.plain {
        config = config.with_report_style(ReportStyle::plain());
    }

    match args.command {
        Some(Commands::Flow(flow)) => {
            let database = flow.database.apply(config.database.clone());
            run_flow(flow, &config.with_database(database)).await
        }
        Some(Commands::Features(features)) => run_features(features),
        Some(Commands::Diagnose(diagnose)) => run_diagnose(diagnose, &config.report),
        Some(Commands::Reconcile(reconcile)) => run_reconcile(reconcile, &config.report),
        None => Ok(()),
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bikemi_analysis={}", log_level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Spinner shown while a store answers
fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Write to `output` when given, otherwise print the frame
fn emit(df: &mut DataFrame, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            write_csv(df, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} {}", "Wrote".green().bold(), path.display());
        }
        None => println!("{}", df),
    }
    Ok(())
}

fn load_csv(path: &Path) -> Result<DataFrame> {
    read_csv(path).with_context(|| format!("Failed to read {}", path.display()))
}

async fn run_flow(args: FlowArgs, config: &BikeMiConfig) -> Result<()> {
    let table = RentalTable::new(&args.table)?;
    let mut query = FlowQuery::new(table)
        .with_unit(args.unit)
        .with_time(args.time.into());
    if let Some(station) = args.station {
        query = query.with_station(station);
    }

    let flow = match &args.rentals_csv {
        Some(path) => {
            let store = FrameFlowStore::new(load_csv(path)?);
            answer(&store, &query, args.top).await?
        }
        None => {
            let store = PgFlowStore::new(config.database.clone());
            answer(&store, &query, args.top).await?
        }
    };

    let mut flow = match query.station {
        Some(station) if args.pivot && args.top.is_none() => {
            let wide = pivot_bike_flow(&flow, query.time, station)?;
            if args.missing_obs {
                station_missing_obs(&wide, query.time.alias())?
            } else {
                wide
            }
        }
        _ => flow,
    };

    emit(&mut flow, args.output.as_deref())
}

/// Top stations when `top` is set, the flow otherwise
async fn answer<S: FlowStore>(store: &S, query: &FlowQuery, top: Option<usize>) -> Result<DataFrame> {
    let spinner = create_spinner(format!("Querying {}...", query.table));

    let result = match (top, query.station) {
        (Some(limit), Some(station)) => store.top_stations(&query.table, station, limit).await,
        _ => retrieve_bike_flow(store, query).await,
    };

    match &result {
        Ok(df) => spinner.finish_with_message(format!("Retrieved {} rows", df.height())),
        Err(_) => spinner.abandon_with_message("Query failed"),
    }
    Ok(result?)
}

fn run_features(args: FeaturesArgs) -> Result<()> {
    let features = args.selected_features();
    info!("Adding {} calendar features", features.len());

    let df = load_csv(&args.input)?;
    let mut df = create_ts_features(df, &args.time_column, &features)?;
    emit(&mut df, args.output.as_deref())
}

fn run_diagnose(args: DiagnoseArgs, style: &ReportStyle) -> Result<()> {
    let df = load_csv(&args.input)?;
    let values = f64_values(&df, &args.value_column)?;
    info!(
        "Diagnosing '{}' ({} observations)",
        args.value_column,
        values.len()
    );

    let rolling = RollingStatistics::compute(&values, args.window, RollingKind::Both)?;
    println!("{}\n", heading(&rolling.title(), style));

    let acf = acf(&values, args.nlags)?;
    let pacf = pacf(&values, args.nlags)?;
    println!("{}", render_correlogram("Autocorrelation", &acf, style));
    println!("{}", render_correlogram("Partial Autocorrelation", &pacf, style));

    let options = AdfOptions::default().with_regression(args.regression);
    let report = AdfReport::new(adfuller_with(&values, &options)?);
    println!("{}", heading("Augmented Dickey-Fuller Test", style));
    println!("{}\n", report.render(style));

    let summary = match args.subunit {
        Some(subunit) => {
            let summary = subunit_summary(&df, &args.time_column, &args.value_column, subunit)?;
            println!("{}\n{}\n", heading(&subunit.title(), style), summary);
            Some(summary)
        }
        None => None,
    };

    let decomposition = match args.period {
        Some(period) => Some(seasonal_decompose(&values, period, args.model)?),
        None => None,
    };

    let Some(dir) = args.output_dir else {
        if decomposition.is_some() {
            warn!("Decomposition computed but no output directory given");
        }
        return Ok(());
    };

    write_csv(&mut rolling_frame(&rolling)?, &dir.join("rolling.csv"))?;
    write_csv(&mut correlogram_frame(&acf)?, &dir.join("acf.csv"))?;
    write_csv(&mut correlogram_frame(&pacf)?, &dir.join("pacf.csv"))?;
    if let Some(mut summary) = summary {
        write_csv(&mut summary, &dir.join("subunits.csv"))?;
    }
    if let Some(decomposition) = &decomposition {
        write_csv(
            &mut decomposition_frame(decomposition)?,
            &dir.join("decomposition.csv"),
        )?;
    }
    println!("{} {}", "Wrote diagnostics to".green().bold(), dir.display());
    Ok(())
}

fn heading(text: &str, style: &ReportStyle) -> String {
    if style.colored {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

fn rolling_frame(rolling: &RollingStatistics) -> Result<DataFrame> {
    let mut columns = vec![Series::new("observed".into(), &rolling.observed).into_column()];
    if let Some(mean) = &rolling.mean {
        columns.push(Series::new("rolling_mean".into(), mean).into_column());
    }
    if let Some(std) = &rolling.std {
        columns.push(Series::new("rolling_std".into(), std).into_column());
    }
    Ok(DataFrame::new(columns)?)
}

fn correlogram_frame(correlogram: &crate::analysis::Correlogram) -> Result<DataFrame> {
    let lags: Vec<u32> = (0..correlogram.values.len() as u32).collect();
    let (lower, upper): (Vec<f64>, Vec<f64>) = correlogram.confint.iter().copied().unzip();
    Ok(DataFrame::new(vec![
        Series::new("lag".into(), lags).into_column(),
        Series::new("value".into(), &correlogram.values).into_column(),
        Series::new("lower".into(), lower).into_column(),
        Series::new("upper".into(), upper).into_column(),
    ])?)
}

fn decomposition_frame(decomposition: &Decomposition) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Series::new("observed".into(), &decomposition.observed).into_column(),
        Series::new("trend".into(), &decomposition.trend).into_column(),
        Series::new("seasonal".into(), &decomposition.seasonal).into_column(),
        Series::new("resid".into(), &decomposition.resid).into_column(),
    ])?)
}

fn run_reconcile(args: ReconcileArgs, style: &ReportStyle) -> Result<()> {
    let left = clean_frame(load_csv(&args.left)?, &args.left_on, true)?;
    let right = clean_frame(load_csv(&args.right)?, &args.right_on, true)?;

    let Some(dir) = args.output_dir else {
        mismatches(&left, &right, &args.left_on, &args.right_on, MismatchMode::Text)?;
        return Ok(());
    };

    let Some(sets) = mismatches(&left, &right, &args.left_on, &args.right_on, MismatchMode::Frames)?
    else {
        return Ok(());
    };

    let mut left_only = DataFrame::new(vec![sets.left_only.clone().into_column()])?;
    let mut right_only = DataFrame::new(vec![sets.right_only.clone().into_column()])?;
    write_csv(&mut left_only, &dir.join("left_only.csv"))?;
    write_csv(&mut right_only, &dir.join("right_only.csv"))?;

    if sets.is_reconciled() {
        info!("Every station matches");
        println!("{}", heading("All stations match", style));
    } else {
        println!("{}", sets);
    }
    println!("{} {}", "Wrote mismatches to".green().bold(), dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DecompositionModel;
    use tempfile::TempDir;

    #[test]
    fn test_rolling_frame_columns() {
        let rolling =
            RollingStatistics::compute(&[1.0, 2.0, 3.0, 4.0], 2, RollingKind::Mean).unwrap();
        let df = rolling_frame(&rolling).unwrap();
        assert_eq!(df.get_column_names_str(), vec!["observed", "rolling_mean"]);
        assert_eq!(df.column("rolling_mean").unwrap().null_count(), 1);
    }

    #[test]
    fn test_correlogram_frame_bands() {
        let values: Vec<f64> = (0..40).map(|i| ((i * 7) % 11) as f64).collect();
        let correlogram = acf(&values, Some(5)).unwrap();
        let df = correlogram_frame(&correlogram).unwrap();
        assert_eq!(df.height(), 6);
        assert_eq!(df.get_column_names_str(), vec!["lag", "value", "lower", "upper"]);
    }

    #[test]
    fn test_decomposition_frame_has_edges() {
        let values: Vec<f64> = (0..12).map(|i| 10.0 + (i % 4) as f64).collect();
        let decomposition = seasonal_decompose(&values, 4, DecompositionModel::Additive).unwrap();
        let df = decomposition_frame(&decomposition).unwrap();
        assert_eq!(df.height(), 12);
        assert_eq!(df.column("trend").unwrap().null_count(), 4);
    }

    #[test]
    fn test_reconcile_writes_mismatches() {
        let dir = TempDir::new().unwrap();
        let stalls_path = dir.path().join("stalls.csv");
        let series_path = dir.path().join("series.csv");
        write_csv(&mut df!("nome" => ["Duomo", "Cadorna"]).unwrap(), &stalls_path).unwrap();
        write_csv(
            &mut df!("stazione_partenza" => ["DUOMO", "Garibaldi"]).unwrap(),
            &series_path,
        )
        .unwrap();

        let out = dir.path().join("out");
        let args = ReconcileArgs {
            left: stalls_path,
            right: series_path,
            left_on: "nome".to_string(),
            right_on: "stazione_partenza".to_string(),
            output_dir: Some(out.clone()),
        };
        run_reconcile(args, &ReportStyle::plain()).unwrap();

        let left_only = read_csv(&out.join("left_only.csv")).unwrap();
        let right_only = read_csv(&out.join("right_only.csv")).unwrap();
        assert_eq!(left_only.height(), 1);
        assert_eq!(right_only.height(), 1);
    }

    #[test]
    fn test_reconcile_rerun_clears_stale_mismatches() {
        let dir = TempDir::new().unwrap();
        let stalls_path = dir.path().join("stalls.csv");
        let series_path = dir.path().join("series.csv");
        let out = dir.path().join("out");
        let args = ReconcileArgs {
            left: stalls_path.clone(),
            right: series_path.clone(),
            left_on: "nome".to_string(),
            right_on: "stazione_partenza".to_string(),
            output_dir: Some(out.clone()),
        };

        write_csv(&mut df!("nome" => ["Duomo", "Cadorna"]).unwrap(), &stalls_path).unwrap();
        write_csv(
            &mut df!("stazione_partenza" => ["Duomo", "Garibaldi"]).unwrap(),
            &series_path,
        )
        .unwrap();
        run_reconcile(args.clone(), &ReportStyle::plain()).unwrap();
        assert_eq!(read_csv(&out.join("right_only.csv")).unwrap().height(), 1);

        write_csv(
            &mut df!("stazione_partenza" => ["Duomo", "Cadorna"]).unwrap(),
            &series_path,
        )
        .unwrap();
        run_reconcile(args, &ReportStyle::plain()).unwrap();
        assert_eq!(read_csv(&out.join("left_only.csv")).unwrap().height(), 0);
        assert_eq!(read_csv(&out.join("right_only.csv")).unwrap().height(), 0);
    }
}
