//! Submit planetary-transit parameters to the exoplanet classifier and
//! print the result.
//!
//! # Examples
//!
//! ```sh
//! # Classify the default Earth-like transit
//! exospect
//!
//! # Custom parameters
//! exospect --period 12.3 --prad 2.4 --depth 4500 --model-snr 31.2
//!
//! # Just the model-quality metrics
//! exospect --metrics-only
//!
//! # Write the confidence pie as SVG
//! exospect --svg-out confidence.svg
//! ```

use std::process;
use std::sync::Arc;

use clap::Parser;
use exospect::prelude::*;
use tracing::debug;

/// Submit transit parameters to the exoplanet classifier and print the
/// classification alongside the model's quality metrics.
#[derive(Parser)]
#[command(name = "exospect")]
struct Cli {
    // ── Transit parameters ─────────────────────────────────────
    /// Orbital period (days)
    #[arg(long, default_value_t = 365.0)]
    period: f64,

    /// Planet radius (Earth radii)
    #[arg(long, default_value_t = 1.0)]
    prad: f64,

    /// Stellar effective temperature (K)
    #[arg(long, default_value_t = 5778.0)]
    steff: f64,

    /// Transit duration (hours)
    #[arg(long, default_value_t = 10.0)]
    duration: f64,

    /// Transit depth (ppm)
    #[arg(long, default_value_t = 1000.0)]
    depth: f64,

    /// Insolation flux (Earth flux)
    #[arg(long, default_value_t = 1.0)]
    insol: f64,

    /// Stellar radius (Solar radii)
    #[arg(long, default_value_t = 1.0)]
    srad: f64,

    /// Disposition score (0-1)
    #[arg(long, default_value_t = 0.95)]
    score: f64,

    /// Not-transit-like flag (0 or 1)
    #[arg(long, default_value_t = 1)]
    fpflag_nt: u8,

    /// Stellar-eclipse flag (0 or 1)
    #[arg(long, default_value_t = 0)]
    fpflag_ss: u8,

    /// Centroid-offset flag (0 or 1)
    #[arg(long, default_value_t = 0)]
    fpflag_co: u8,

    /// Equilibrium temperature (K)
    #[arg(long, default_value_t = 288.0)]
    teq: f64,

    /// Transit signal-to-noise ratio
    #[arg(long, default_value_t = 12.5)]
    model_snr: f64,

    // ── Behavior ───────────────────────────────────────────────
    /// Classifier backend base URL
    #[arg(long, default_value = exospect::BACKEND_URL)]
    base_url: String,

    /// Only fetch and print the model-quality metrics
    #[arg(long)]
    metrics_only: bool,

    /// Write the confidence pie chart as SVG to this path
    #[arg(long)]
    svg_out: Option<std::path::PathBuf>,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

impl Cli {
    fn transit_params(&self) -> TransitParams {
        TransitParams {
            koi_period: self.period,
            koi_prad: self.prad,
            koi_steff: self.steff,
            koi_duration: self.duration,
            koi_depth: self.depth,
            koi_insol: self.insol,
            koi_srad: self.srad,
            koi_score: self.score,
            koi_fpflag_nt: self.fpflag_nt,
            koi_fpflag_ss: self.fpflag_ss,
            koi_fpflag_co: self.fpflag_co,
            koi_teq: self.teq,
            koi_model_snr: self.model_snr,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let tier = current_tier();
    let plan = current_plan();
    debug!(
        "tier={tier}: max_concurrent={}, heavy_effects={}, animation={}ms",
        plan.max_concurrent_requests, plan.enable_heavy_effects, plan.animation_duration_ms,
    );
    let scheduler = RequestScheduler::from_plan(&plan);

    let source = match HttpMetricsSource::new(&cli.base_url) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    let cache = MetricsCache::new(scheduler.clone(), Arc::new(source));
    let metrics = cache.get(DEFAULT_METRICS_KEY).await;

    println!("Model quality:");
    println!("  accuracy   {:>6.2}%", metrics.accuracy * 100.0);
    println!("  precision  {:>6.2}%", metrics.precision * 100.0);
    println!("  recall     {:>6.2}%", metrics.recall * 100.0);
    println!("  F1 score   {:>6.2}%", metrics.f1_score * 100.0);

    if cli.metrics_only {
        return;
    }

    let client = match PredictClient::with_base_url(&cli.base_url) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let params = cli.transit_params();
    let result = scheduler
        .submit(async move { client.predict(&params).await })
        .await;
    let classification = match result {
        Ok(Ok(c)) => c,
        Ok(Err(e)) | Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    println!();
    println!("{} ({})", classification.status().label(), classification.prediction);
    if let Some(confidence) = classification.confidence {
        println!("Confidence: {confidence:.1}%");
    }
    if let Some(zone) = &classification.habitable_zone_status {
        println!("Habitable zone: {zone}");
    }

    if let Some(features) = &classification.features {
        println!();
        println!("Feature contributions:");
        let values: Vec<f64> = features.iter().map(|f| f.value).collect();
        for (f, bar) in features.iter().zip(signed_bars(&values)) {
            let width = (bar.extent * 24.0).round() as usize;
            let sign = match bar.contribution {
                Contribution::Positive => '+',
                Contribution::Negative => '-',
            };
            println!("  {sign} {:<16} {}", f.feature, "#".repeat(width));
        }
    }

    if let Some(path) = &cli.svg_out {
        let confidence = classification.confidence.unwrap_or(0.0);
        if let Err(e) = std::fs::write(path, confidence_svg(confidence)) {
            eprintln!("Error: failed to write {}: {e}", path.display());
            process::exit(1);
        }
        println!();
        println!("Wrote confidence chart to {}", path.display());
    }
}

/// Render a two-slice confidence/uncertainty pie as a standalone SVG.
fn confidence_svg(confidence: f64) -> String {
    const PALETTE: [&str; 2] = ["#10b981", "#94a3b8"];

    let clamped = confidence.clamp(0.0, 100.0);
    let slices = pie_slices(&[clamped, 100.0 - clamped]);

    let mut paths = String::new();
    for slice in &slices {
        if slice.sweep_angle_deg <= 0.0 {
            continue;
        }
        let d = wedge_path(100.0, 100.0, 80.0, slice.start_angle_deg, slice.sweep_angle_deg);
        paths.push_str(&format!(
            "  <path d=\"{d}\" fill=\"{}\" stroke=\"#1a1f3a\" stroke-width=\"2\"/>\n",
            PALETTE[slice.color_index % PALETTE.len()],
        ));
    }

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"200\" height=\"200\" \
         viewBox=\"0 0 200 200\">\n{paths}</svg>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_svg_two_slices() {
        let svg = confidence_svg(75.0);
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("#10b981"));
        assert!(svg.contains("#94a3b8"));
    }

    #[test]
    fn confidence_svg_degenerate_inputs() {
        // 0% and 100% collapse to a single slice; out-of-range clamps.
        assert_eq!(confidence_svg(0.0).matches("<path").count(), 1);
        assert_eq!(confidence_svg(100.0).matches("<path").count(), 1);
        assert_eq!(confidence_svg(250.0).matches("<path").count(), 1);
    }
}
