use anyhow::{anyhow, bail, Context, Result};
use iir_rs::export::{CoefficientExporter, ExportConfig, PoleZeroTable};
use iir_rs::kernel::KernelLifecycle;
use iir_rs::signal::filter::design::{
    elliptic_min_order, prewarp, CascadeDesign, FilterBandType, FilterType, GainNormalization,
    IirDesignConfig, IirDesignKernel, PoleZeroPlacementConfig, PoleZeroPlacementKernel,
    TranslationMethod, BESSEL_MAX_ORDER,
};
use iir_rs::signal::filter::response::{cascade_response_at, ResponseConfig, ResponseKernel};
use iir_rs::signal::filter::{SosFiltConfig, SosFiltKernel};
use iir_rs::signal::traits::{CascadeAnalysis, IirDesign, SosFilt1D};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const SAMPLE_RATE_HZ: f64 = 48_000.0;
const CALIBRATION_TOLERANCE_DB: f64 = 1e-6;
const STABILITY_TAIL_LEN: usize = 8192;

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ContractRow {
    case_id: String,
    sections: usize,
    expected_sections: usize,
    max_pole_radius: f64,
    calibration_hz: f64,
    calibration_gain_db: Option<f64>,
    analysis_gain_db: f64,
    impulse_tail_energy: f64,
    design_ns: f64,
    passed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContractBundle {
    generated_epoch_seconds: u64,
    sample_rate_hz: f64,
    failures: usize,
    rows: Vec<ContractRow>,
}

/// Input document for `xtask design`.
#[derive(Debug, Deserialize)]
struct DesignRequest {
    design: IirDesignConfig<f64>,
    #[serde(default)]
    export: ExportConfig,
    #[serde(default)]
    min_order: Option<MinOrderRequest>,
}

/// Input document for `xtask place`.
#[derive(Debug, Deserialize)]
struct PlacementRequest {
    placement: PoleZeroPlacementConfig<f64>,
    #[serde(default)]
    export: ExportConfig,
}

/// Optional elliptic minimum-order query, in Hz.
#[derive(Debug, Deserialize)]
struct MinOrderRequest {
    rp: f64,
    rs: f64,
    passband_hz: f64,
    stopband_hz: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("contracts") => run_contracts(),
        Some("design") => {
            let path = args
                .next()
                .ok_or_else(|| anyhow!("design requires a JSON request path"))?;
            run_design(Path::new(&path))
        }
        Some("place") => {
            let path = args
                .next()
                .ok_or_else(|| anyhow!("place requires a JSON request path"))?;
            run_placement(Path::new(&path))
        }
        _ => {
            eprintln!("Usage:");
            eprintln!("  cargo run -p xtask -- contracts");
            eprintln!("  cargo run -p xtask -- design <request.json>");
            eprintln!("  cargo run -p xtask -- place <request.json>");
            Ok(())
        }
    }
}

fn run_contracts() -> Result<()> {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let out_dir = PathBuf::from(format!("target/contracts/{ts}"));
    fs::create_dir_all(&out_dir).context("creating contract output directory")?;

    let families = [
        ("butter", FilterType::Butterworth),
        ("cheby1", FilterType::ChebyshevI { rp: 0.5 }),
        ("cheby2", FilterType::ChebyshevII { rs: 50.0 }),
        ("ellip", FilterType::CauerElliptic { rp: 0.5, rs: 50.0 }),
        ("bessel", FilterType::BesselThomson),
    ];
    let bands = [
        ("lp", FilterBandType::Lowpass, vec![4000.0]),
        ("hp", FilterBandType::Highpass, vec![4000.0]),
        ("bp", FilterBandType::Bandpass, vec![4000.0, 8000.0]),
        ("bs", FilterBandType::Bandstop, vec![4000.0, 8000.0]),
    ];
    let translations = [
        ("bilinear", TranslationMethod::Bilinear),
        ("matchedz", TranslationMethod::MatchedZ),
    ];

    let mut rows = Vec::new();
    for (family_name, ftype) in families {
        for (band_name, btype, edges) in &bands {
            for (translation_name, translation) in translations {
                for order in contract_orders(*btype, &ftype) {
                    let case_id = format!("{family_name}_{band_name}_{translation_name}_n{order}");
                    let config = IirDesignConfig {
                        order,
                        band_edges: edges.clone(),
                        fs: SAMPLE_RATE_HZ,
                        btype: *btype,
                        ftype,
                        translation: Some(translation),
                        prewarp: Some(true),
                        normalize_gain: Some(true),
                    };
                    rows.push(run_case(&case_id, config)?);
                }
            }
        }
    }

    let failures = rows.iter().filter(|row| !row.passed).count();
    for row in rows.iter().filter(|row| !row.passed) {
        warn!(case = %row.case_id, "contract failed");
    }

    let summary_csv = out_dir.join("summary.csv");
    write_summary_csv(&summary_csv, &rows)?;

    let bundle = ContractBundle {
        generated_epoch_seconds: ts,
        sample_rate_hz: SAMPLE_RATE_HZ,
        failures,
        rows,
    };
    let summary_json = out_dir.join("summary.json");
    fs::write(&summary_json, serde_json::to_string_pretty(&bundle)?)
        .with_context(|| format!("writing {}", summary_json.display()))?;

    info!(
        cases = bundle.rows.len(),
        failures,
        out = %out_dir.display(),
        "contracts complete"
    );
    println!("contracts written to {}", out_dir.display());
    if failures > 0 {
        bail!("{failures} contract case(s) failed");
    }
    Ok(())
}

fn contract_orders(btype: FilterBandType, ftype: &FilterType<f64>) -> Vec<usize> {
    let max = match ftype {
        FilterType::BesselThomson => BESSEL_MAX_ORDER,
        _ => 10,
    };
    if btype.doubles_order() {
        (2..=max).step_by(2).collect()
    } else {
        (1..=max).collect()
    }
}

fn run_case(case_id: &str, config: IirDesignConfig<f64>) -> Result<ContractRow> {
    let kernel = IirDesignKernel::try_new(config)
        .map_err(|e| anyhow!("case {case_id} rejected its config: {e}"))?;
    let design = kernel
        .run_alloc()
        .map_err(|e| anyhow!("case {case_id} design failed: {e}"))?;
    let spec = kernel.specification();
    let expected_sections = spec.num_sections();

    let design_ns = benchmark_avg_ns(50, || {
        kernel
            .run_alloc()
            .map(|_| ())
            .map_err(|e| anyhow!("case {case_id} design benchmark failed: {e}"))
    })?;

    let calibration_fraction = spec.calibration_hz / spec.fs;
    let calibration_gain_db = calibration_gain_db(&design, calibration_fraction);
    let analysis_gain_db = analysis_gain_db(&design, calibration_fraction)?;
    let impulse_tail_energy = impulse_tail_energy(&design)?;
    let max_pole_radius = design.max_pole_radius();

    let calibrated = match calibration_gain_db {
        Some(gain) => gain.abs() < CALIBRATION_TOLERANCE_DB,
        None => true,
    };
    let passed = design.num_sections() == expected_sections
        && max_pole_radius < 1.0
        && calibrated
        && impulse_tail_energy < 1e-12;

    Ok(ContractRow {
        case_id: case_id.to_string(),
        sections: design.num_sections(),
        expected_sections,
        max_pole_radius,
        calibration_hz: spec.calibration_hz,
        calibration_gain_db,
        analysis_gain_db,
        impulse_tail_energy,
        design_ns,
        passed,
    })
}

fn calibration_gain_db(design: &CascadeDesign<f64>, frequency: f64) -> Option<f64> {
    match design.normalization {
        GainNormalization::Applied { .. } => {
            let gain = cascade_response_at(&design.sections, frequency).norm();
            Some(20.0 * gain.log10())
        }
        GainNormalization::Disabled | GainNormalization::Skipped { .. } => None,
    }
}

// Gain at the FFT bin nearest the calibration frequency.
fn analysis_gain_db(design: &CascadeDesign<f64>, frequency: f64) -> Result<f64> {
    let fft_len = 4096;
    let kernel = ResponseKernel::try_new(ResponseConfig {
        sections: design.sections.clone(),
        fft_len: Some(fft_len),
    })
    .map_err(|e| anyhow!("response kernel rejected the cascade: {e}"))?;
    let mut gain = vec![0.0; fft_len / 2];
    kernel
        .run_into(&mut gain)
        .map_err(|e| anyhow!("response analysis failed: {e}"))?;
    let bin = ((frequency * fft_len as f64).round() as usize).min(gain.len() - 1);
    Ok(gain[bin])
}

fn impulse_tail_energy(design: &CascadeDesign<f64>) -> Result<f64> {
    let mut kernel = SosFiltKernel::try_new(SosFiltConfig {
        sections: design.sections.clone(),
        state: None,
    })
    .map_err(|e| anyhow!("sosfilt kernel rejected the cascade: {e}"))?;
    let mut impulse = vec![0.0; STABILITY_TAIL_LEN];
    impulse[0] = 1.0;
    let y = kernel
        .run_alloc(&impulse)
        .map_err(|e| anyhow!("impulse response failed: {e}"))?;
    Ok(y[STABILITY_TAIL_LEN - 256..].iter().map(|v| v * v).sum())
}

fn run_design(path: &Path) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let request: DesignRequest =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;

    if let Some(query) = &request.min_order {
        let fs = request.design.fs;
        let wp = prewarp(std::f64::consts::TAU * query.passband_hz / fs);
        let ws = prewarp(std::f64::consts::TAU * query.stopband_hz / fs);
        let order = elliptic_min_order(query.rp, query.rs, wp, ws)
            .map_err(|e| anyhow!("minimum order query failed: {e}"))?;
        info!(order, "elliptic minimum order");
        println!("\t/* elliptic minimum order = {order} */");
    }

    let kernel = IirDesignKernel::try_new(request.design)
        .map_err(|e| anyhow!("design config rejected: {e}"))?;
    let design = kernel
        .run_alloc()
        .map_err(|e| anyhow!("design failed: {e}"))?;
    if design.normalization.is_degenerate() {
        warn!("gain normalization was skipped");
    }
    let exporter = CoefficientExporter::try_new(request.export)
        .map_err(|e| anyhow!("export config rejected: {e}"))?;

    println!("\t/* {} sections, order {} */", design.num_sections(), design.effective_order);
    print!("{}", exporter.listing(&design.sections));
    Ok(())
}

fn run_placement(path: &Path) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let request: PlacementRequest =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;

    let kernel = PoleZeroPlacementKernel::try_new(request.placement)
        .map_err(|e| anyhow!("placement config rejected: {e}"))?;
    let design = kernel
        .run_alloc()
        .map_err(|e| anyhow!("placement design failed: {e}"))?;
    if design.normalization.is_degenerate() {
        warn!("gain normalization was skipped");
    }
    let exporter = CoefficientExporter::try_new(request.export)
        .map_err(|e| anyhow!("export config rejected: {e}"))?;

    println!("\t/* {} biquads, order {} */", design.num_sections(), design.effective_order);
    print!("{}", PoleZeroTable::from_roots(&design.pole_zero));
    println!();
    print!("{}", exporter.listing(&design.sections));
    Ok(())
}

fn benchmark_avg_ns<F>(iters: usize, mut f: F) -> Result<f64>
where
    F: FnMut() -> Result<()>,
{
    let start = Instant::now();
    for _ in 0..iters {
        f()?;
    }
    Ok(start.elapsed().as_nanos() as f64 / iters as f64)
}

fn write_summary_csv(path: &Path, rows: &[ContractRow]) -> Result<()> {
    let mut out = String::new();
    out.push_str("case_id,sections,expected_sections,max_pole_radius,calibration_hz,calibration_gain_db,analysis_gain_db,impulse_tail_energy,design_ns,passed\n");
    for row in rows {
        let calibration = row
            .calibration_gain_db
            .map(|g| format!("{g:.12}"))
            .unwrap_or_default();
        out.push_str(&format!(
            "{},{},{},{:.12},{:.6},{},{:.6},{:.3e},{:.3},{}\n",
            row.case_id,
            row.sections,
            row.expected_sections,
            row.max_pole_radius,
            row.calibration_hz,
            calibration,
            row.analysis_gain_db,
            row.impulse_tail_energy,
            row.design_ns,
            row.passed
        ));
    }
    fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}
