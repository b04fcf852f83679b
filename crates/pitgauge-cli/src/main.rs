//! pitgauge CLI — command-line interface for shaft survey analysis.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use pitgauge_core::{analyze, Aabb, AnalysisParams, AnalysisStatus, PitMetrics};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "pitgauge")]
#[command(
    about = "Estimate depth, diameter and verticality of a drilled shaft from a 3-D point cloud"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a shaft cloud and print the survey report.
    Analyze(CliAnalyzeArgs),

    /// Print point count and bounds of a cloud file.
    CloudInfo {
        /// Path to the input cloud (.xyz/.csv or ASCII .pcd).
        #[arg(long)]
        cloud: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct CliAnalyzeArgs {
    /// Path to the input cloud (.xyz/.csv or ASCII .pcd).
    #[arg(long)]
    cloud: PathBuf,

    /// Path to write the metrics as JSON.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Spacing between slice centers in metres.
    #[arg(long, default_value = "1.0")]
    slice_interval: f64,

    /// Slice thickness in metres.
    #[arg(long, default_value = "0.30")]
    slice_thickness: f64,

    /// RANSAC trials per slice.
    #[arg(long, default_value = "5000")]
    ransac_iters: usize,

    /// RANSAC inlier distance threshold in metres.
    #[arg(long, default_value = "0.2")]
    ransac_thresh: f64,

    /// Percentile of the in-shaft z sample used as the depth estimate.
    #[arg(long, default_value = "99.5")]
    depth_percentile: f64,

    /// Seed for the RANSAC RNG; omit for a non-reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    crop: CliCropArgs,
}

#[derive(Debug, Clone, Args, Default)]
struct CliCropArgs {
    /// Crop box minimum x (m). If set, all six crop bounds are required.
    #[arg(long)]
    crop_x_min: Option<f64>,
    /// Crop box maximum x (m). If set, all six crop bounds are required.
    #[arg(long)]
    crop_x_max: Option<f64>,
    /// Crop box minimum y (m). If set, all six crop bounds are required.
    #[arg(long)]
    crop_y_min: Option<f64>,
    /// Crop box maximum y (m). If set, all six crop bounds are required.
    #[arg(long)]
    crop_y_max: Option<f64>,
    /// Crop box minimum z (m). If set, all six crop bounds are required.
    #[arg(long)]
    crop_z_min: Option<f64>,
    /// Crop box maximum z (m). If set, all six crop bounds are required.
    #[arg(long)]
    crop_z_max: Option<f64>,
}

impl CliCropArgs {
    fn to_core(&self) -> CliResult<Option<Aabb>> {
        let bounds = [
            self.crop_x_min,
            self.crop_x_max,
            self.crop_y_min,
            self.crop_y_max,
            self.crop_z_min,
            self.crop_z_max,
        ];
        if bounds.iter().all(Option::is_none) {
            return Ok(None);
        }
        if bounds.iter().any(Option::is_none) {
            return Err(
                "crop box is partial; provide all of --crop-x-min --crop-x-max \
                 --crop-y-min --crop-y-max --crop-z-min --crop-z-max"
                    .to_string()
                    .into(),
            );
        }
        Ok(Some(Aabb {
            min: [
                self.crop_x_min.expect("validated"),
                self.crop_y_min.expect("validated"),
                self.crop_z_min.expect("validated"),
            ],
            max: [
                self.crop_x_max.expect("validated"),
                self.crop_y_max.expect("validated"),
                self.crop_z_max.expect("validated"),
            ],
        }))
    }
}

impl CliAnalyzeArgs {
    fn to_params(&self) -> AnalysisParams {
        AnalysisParams {
            depth_percentile: self.depth_percentile,
            slice: pitgauge_core::SliceParams {
                interval: self.slice_interval,
                thickness: self.slice_thickness,
            },
            ransac: pitgauge_core::RansacParams {
                iterations: self.ransac_iters,
                inlier_threshold: self.ransac_thresh,
            },
            seed: self.seed,
            ..AnalysisParams::default()
        }
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => run_analyze(&args),
        Commands::CloudInfo { cloud } => run_cloud_info(&cloud),
    }
}

// ── cloud loading ──────────────────────────────────────────────────────────

fn load_cloud(path: &Path) -> CliResult<Vec<[f64; 3]>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| -> CliError { format!("failed to read {}: {}", path.display(), e).into() })?;

    let is_pcd = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pcd"))
        .unwrap_or(false);
    if is_pcd {
        parse_pcd_ascii(&text)
    } else {
        parse_xyz(&text)
    }
}

/// Parse whitespace- or comma-separated `x y z` rows. Blank lines and
/// `#` comments are skipped; trailing columns beyond z are ignored.
fn parse_xyz(text: &str) -> CliResult<Vec<[f64; 3]>> {
    let mut points = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split(|c: char| c == ',' || c.is_whitespace()).filter(|f| !f.is_empty());
        let mut point = [0.0f64; 3];
        for coord in &mut point {
            let field = fields
                .next()
                .ok_or_else(|| format!("line {}: expected 3 coordinates", lineno + 1))?;
            *coord = field
                .parse::<f64>()
                .map_err(|e| format!("line {}: {}", lineno + 1, e))?;
        }
        points.push(point);
    }
    Ok(points)
}

/// Parse an ASCII PCD file. Only `DATA ascii` is supported; the x/y/z
/// columns are located from the FIELDS header line.
fn parse_pcd_ascii(text: &str) -> CliResult<Vec<[f64; 3]>> {
    let mut xyz_cols: Option<[usize; 3]> = None;
    let mut in_data = false;
    let mut points = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !in_data {
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("FIELDS") => {
                    let fields: Vec<&str> = tokens.collect();
                    let col = |name: &str| fields.iter().position(|f| *f == name);
                    match (col("x"), col("y"), col("z")) {
                        (Some(x), Some(y), Some(z)) => xyz_cols = Some([x, y, z]),
                        _ => return Err("PCD header lacks x/y/z fields".into()),
                    }
                }
                Some("DATA") => {
                    match tokens.next() {
                        Some("ascii") => in_data = true,
                        other => {
                            return Err(format!(
                                "unsupported PCD data format {:?}; only ascii is supported",
                                other.unwrap_or("")
                            )
                            .into())
                        }
                    }
                    if xyz_cols.is_none() {
                        return Err("PCD DATA section before FIELDS header".into());
                    }
                }
                _ => {} // VERSION, SIZE, TYPE, COUNT, WIDTH, HEIGHT, VIEWPOINT, POINTS
            }
            continue;
        }

        let cols = xyz_cols.expect("set before entering the data section");
        let fields: Vec<&str> = line.split_whitespace().collect();
        let mut point = [0.0f64; 3];
        for (coord, &col) in point.iter_mut().zip(cols.iter()) {
            let field = fields
                .get(col)
                .ok_or_else(|| format!("line {}: missing column {}", lineno + 1, col))?;
            *coord = field
                .parse::<f64>()
                .map_err(|e| format!("line {}: {}", lineno + 1, e))?;
        }
        points.push(point);
    }

    if !in_data {
        return Err("PCD file has no DATA ascii section".into());
    }
    Ok(points)
}

// ── cloud-info ─────────────────────────────────────────────────────────────

fn run_cloud_info(path: &Path) -> CliResult<()> {
    let points = load_cloud(path)?;
    println!("cloud: {}", path.display());
    println!("  points: {}", points.len());
    match pitgauge_core::cloud::bounds(&points) {
        Some(bb) => {
            println!(
                "  x: [{:.3}, {:.3}] m",
                bb.min[0], bb.max[0]
            );
            println!(
                "  y: [{:.3}, {:.3}] m",
                bb.min[1], bb.max[1]
            );
            println!(
                "  z: [{:.3}, {:.3}] m",
                bb.min[2], bb.max[2]
            );
        }
        None => println!("  (empty cloud)"),
    }
    Ok(())
}

// ── analyze ────────────────────────────────────────────────────────────────

/// Regulatory verticality limit: axis deviation of 1% of shaft length,
/// i.e. atan(0.01) expressed in degrees (≈ 0.573°).
fn verticality_limit_deg() -> f64 {
    0.01f64.atan().to_degrees()
}

fn run_analyze(args: &CliAnalyzeArgs) -> CliResult<()> {
    tracing::info!("Loading cloud: {}", args.cloud.display());
    let mut points = load_cloud(&args.cloud)?;
    tracing::info!("Loaded {} points", points.len());

    if let Some(bbox) = args.crop.to_core()? {
        let before = points.len();
        points = bbox.crop(&points);
        tracing::info!("Crop box kept {}/{} points", points.len(), before);
    }

    let params = args.to_params();
    let metrics = analyze(&points, &params).map_err(|e| -> CliError {
        // A fit failure still carries a usable depth; surface it before
        // propagating the error.
        if let pitgauge_core::AnalysisError::FitFailure { depth } = &e {
            tracing::warn!("Depth estimate before failure: {:.3} m", depth);
        }
        e.to_string().into()
    })?;

    print_report(&metrics);

    if let Some(out) = &args.out {
        let json = serde_json::to_string_pretty(&metrics)?;
        std::fs::write(out, &json)?;
        tracing::info!("Metrics written to {}", out.display());
    }

    Ok(())
}

fn print_report(metrics: &PitMetrics) {
    println!("shaft survey report");
    println!("  depth:          {:.3} m", metrics.depth);

    if metrics.status == AnalysisStatus::TooShallow {
        println!("  status:         too shallow to layer; depth only");
        return;
    }

    if let Some(d) = metrics.avg_diameter {
        println!("  avg diameter:   {:.3} m", d);
    }
    if let Some(d) = metrics.min_diameter {
        println!("  min diameter:   {:.3} m", d);
    }
    println!("  slices fitted:  {}", metrics.slices.len());

    match metrics.verticality_deg {
        Some(deg) => {
            let limit = verticality_limit_deg();
            let verdict = if deg > limit {
                "Non-conforming"
            } else {
                "Conforming"
            };
            println!("  verticality:    {:.3}° (limit {:.3}°)", deg, limit);
            println!("  verdict:        {}", verdict);
        }
        None => println!("  verticality:    n/a (needs at least 2 fitted slices)"),
    }

    for s in &metrics.slices {
        tracing::debug!(
            "slice z={:.2} m: r={:.3} m center=({:.3}, {:.3})",
            s.center_z,
            s.radius,
            s.center_x,
            s.center_y,
        );
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xyz_rows_and_comments() {
        let text = "# header\n1.0 2.0 3.0\n\n4.0,5.0,6.0\n7 8 9 extra\n";
        let pts = parse_xyz(text).unwrap();
        assert_eq!(
            pts,
            vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]
        );
    }

    #[test]
    fn test_parse_xyz_bad_row() {
        assert!(parse_xyz("1.0 2.0\n").is_err());
        assert!(parse_xyz("1.0 2.0 abc\n").is_err());
    }

    #[test]
    fn test_parse_pcd_ascii() {
        let text = "\
# .PCD v0.7
VERSION 0.7
FIELDS x y z intensity
SIZE 4 4 4 4
TYPE F F F F
COUNT 1 1 1 1
WIDTH 2
HEIGHT 1
VIEWPOINT 0 0 0 1 0 0 0
POINTS 2
DATA ascii
0.5 -0.5 1.0 42
1.5 2.5 3.5 17
";
        let pts = parse_pcd_ascii(text).unwrap();
        assert_eq!(pts, vec![[0.5, -0.5, 1.0], [1.5, 2.5, 3.5]]);
    }

    #[test]
    fn test_parse_pcd_rejects_binary() {
        let text = "FIELDS x y z\nDATA binary\n";
        assert!(parse_pcd_ascii(text).is_err());
    }

    #[test]
    fn test_partial_crop_rejected() {
        let crop = CliCropArgs {
            crop_x_min: Some(-1.0),
            ..CliCropArgs::default()
        };
        assert!(crop.to_core().is_err());
        assert!(CliCropArgs::default().to_core().unwrap().is_none());
    }

    #[test]
    fn test_verticality_limit() {
        let limit = verticality_limit_deg();
        assert!((limit - 0.5729).abs() < 1e-3, "limit={}", limit);
    }
}
