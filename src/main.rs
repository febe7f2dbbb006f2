use plane_extract::config::{load_config, OutputConfig, RuntimeConfig};
use plane_extract::diagnostics::{write_csv_grid, FrameDiagnostics};
use plane_extract::{DepthImage, ExtractorParams, Intrinsics, PlaneExtractor, Segmentation};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let program = env::args()
        .next()
        .unwrap_or_else(|| "plane_demo".to_string());
    let cli = parse_args(&program)?;

    let (intrinsics, params, output) = match &cli.config_path {
        Some(path) => {
            let RuntimeConfig {
                intrinsics,
                output,
                params,
            } = load_config(path)?;
            (cli.intrinsics.unwrap_or(intrinsics), params, output)
        }
        None => {
            let intrinsics = cli
                .intrinsics
                .ok_or_else(|| format!("--intrinsics or --config required\n{}", usage(&program)))?;
            (intrinsics, ExtractorParams::default(), OutputConfig::default())
        }
    };
    let labels_out = cli.labels_out.or(output.labels_out);
    let json_out = cli.json_out.or(output.json_out);
    let debug_dir = cli.debug_dir.or(output.debug_dir);

    let depth = DepthImage::open(&cli.input_path)
        .map_err(|e| format!("Failed to load {}: {e}", cli.input_path.display()))?;
    let cloud = depth.to_point_cloud(&intrinsics);

    let mut extractor = PlaneExtractor::new(depth.height(), depth.width(), params)
        .map_err(|e| e.to_string())?;
    let (seg, diag) = extractor
        .process_with_diagnostics(&cloud.as_view())
        .map_err(|e| e.to_string())?;

    print_text_summary(&seg, &diag);

    if let Some(path) = &labels_out {
        save_labels(path, &seg)?;
        println!("Labels written to {}", path.display());
    }

    if let Some(path) = &json_out {
        let json = serde_json::to_string_pretty(&diag)
            .map_err(|e| format!("Failed to serialize JSON: {e}"))?;
        fs::write(path, json)
            .map_err(|e| format!("Failed to write JSON report to {}: {e}", path.display()))?;
        println!("JSON report written to {}", path.display());
    }

    if let Some(dir) = &debug_dir {
        write_debug_grids(dir, &seg, &diag)?;
        println!("Debug CSV grids written to {}", dir.display());
    }

    Ok(())
}

struct CliConfig {
    input_path: PathBuf,
    intrinsics: Option<Intrinsics>,
    config_path: Option<PathBuf>,
    labels_out: Option<PathBuf>,
    json_out: Option<PathBuf>,
    debug_dir: Option<PathBuf>,
}

fn parse_args(program: &str) -> Result<CliConfig, String> {
    let mut args = env::args().skip(1);
    let mut input_path: Option<PathBuf> = None;
    let mut intrinsics: Option<Intrinsics> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut labels_out: Option<PathBuf> = None;
    let mut json_out: Option<PathBuf> = None;
    let mut debug_dir: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                println!("{}", usage(program));
                std::process::exit(0);
            }
            "--intrinsics" => {
                let value = args.next().ok_or_else(|| {
                    format!("--intrinsics expects fx,fy,cx,cy\n{}", usage(program))
                })?;
                intrinsics = Some(parse_intrinsics(&value)?);
            }
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("--config expects a path\n{}", usage(program)))?;
                config_path = Some(PathBuf::from(value));
            }
            "--labels-out" => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("--labels-out expects a path\n{}", usage(program)))?;
                labels_out = Some(PathBuf::from(value));
            }
            "--json-out" => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("--json-out expects a path\n{}", usage(program)))?;
                json_out = Some(PathBuf::from(value));
            }
            "--debug-dir" => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("--debug-dir expects a path\n{}", usage(program)))?;
                debug_dir = Some(PathBuf::from(value));
            }
            _ if arg.starts_with('-') => {
                return Err(format!("Unknown option '{arg}'\n{}", usage(program)));
            }
            _ => {
                if input_path.is_some() {
                    return Err(format!(
                        "Unexpected positional argument '{arg}'\n{}",
                        usage(program)
                    ));
                }
                input_path = Some(PathBuf::from(arg));
            }
        }
    }

    let input_path = input_path.ok_or_else(|| usage(program))?;
    Ok(CliConfig {
        input_path,
        intrinsics,
        config_path,
        labels_out,
        json_out,
        debug_dir,
    })
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {program} <depth.png> [--intrinsics fx,fy,cx,cy] [--config config.json] \\\n         [--labels-out labels.png] [--json-out report.json] [--debug-dir dir]\n\n\
Segments a 16-bit depth image into planar regions.\n\
Examples:\n  {program} frame.png --intrinsics 525.0,525.0,319.5,239.5 --labels-out labels.png\n  {program} frame.png --config tum_fr3.json --debug-dir dbg/\n"
    )
}

fn parse_intrinsics(value: &str) -> Result<Intrinsics, String> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 4 {
        return Err(format!("Expected fx,fy,cx,cy but got '{value}'"));
    }
    let mut nums = [0.0f32; 4];
    for (dst, part) in nums.iter_mut().zip(&parts) {
        *dst = part
            .trim()
            .parse()
            .map_err(|_| format!("Invalid intrinsics component '{part}'"))?;
    }
    Ok(Intrinsics {
        fx: nums[0],
        fy: nums[1],
        cx: nums[2],
        cy: nums[3],
    })
}

fn save_labels(path: &Path, seg: &Segmentation) -> Result<(), String> {
    let img = image::GrayImage::from_raw(seg.width as u32, seg.height as u32, seg.labels.clone())
        .ok_or_else(|| "Label buffer does not match image dimensions".to_string())?;
    img.save(path)
        .map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

fn write_debug_grids(dir: &Path, seg: &Segmentation, diag: &FrameDiagnostics) -> Result<(), String> {
    fs::create_dir_all(dir).map_err(|e| format!("Failed to create {}: {e}", dir.display()))?;
    let dump = |name: &str, width: usize, values: &[i32]| -> Result<(), String> {
        let path = dir.join(name);
        write_csv_grid(&path, width, values)
            .map_err(|e| format!("Failed to write {}: {e}", path.display()))
    };
    let planar: Vec<i32> = diag.planar_map.iter().map(|&v| i32::from(v)).collect();
    dump("planar_cells.csv", diag.cells_x, &planar)?;
    dump("segments_raw.csv", diag.cells_x, &diag.coarse_map)?;
    dump("segments_merged.csv", diag.cells_x, &diag.merged_map)?;
    let labels: Vec<i32> = seg.labels.iter().map(|&v| i32::from(v)).collect();
    dump("labels.csv", seg.width, &labels)
}

fn print_text_summary(seg: &Segmentation, diag: &FrameDiagnostics) {
    println!("Segmentation summary");
    println!("  image: {}x{}", seg.width, seg.height);
    println!(
        "  cells: {}x{} ({} planar)",
        diag.cells_x, diag.cells_y, diag.planar_cells
    );
    println!(
        "  segments: {} raw -> {} merged -> {} final",
        diag.segments_raw, diag.planes_merged, diag.planes_final
    );
    println!("  latency_ms: {:.3}", seg.latency_ms);
    for stage in &diag.timings.stages {
        println!("    {}: {:.3} ms", stage.name, stage.elapsed_ms);
    }
}
