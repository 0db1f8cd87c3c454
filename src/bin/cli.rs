use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use std::env;
use std::path::PathBuf;
use wellpath::calibration::list_calibrations;
use wellpath::experiment::format_hms;
use wellpath::{
    generate_grid, generate_labels, parse_label, sequence, CalibrationRecord, ExperimentProfile,
    GridSize, OutputNaming, Pattern, PlateCorners, Point3, WellPathConfig,
};

const USAGE: &str = "Usage: wellpath-cli <command> [args] [--json] [--config <path>]

Commands:
  grid <width> <depth> <ul> <ll> <ur> <lr>      interpolate well centers (points as x,y,z)
  labels <width> <depth>                        list well labels
  parse-label <label>                           decode a label into 0-based row/col
  calibrate <name> <width> <depth> <ul> <ll> <ur> <lr>
                                                save a calibration
  list-calibrations                             list saved calibrations
  sequence <calibration> <pattern> [labels..|--all] [--csv <name>]
                                                order wells for a run
  plan <profile>                                validate a profile and estimate run time";

/// Flags shared by every command plus the remaining positional arguments.
struct Args {
    positional: Vec<String>,
    json: bool,
    all: bool,
    config: Option<PathBuf>,
    dir: Option<PathBuf>,
    csv: Option<String>,
}

fn parse_args(raw: &[String]) -> Result<Args> {
    let mut args = Args {
        positional: Vec::new(),
        json: false,
        all: false,
        config: None,
        dir: None,
        csv: None,
    };
    let mut i = 0;
    while i < raw.len() {
        match raw[i].as_str() {
            "--json" => args.json = true,
            "--all" => args.all = true,
            "--config" | "--dir" | "--csv" => {
                let flag = raw[i].clone();
                i += 1;
                let value = raw
                    .get(i)
                    .ok_or_else(|| anyhow!("{} requires a value", flag))?
                    .clone();
                match flag.as_str() {
                    "--config" => args.config = Some(PathBuf::from(value)),
                    "--dir" => args.dir = Some(PathBuf::from(value)),
                    _ => args.csv = Some(value),
                }
            }
            other => args.positional.push(other.to_string()),
        }
        i += 1;
    }
    Ok(args)
}

fn load_config(args: &Args) -> Result<WellPathConfig> {
    let path = args
        .config
        .clone()
        .unwrap_or_else(WellPathConfig::default_path);
    let config = WellPathConfig::load_layered(&path)
        .with_context(|| format!("loading configuration from {:?}", path))?;
    Ok(config)
}

fn positional<'a>(args: &'a Args, index: usize, name: &str) -> Result<&'a str> {
    args.positional
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing <{}>\n\n{}", name, USAGE))
}

fn parse_usize(args: &Args, index: usize, name: &str) -> Result<usize> {
    let raw = positional(args, index, name)?;
    raw.parse()
        .with_context(|| format!("<{}> must be a non-negative integer, got `{}`", name, raw))
}

fn parse_corners(args: &Args, start: usize) -> Result<PlateCorners> {
    let mut points = [Point3::default(); 4];
    for (offset, (slot, name)) in points
        .iter_mut()
        .zip(["ul", "ll", "ur", "lr"])
        .enumerate()
    {
        *slot = positional(args, start + offset, name)?
            .parse()
            .with_context(|| format!("parsing <{}>", name))?;
    }
    Ok(PlateCorners::new(points[0], points[1], points[2], points[3]))
}

fn main() -> Result<()> {
    let raw: Vec<String> = env::args().skip(1).collect();
    let Some(command) = raw.first().cloned() else {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    };
    let args = parse_args(&raw[1..])?;
    let config = load_config(&args)?;
    let level = config.logging.level_filter()?;
    wellpath::init_logging_with_level(level);

    match command.as_str() {
        "grid" => cmd_grid(&args),
        "labels" => cmd_labels(&args),
        "parse-label" => cmd_parse_label(&args),
        "calibrate" => cmd_calibrate(&args, &config),
        "list-calibrations" => cmd_list_calibrations(&args, &config),
        "sequence" => cmd_sequence(&args, &config),
        "plan" => cmd_plan(&args, &config),
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}\n\n{}", command, USAGE);
            std::process::exit(1);
        }
    }
}

fn cmd_grid(args: &Args) -> Result<()> {
    let width = parse_usize(args, 0, "width")?;
    let depth = parse_usize(args, 1, "depth")?;
    let c = parse_corners(args, 2)?;
    let positions = generate_grid(
        width,
        depth,
        c.upper_left,
        c.lower_left,
        c.upper_right,
        c.lower_right,
    )?;
    let labels = generate_labels(width, depth)?;

    if args.json {
        let rows: Vec<_> = labels.iter().zip(&positions).collect();
        println!("{}", serde_json::to_string(&rows)?);
    } else {
        for (label, p) in labels.iter().zip(&positions) {
            println!("{:>5}  {}", label, p);
        }
    }
    Ok(())
}

fn cmd_labels(args: &Args) -> Result<()> {
    let width = parse_usize(args, 0, "width")?;
    let depth = parse_usize(args, 1, "depth")?;
    let labels = generate_labels(width, depth)?;
    if args.json {
        println!("{}", serde_json::to_string(&labels)?);
    } else {
        for row in labels.chunks(width) {
            println!("{}", row.join(" "));
        }
    }
    Ok(())
}

fn cmd_parse_label(args: &Args) -> Result<()> {
    let label = positional(args, 0, "label")?;
    let parsed = parse_label(label);
    if args.json {
        let value = parsed.map(|(row, col)| serde_json::json!({ "row": row, "col": col }));
        println!("{}", serde_json::to_string(&value)?);
        return Ok(());
    }
    match parsed {
        Some((row, col)) => println!("{}: row {} col {}", label, row, col),
        None => bail!("`{}` is not a well label", label),
    }
    Ok(())
}

fn cmd_calibrate(args: &Args, config: &WellPathConfig) -> Result<()> {
    let name = positional(args, 0, "name")?;
    let width = parse_usize(args, 1, "width")?;
    let depth = parse_usize(args, 2, "depth")?;
    let corners = parse_corners(args, 3)?;

    let record = CalibrationRecord::new(name, corners, GridSize::new(width, depth)?)?;
    let dir = args
        .dir
        .clone()
        .unwrap_or_else(|| config.paths.calibration_dir.clone());
    let path = record.save_to_dir(&dir, Local::now().naive_local())?;

    if args.json {
        println!("{}", serde_json::json!({ "path": path, "wells": record.well_count() }));
    } else {
        println!("Saved {} wells to {}", record.well_count(), path.display());
    }
    Ok(())
}

fn cmd_list_calibrations(args: &Args, config: &WellPathConfig) -> Result<()> {
    let dir = args
        .dir
        .clone()
        .unwrap_or_else(|| config.paths.calibration_dir.clone());
    let names = list_calibrations(&dir)?;
    if args.json {
        println!("{}", serde_json::to_string(&names)?);
    } else if names.is_empty() {
        println!("No calibrations in {}", dir.display());
    } else {
        for name in names {
            println!("{}", name);
        }
    }
    Ok(())
}

fn cmd_sequence(args: &Args, config: &WellPathConfig) -> Result<()> {
    let file = positional(args, 0, "calibration")?;
    let pattern: Pattern = positional(args, 1, "pattern")?.parse()?;
    let calibration = CalibrationRecord::load_from_file(file)
        .with_context(|| format!("loading calibration {}", file))?;

    let selected: Vec<String> = if args.all {
        calibration.labels().to_vec()
    } else {
        args.positional[2..].to_vec()
    };
    if selected.is_empty() {
        bail!("no wells selected (pass labels or --all)");
    }

    let seq = sequence(&calibration, &selected, pattern);
    for label in &seq.skipped {
        eprintln!("warning: {} is not in the calibration, skipped", label);
    }

    if let Some(experiment) = &args.csv {
        let now = Local::now().naive_local();
        let naming = OutputNaming::new(experiment, now)?;
        let path = naming.save_points(&config.paths.outputs_dir, &seq, now)?;
        eprintln!("Points written to {}", path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string(&seq)?);
    } else {
        for (i, step) in seq.steps.iter().enumerate() {
            println!("{:>4}  {:>5}  {}", i + 1, step.label, step.position);
        }
        if let Some(z) = seq.z {
            println!("Z for all moves: {:.2}", z);
        }
    }
    Ok(())
}

fn cmd_plan(args: &Args, config: &WellPathConfig) -> Result<()> {
    let file = positional(args, 0, "profile")?;
    let profile = ExperimentProfile::load_from_file(file)?;
    let calibration_dir = args
        .dir
        .clone()
        .unwrap_or_else(|| config.paths.calibration_dir.clone());
    let calibration = profile
        .resolve_calibration(&calibration_dir)
        .with_context(|| format!("resolving {}", profile.calibration_file))?;
    let plan = profile.plan(&calibration)?;

    if args.json {
        println!("{}", serde_json::to_string(&plan)?);
    } else {
        println!(
            "Experiment '{}' on '{}' ({:?} capture)",
            plan.experiment_name, plan.calibration_name, plan.capture_mode
        );
        println!(
            "{} wells in {} order, {} skipped",
            plan.well_count(),
            plan.sequence.pattern,
            plan.sequence.skipped.len()
        );
        println!("Per well: {}", format_hms(plan.per_well_seconds));
        println!("Total:    {}", format_hms(plan.total_seconds));
    }
    Ok(())
}
