use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::{debug, LevelFilter};
use radx_features::{extract_path, FeatureVector};
use radx_model::{Engine, EngineConfig, PredictionResult};
use serde_json::json;

#[derive(Debug, Parser)]
#[command(
    name = "radx",
    version,
    about = "Heuristic triage of chest and skeletal radiographs",
    long_about = "radx extracts intensity, sharpness, noise and edge features from a\n\
        radiograph and maps them to a likely condition for the imaged region.\n\n\
        Output is a screening aid with a calibrated-looking confidence, not a diagnosis.\n\n\
        EXAMPLES:\n\
        \n  radx predict scan.png --region chest --age 64      Classify a chest film\n\
        \n  radx --seed 7 predict scan.png --region hand --json Reproducible JSON output\n\
        \n  radx features scan.png                             Show extracted features\n\
        \n  radx conditions spine                              List spine conditions"
)]
struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TOML engine configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed the confidence sampler (overrides the config file)
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify a radiograph
    Predict(PredictArgs),

    /// Draw from the region's adjusted prior table
    #[command(long_about = "Draw a condition from the region's prior table after demographic \
        and image-quality adjustment. Ignores the rule cascades.")]
    Prior(PredictArgs),

    /// Print the extracted feature vector
    Features(FeaturesArgs),

    /// List supported regions
    Regions,

    /// List the conditions a region can report
    Conditions {
        #[arg(value_name = "REGION")]
        region: String,
    },

    /// Print a region's model state as JSON
    Info {
        #[arg(value_name = "REGION")]
        region: String,
    },
}

#[derive(Debug, Args, Clone)]
struct PredictArgs {
    /// Radiograph image file (PNG or JPEG)
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// Imaged region (chest, hand, leg, skull, spine, pelvis)
    #[arg(short, long)]
    region: String,

    /// Patient age in years
    #[arg(long)]
    age: Option<u32>,

    /// Patient gender
    #[arg(long)]
    gender: Option<String>,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args, Clone)]
struct FeaturesArgs {
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    #[arg(long)]
    json: bool,
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::new();
    if std::env::var_os("RUST_LOG").is_some() {
        builder.parse_default_env();
    } else {
        let level = match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        builder.filter_level(level);
    }
    let _ = builder.try_init();
}

fn load_config(cli: &Cli) -> Result<EngineConfig, String> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };
    Ok(match cli.seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    })
}

fn result_json(image: &Path, region: &str, result: &PredictionResult) -> serde_json::Value {
    json!({
        "image": image.display().to_string(),
        "region": region,
        "prediction": result.label(),
        "confidence": result.confidence,
        "source": result.source,
        "features": result.features,
    })
}

fn write_result(out: &mut dyn Write, args: &PredictArgs, result: &PredictionResult) -> io::Result<()> {
    if args.json {
        let value = result_json(&args.image, &args.region, result);
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)
    } else {
        writeln!(
            out,
            "{}: {} ({:.1}% confidence, via {})",
            args.image.display(),
            result.label(),
            result.confidence * 100.0,
            result.source
        )
    }
}

fn write_features(out: &mut dyn Write, features: &FeatureVector, as_json: bool) -> io::Result<()> {
    if as_json {
        return writeln!(out, "{}", serde_json::to_string_pretty(features)?);
    }
    writeln!(out, "brightness          {:.2}", features.brightness)?;
    writeln!(out, "contrast            {:.2}", features.contrast)?;
    writeln!(out, "sharpness           {:.3}", features.sharpness)?;
    writeln!(out, "noise_level         {:.3}", features.noise_level)?;
    writeln!(out, "quality             {}", features.quality)?;
    writeln!(out, "dark_ratio          {:.3}", features.dark_ratio)?;
    writeln!(out, "bright_patch_ratio  {:.3}", features.bright_patch_ratio)?;
    writeln!(out, "bone_density        {:.3}", features.bone_density)?;
    writeln!(out, "abnormal_density    {:.3}", features.abnormal_density)?;
    let hints: Vec<&str> = features.hints.iter().map(|h| h.as_str()).collect();
    writeln!(out, "hints               [{}]", hints.join(", "))
}

fn execute(cli: &Cli, out: &mut dyn Write) -> io::Result<i32> {
    if let Command::Features(args) = &cli.command {
        write_features(out, &extract_path(&args.image), args.json)?;
        return Ok(0);
    }

    let config = match load_config(cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(2);
        }
    };
    debug!("engine config: {config:?}");
    let engine = match Engine::from_config(&config) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(2);
        }
    };

    match &cli.command {
        Command::Predict(args) => {
            let result = engine.predict(&args.image, &args.region, args.age, args.gender.as_deref());
            write_result(out, args, &result)?;
        }
        Command::Prior(args) => {
            match engine.sample_prior(&args.image, &args.region, args.age, args.gender.as_deref()) {
                Ok(result) => write_result(out, args, &result)?,
                Err(e) => {
                    eprintln!("error: {e}");
                    return Ok(1);
                }
            }
        }
        Command::Regions => {
            for region in engine.get_supported_regions() {
                writeln!(out, "{region}")?;
            }
        }
        Command::Conditions { region } => {
            for condition in engine.get_possible_conditions(region) {
                writeln!(out, "{condition}")?;
            }
        }
        Command::Info { region } => match engine.get_model_info(region) {
            Some(state) => writeln!(out, "{}", serde_json::to_string_pretty(&state)?)?,
            None => {
                eprintln!("error: unsupported region '{region}'");
                return Ok(1);
            }
        },
        Command::Features(_) => {}
    }
    Ok(0)
}

fn run_cli() -> i32 {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let stdout = io::stdout();
    match execute(&cli, &mut stdout.lock()) {
        Ok(rc) => rc,
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}

fn main() {
    std::process::exit(run_cli());
}
