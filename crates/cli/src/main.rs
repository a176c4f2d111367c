use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use visionprep_core::embedding::infrastructure::execution_provider::ExecutionTarget;
use visionprep_core::embedding::infrastructure::onnx_embedder::OnnxEmbedder;
use visionprep_core::imaging::domain::image_reader::ImageReader;
use visionprep_core::imaging::infrastructure::image_collector::collect_images;
use visionprep_core::imaging::infrastructure::image_file_reader::ImageFileReader;
use visionprep_core::pipeline::embed_image_use_case::{EmbedImageUseCase, EmbeddingRecord};
use visionprep_core::pipeline::preprocess_image_use_case::PreprocessImageUseCase;
use visionprep_core::preprocessing::domain::image_preprocessor::{ImagePreprocessor, PreparedTensor};
use visionprep_core::preprocessing::domain::preprocess_config::{EdgeRounding, PreprocessConfig};
use visionprep_core::preprocessing::infrastructure::config_file::load_config;
use visionprep_core::shared::constants::{DINOV2_EMBEDDING_DIM, DINOV2_MODEL_NAME};
use visionprep_core::shared::model_resolver;

/// Image preprocessing and embedding inference for vision transformers.
#[derive(Parser)]
#[command(name = "visionprep", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the size and channel count of images.
    Inspect {
        /// Image files or directories.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Preprocess one image and report (or save) the model input tensor.
    Preprocess {
        /// Input image file.
        input: PathBuf,

        #[command(flatten)]
        preprocess: PreprocessArgs,

        /// Write the tensor and its geometry as JSON.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run images through an ONNX embedding model.
    Embed(EmbedArgs),
}

#[derive(Args)]
struct PreprocessArgs {
    /// JSON file with preprocessing settings (size, stats, rounding).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Side length of the square model input; overrides the config file.
    #[arg(long)]
    size: Option<u32>,

    /// Truncate the scaled long edge instead of rounding it.
    #[arg(long)]
    truncate: bool,
}

#[derive(Args)]
struct EmbedArgs {
    /// Image files or directories.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// ONNX model file.
    #[arg(long, conflicts_with = "model_name")]
    model: Option<PathBuf>,

    /// Model file name in the cache directory.
    #[arg(long, default_value = DINOV2_MODEL_NAME)]
    model_name: String,

    /// Download URL used when the model is not cached.
    #[arg(long)]
    model_url: Option<String>,

    /// Execution provider.
    #[arg(long, value_enum, default_value = "auto")]
    provider: Provider,

    /// GPU ordinal for the cuda and tensorrt providers.
    #[arg(long, default_value = "0")]
    device_id: i32,

    #[command(flatten)]
    preprocess: PreprocessArgs,

    /// Expected embedding length (0 disables the check).
    #[arg(long, default_value_t = DINOV2_EMBEDDING_DIM)]
    expected_dim: usize,

    /// L2-normalize embeddings.
    #[arg(long)]
    normalize: bool,

    /// Write embeddings as JSON instead of printing them.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Provider {
    Auto,
    Cpu,
    Cuda,
    Tensorrt,
}

#[derive(Serialize)]
struct TensorDump<'a> {
    input: &'a Path,
    shape: [usize; 4],
    source_size: (u32, u32),
    resized_size: (u32, u32),
    crop_origin: (u32, u32),
    values: &'a [f32],
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Inspect { inputs } => run_inspect(&inputs),
        Command::Preprocess {
            input,
            preprocess,
            output,
        } => run_preprocess(&input, &preprocess, output.as_deref()),
        Command::Embed(args) => run_embed(&args),
    }
}

fn run_inspect(inputs: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let reader = ImageFileReader::new();
    let paths = expand_inputs(inputs)?;
    log::info!("There are {} images to inspect", paths.len());
    let mut failed = 0;
    for path in &paths {
        match reader.info(path) {
            Ok(info) => println!("{}: {info}", path.display()),
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(format!("{failed} of {} images could not be read", paths.len()).into());
    }
    Ok(())
}

fn run_preprocess(
    input: &Path,
    args: &PreprocessArgs,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    validate_input(input)?;
    let preprocessor = build_preprocessor(args)?;
    let use_case = PreprocessImageUseCase::new(Box::new(ImageFileReader::new()), preprocessor);
    let prepared = use_case.execute(input)?;

    print_summary(input, &prepared);
    if let Some(path) = output {
        let side = prepared.size as usize;
        let dump = TensorDump {
            input,
            shape: [1, 3, side, side],
            source_size: prepared.source_size,
            resized_size: prepared.resized_size,
            crop_origin: prepared.crop_origin,
            values: &prepared.values,
        };
        write_json(path, &dump)?;
        log::info!("Tensor written to {}", path.display());
    }
    Ok(())
}

fn run_embed(args: &EmbedArgs) -> Result<(), Box<dyn std::error::Error>> {
    let paths = expand_inputs(&args.inputs)?;
    if paths.is_empty() {
        return Err("No images found in the given inputs".into());
    }

    let preprocessor = build_preprocessor(&args.preprocess)?;
    let preprocess = PreprocessImageUseCase::new(Box::new(ImageFileReader::new()), preprocessor);
    let embedder = build_embedder(args)?;
    if let Some(model_size) = embedder.input_size() {
        let size = preprocess.preprocessor().config().size;
        if model_size != size {
            log::warn!("Model expects {model_size}x{model_size} input but preprocessing produces {size}x{size}");
        }
    }

    let mut use_case = EmbedImageUseCase::new(preprocess, Box::new(embedder), args.normalize);
    let records = use_case.execute_all(&paths)?;

    match &args.output {
        Some(path) => {
            write_json(path, &records)?;
            log::info!("{} embeddings written to {}", records.len(), path.display());
        }
        None => print_records(&records),
    }
    Ok(())
}

fn build_preprocessor(args: &PreprocessArgs) -> Result<ImagePreprocessor, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => PreprocessConfig::default(),
    };
    if let Some(size) = args.size {
        config = config.with_size(size);
    }
    if args.truncate {
        config = config.with_rounding(EdgeRounding::Truncate);
    }
    log::debug!("Preprocessing config: {config:?}");
    Ok(ImagePreprocessor::new(config)?)
}

fn build_embedder(args: &EmbedArgs) -> Result<OnnxEmbedder, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {}", args.model_name);
    let model_path = model_resolver::resolve(
        &args.model_name,
        args.model.as_deref(),
        args.model_url.as_deref(),
        Some(Box::new(download_progress)),
    )?;

    let target = match args.provider {
        Provider::Auto => ExecutionTarget::Auto,
        Provider::Cpu => ExecutionTarget::Cpu,
        Provider::Cuda => ExecutionTarget::Cuda {
            device_id: args.device_id,
        },
        Provider::Tensorrt => ExecutionTarget::TensorRt {
            device_id: args.device_id,
        },
    };
    let expected_dim = (args.expected_dim > 0).then_some(args.expected_dim);
    OnnxEmbedder::new(&model_path, target, expected_dim)
}

fn validate_input(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    Ok(())
}

fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();
    for input in inputs {
        paths.extend(collect_images(input)?);
    }
    Ok(paths)
}

fn print_summary(input: &Path, prepared: &PreparedTensor) {
    let (sw, sh) = prepared.source_size;
    let (rw, rh) = prepared.resized_size;
    let (cx, cy) = prepared.crop_origin;
    let side = prepared.size;
    println!("{}: {sw}x{sh} -> {rw}x{rh}, crop at ({cx}, {cy})", input.display());
    println!("tensor shape [1, 3, {side}, {side}], {} values", prepared.values.len());
    for c in 0..3 {
        let Some(plane) = prepared.channel(c) else {
            break;
        };
        let mean = plane.iter().sum::<f32>() / plane.len() as f32;
        let (min, max) = plane
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        println!("  channel {c}: min {min:.4}, max {max:.4}, mean {mean:.4}");
    }
}

fn print_records(records: &[EmbeddingRecord]) {
    println!("Model inference completed successfully.");
    for record in records {
        if records.len() > 1 {
            println!("{} ({} values):", record.path.display(), record.dimension);
        }
        let line: Vec<String> = record.values.iter().map(|v| v.to_string()).collect();
        println!("{}", line.join(", "));
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string(value)?)?;
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading embedding model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading embedding model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_embed_defaults() {
        let cli = Cli::try_parse_from(["visionprep", "embed", "truck.jpg"]).unwrap();
        let Command::Embed(args) = cli.command else {
            panic!("expected embed");
        };
        assert_eq!(args.model_name, DINOV2_MODEL_NAME);
        assert_eq!(args.expected_dim, 768);
        assert!(matches!(args.provider, Provider::Auto));
        assert!(args.preprocess.size.is_none());
    }

    #[test]
    fn test_model_and_model_name_conflict() {
        let result = Cli::try_parse_from([
            "visionprep",
            "embed",
            "a.jpg",
            "--model",
            "m.onnx",
            "--model-name",
            "other.onnx",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_preprocess_flags_override_defaults() {
        let args = PreprocessArgs {
            config: None,
            size: Some(224),
            truncate: true,
        };
        let preprocessor = build_preprocessor(&args).unwrap();
        assert_eq!(preprocessor.config().size, 224);
        assert_eq!(preprocessor.config().rounding, EdgeRounding::Truncate);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let args = PreprocessArgs {
            config: None,
            size: Some(0),
            truncate: false,
        };
        assert!(build_preprocessor(&args).is_err());
    }

    #[test]
    fn test_inspect_fails_when_an_image_is_unreadable() {
        let tmp = tempfile::TempDir::new().unwrap();
        let broken = tmp.path().join("broken.png");
        std::fs::write(&broken, b"not a png").unwrap();
        let err = run_inspect(&[broken]).unwrap_err();
        assert_eq!(err.to_string(), "1 of 1 images could not be read");
    }

    #[test]
    fn test_inspect_reads_valid_images() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("ok.png");
        image::RgbImage::new(4, 3).save(&path).unwrap();
        assert!(run_inspect(&[path]).is_ok());
    }

    #[test]
    fn test_validate_missing_input() {
        let err = validate_input(Path::new("/nonexistent/truck.jpg")).unwrap_err();
        assert!(err.to_string().starts_with("Input file not found"));
    }
}
