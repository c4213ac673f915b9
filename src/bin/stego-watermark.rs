use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use stego_watermark::resample::DEFAULT_MAX_DIMENSION;
use stego_watermark::{
    compress, default_output_path, verify_file, CompressOptions, Error,
    ProcessOptions, ProcessResult, WatermarkEngine,
};

#[derive(Parser)]
#[command(
    name = "stego-watermark",
    about = "Embed and extract invisible LSB provenance watermarks",
    version,
    after_help = "Simple usage: stego-watermark embed <image> -t <text>  (writes {name}_marked.png)\n\n\
                  NOTE: The watermark lives in the lowest bit of each colour channel.\n\
                  It does not survive JPEG or any other lossy re-encoding."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Embed a watermark into an image file or every image in a directory
    Embed(EmbedArgs),
    /// Print the watermark hidden in an image
    Extract {
        /// Watermarked image file
        input: PathBuf,
    },
    /// Downscale and re-encode an image for upload
    Compress(CompressArgs),
}

#[derive(Args)]
struct EmbedArgs {
    /// Input image file or directory
    input: PathBuf,

    /// Output file or directory (default: {name}_marked.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Text to embed
    #[arg(short, long)]
    text: String,

    /// Downscale landscape images wider than this before embedding
    #[arg(long)]
    max_width: Option<u32>,

    /// Downscale portrait images taller than this before embedding
    #[arg(long)]
    max_height: Option<u32>,

    /// Re-read each written file and check the watermark
    #[arg(long)]
    verify: bool,
}

#[derive(Args)]
struct CompressArgs {
    /// Input image file
    input: PathBuf,

    /// Output file; receives a data URL instead of raw bytes with --data-url
    #[arg(short, long)]
    output: PathBuf,

    /// Maximum width for landscape images
    #[arg(long, default_value_t = DEFAULT_MAX_DIMENSION)]
    max_width: u32,

    /// Maximum height for portrait and square images
    #[arg(long, default_value_t = DEFAULT_MAX_DIMENSION)]
    max_height: u32,

    /// JPEG quality (0.0-1.0)
    #[arg(long, default_value = "0.85")]
    quality: f32,

    /// Write a base64 data URL instead of the encoded image
    #[arg(long)]
    data_url: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Embed(args) => run_embed(args, cli.verbose, cli.quiet),
        Command::Extract { input } => run_extract(&input),
        Command::Compress(args) => run_compress(&args, cli.quiet),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run_embed(args: EmbedArgs, verbose: bool, quiet: bool) {
    let max_size = match (args.max_width, args.max_height) {
        (None, None) => None,
        (w, h) => Some((
            w.unwrap_or(DEFAULT_MAX_DIMENSION),
            h.unwrap_or(DEFAULT_MAX_DIMENSION),
        )),
    };

    let opts = ProcessOptions {
        max_size,
        verify: args.verify,
        verbose,
        quiet,
    };

    if !args.input.exists() {
        eprintln!("Error: Input path does not exist: {}", args.input.display());
        process::exit(1);
    }

    let engine = WatermarkEngine::new(args.text);

    let results = if args.input.is_dir() {
        let Some(output_dir) = args.output else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: stego-watermark embed <input_dir> -t <text> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(&args.input, &output_dir, &opts)
    } else {
        let output_path = args
            .output
            .unwrap_or_else(|| default_output_path(&args.input));
        vec![engine.process_file(&args.input, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Marked: {success_count}");
        if skip_count > 0 {
            eprint!(", Copied unmarked: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn run_extract(input: &Path) {
    match verify_file(input) {
        Ok(text) => println!("{text}"),
        Err(Error::PayloadNotFound) => {
            eprintln!("No watermark found in {}", input.display());
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run_compress(args: &CompressArgs, quiet: bool) {
    if !(0.0..=1.0).contains(&args.quality) {
        eprintln!("Error: Quality must be between 0.0 and 1.0");
        process::exit(1);
    }

    let opts = CompressOptions {
        max_width: args.max_width,
        max_height: args.max_height,
        quality: args.quality,
    };

    let written = fs::read(&args.input)
        .map_err(Error::from)
        .and_then(|bytes| compress(&bytes, &opts))
        .and_then(|compressed| {
            if args.data_url {
                fs::write(&args.output, compressed.data_url())?;
            } else {
                if !compressed.matches_extension(&args.output) {
                    log::warn!(
                        "writing {} data to {} (extension does not match)",
                        compressed.mime_type,
                        args.output.display()
                    );
                }
                fs::write(&args.output, &compressed.bytes)?;
            }
            Ok(compressed)
        });

    match written {
        Ok(c) => {
            if !quiet {
                eprintln!(
                    "[OK] {} -> {} ({}x{}, {})",
                    args.input.display(),
                    args.output.display(),
                    c.width,
                    c.height,
                    c.mime_type
                );
            }
        }
        Err(e) => {
            eprintln!("[FAIL] {}: {e}", args.input.display());
            process::exit(1);
        }
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !opts.quiet {
            eprintln!("[UNMARKED] {filename}: {}", result.message);
        }
    } else if result.success {
        if !opts.quiet {
            eprintln!("[OK] {filename} ({} bits)", result.bits);
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
