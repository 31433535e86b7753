use bytesize::ByteSize;
use churnpred::{ModelArtifact, PredictError, Result};
use clap::Parser;
use std::path::PathBuf;

/// Re-encode a model artifact; the output file name picks the format,
/// e.g. model.json -> model.bin.lz4
#[derive(Parser)]
struct Cli {
    input_file: PathBuf,
    output_file: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let model = ModelArtifact::load(&args.input_file)?;
    model.save(&args.output_file)?;

    let size = std::fs::metadata(&args.output_file)
        .map_err(|e| PredictError::model_load(&args.output_file, e))?
        .len();
    println!("{} ({})", args.output_file.display(), ByteSize::b(size));

    Ok(())
}
