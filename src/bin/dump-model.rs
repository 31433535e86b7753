use churnpred::classifier::Estimator;
use churnpred::{ModelArtifact, PredictError, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
struct Cli {
    /// The model artifact
    model: PathBuf,
    /// Print the whole artifact as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let model = ModelArtifact::load(&args.model)?;

    if args.json {
        let json = serde_json::to_string_pretty(&model)
            .map_err(|e| PredictError::model_load(&args.model, e))?;
        println!("{}", json);
        return Ok(());
    }

    println!("format version: {}", model.format_version);
    let classes: Vec<String> = model.classes.iter().map(|c| c.to_string()).collect();
    println!("classes: [{}]", classes.join(", "));

    for (column, encoder) in &model.encoders {
        println!("{}: {:?}", column, encoder);
    }
    println!("slots ({}): {}", model.width(), model.slot_names().join(", "));
    println!(
        "scaler: {}",
        if model.scaler.is_some() { "standard" } else { "none" }
    );

    match &model.estimator {
        Estimator::Linear(linear) => {
            println!("linear model, {} coefficient rows", linear.coef.len());
            let slots = model.slot_names();
            for (i, (w, b)) in linear.coef.iter().zip(&linear.intercept).enumerate() {
                println!("row {} intercept: {}", i, b);
                for (name, wt) in slots.iter().zip(w) {
                    if *wt != 0.0 {
                        println!("  {}: {}", name, wt);
                    }
                }
            }
        }
        Estimator::Forest(forest) => {
            let nodes: usize = forest.trees.iter().map(|t| t.nodes.len()).sum();
            println!("forest, {} trees, {} nodes", forest.trees.len(), nodes);
        }
    }

    Ok(())
}
