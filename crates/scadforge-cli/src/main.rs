//! CLI binary for generating, validating, repairing, and exporting OpenSCAD
//! models.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use scadforge_analysis::{analyze, repair, validate};
use scadforge_oracle::OracleChain;
use scadforge_pipeline::{GenerationLoop, JsonSessionStore};
use scadforge_render::Exporter;

#[derive(Parser)]
#[command(name = "scadforge", version, about = "Natural-language to OpenSCAD model generation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an OpenSCAD model from a prompt
    Generate {
        /// What to model, in plain language
        prompt: String,

        /// Output .scad file (default: exports/model.scad)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum generation attempts before settling for best effort
        #[arg(long, default_value = "3")]
        max_attempts: usize,

        /// Sampling temperature for the generation backend
        #[arg(long, default_value = "0.2")]
        temperature: f32,

        /// Also render the result to STL next to the .scad file
        #[arg(long)]
        export_stl: bool,
    },

    /// Validate an OpenSCAD file
    Validate {
        /// Path to the .scad file
        file: PathBuf,

        /// Also render with the OpenSCAD CLI to catch deeper errors
        #[arg(long)]
        render: bool,
    },

    /// Apply the automatic repair passes to a file and print the result
    Repair {
        /// Path to the .scad file
        file: PathBuf,

        /// Write the repaired code back instead of printing it
        #[arg(short, long)]
        in_place: bool,
    },

    /// Report complexity metrics for a file
    Analyze {
        /// Path to the .scad file
        file: PathBuf,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a .scad file to STL
    Export {
        /// Path to the .scad file
        file: PathBuf,

        /// Output .stl path (default: exports/<stem>.stl)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Generate {
            prompt,
            output,
            max_attempts,
            temperature,
            export_stl,
        } => {
            cmd_generate(&prompt, output.as_deref(), max_attempts, temperature, export_stl).await?;
        }
        Commands::Validate { file, render } => {
            cmd_validate(&file, render).await?;
        }
        Commands::Repair { file, in_place } => {
            cmd_repair(&file, in_place)?;
        }
        Commands::Analyze { file, json } => {
            cmd_analyze(&file, json)?;
        }
        Commands::Export { file, output } => {
            cmd_export(&file, output.as_deref()).await?;
        }
    }

    Ok(())
}

async fn cmd_generate(
    prompt: &str,
    output: Option<&Path>,
    max_attempts: usize,
    temperature: f32,
    export_stl: bool,
) -> anyhow::Result<()> {
    let chain = OracleChain::from_env()?;
    tracing::info!(backends = ?chain.backends(), "oracle chain ready");

    let exporter = Exporter::new("exports")?;
    let store = JsonSessionStore::new("exports")?;

    let session = GenerationLoop::new(chain)
        .with_max_attempts(max_attempts)
        .with_temperature(temperature)
        .with_store(store)
        .run(prompt)
        .await?;

    let scad_path = match output {
        Some(path) => {
            std::fs::write(path, &session.final_code)?;
            path.to_path_buf()
        }
        None => exporter.save_scad_file(&session.final_code, "model")?,
    };

    println!("Wrote {}", scad_path.display());
    println!(
        "Attempts: {}/{}  Valid: {}",
        session.attempts.len(),
        session.max_attempts,
        session.final_validity
    );
    if let Some(last) = session.attempts.last() {
        if !last.result.valid {
            println!("Last validation message: {}", last.result.message);
        }
    }

    if export_stl {
        let stl_name = scad_path.with_extension("stl");
        let outcome = exporter
            .export_stl(&session.final_code, Some(&stl_name))
            .await?;
        if outcome.used_fallback {
            println!(
                "Exported {} (fallback model used due to errors)",
                outcome.stl_path.display()
            );
        } else {
            println!("Exported {}", outcome.stl_path.display());
        }
    }

    Ok(())
}

async fn cmd_validate(file: &Path, render: bool) -> anyhow::Result<()> {
    let code = std::fs::read_to_string(file)?;

    let result = if render {
        use scadforge_render::{validate_with_render, OpenScadRenderer, Renderer};

        let renderer = OpenScadRenderer::new();
        if !renderer.check_available().await {
            anyhow::bail!("OpenSCAD CLI not found. Please install OpenSCAD.");
        }
        validate_with_render(&code, &renderer).await?
    } else {
        validate(&code)
    };

    if result.valid {
        println!("{}", result.message);
    } else {
        println!("INVALID: {}", result.message);
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_repair(file: &Path, in_place: bool) -> anyhow::Result<()> {
    let code = std::fs::read_to_string(file)?;
    let repaired = repair(&code);
    if in_place {
        std::fs::write(file, &repaired)?;
        println!("Repaired {}", file.display());
    } else {
        print!("{repaired}");
    }
    Ok(())
}

fn cmd_analyze(file: &Path, json: bool) -> anyhow::Result<()> {
    let code = std::fs::read_to_string(file)?;
    let report = analyze(&code);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Primitives:  {}", report.primitives_count);
    println!("Operations:  {}", report.operations_count);
    println!("Modules:     {}", report.modules_count);
    println!("Variables:   {}", report.variables_count);
    println!("Score:       {:.1}", report.complexity_score);
    println!("Render time: {}", report.render_time_estimate);
    for rec in &report.recommendations {
        println!("  - {rec}");
    }
    Ok(())
}

async fn cmd_export(file: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let code = std::fs::read_to_string(file)?;
    let exporter = Exporter::new("exports")?;

    let stl = match output {
        Some(path) => Some(path.to_path_buf()),
        None => file
            .file_stem()
            .map(|stem| PathBuf::from(stem).with_extension("stl")),
    };

    let outcome = exporter.export_stl(&code, stl.as_deref()).await?;
    if outcome.used_fallback {
        println!(
            "Exported {} (fallback model used due to errors)",
            outcome.stl_path.display()
        );
    } else {
        println!("Exported {}", outcome.stl_path.display());
    }
    Ok(())
}
