//! tabprep - Main Entry Point

use clap::Parser;
use tabprep::cli::{cmd_apply, cmd_inspect, cmd_profile, cmd_transform, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabprep=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Transform {
            train,
            test,
            validation_artifact,
            config,
            target,
            artifact_root,
            final_model_dir,
        } => {
            cmd_transform(
                train.as_deref(),
                test.as_deref(),
                validation_artifact.as_deref(),
                config.as_deref(),
                target.as_deref(),
                &artifact_root,
                final_model_dir.as_deref(),
            )?;
        }
        Commands::Profile { data, target, skew_threshold } => {
            cmd_profile(&data, target.as_deref(), skew_threshold)?;
        }
        Commands::Inspect { preprocessor } => {
            cmd_inspect(&preprocessor)?;
        }
        Commands::Apply { preprocessor, data, output, target, label_encoder } => {
            cmd_apply(&preprocessor, &data, &output, target.as_deref(), label_encoder.as_deref())?;
        }
    }

    Ok(())
}
