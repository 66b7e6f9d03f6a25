use {
    anyhow::{Context, Result},
    cartpole_dqn::{
        cli::Args,
        logging::setup_logging,
    },
    clap::Parser,
};

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(level) = args.log_level.level() {
        setup_logging(level, args.log_file.as_deref())?;
    }

    let config = args.train_config().context("invalid training configuration")?;
    let report = cartpole_dqn::cli::run(&config)?;

    if let Some(average) = report.final_moving_average {
        println!(
            "Finished {} episodes ({} steps). Average episodic reward over the last {} episodes: {:.2}",
            report.episodes(),
            report.total_steps,
            config.moving_window.min(report.episodes()),
            average,
        );
    }
    Ok(())
}
