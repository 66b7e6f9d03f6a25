use {
    crate::{
        activations::Activation,
        agent::DqnAgent,
        config::TrainConfig,
        env::make_env,
        error::Result,
        metrics::{MultiRecorder, ScalarWriter, TracingRecorder},
        optimizer::OptimizerKind,
        trainer::{train, TrainingReport},
    },
    clap::{
        Parser,
        ValueEnum,
    },
    std::path::PathBuf,
    tracing::{info, Level},
};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loglevel {
    Error,
    Warn,
    Info,  // progress reports
    Debug, // every episode and target sync
    None,  // don't log anything
}
impl Loglevel {
    pub fn level(&self) -> Option<Level> {
        match self {
            Loglevel::Error => Some(Level::ERROR),
            Loglevel::Warn => Some(Level::WARN),
            Loglevel::Info => Some(Level::INFO),
            Loglevel::Debug => Some(Level::DEBUG),
            Loglevel::None => None,
        }
    }
}

/// Train a DQN agent on CartPole.
///
/// Flags override the values from `--config`, which override the defaults.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON file with training settings.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Setup logging
    #[arg(long, value_enum, default_value_t=Loglevel::Info)]
    pub log_level: Loglevel,

    /// Also write the log to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Environment name.
    #[arg(long)]
    pub env: Option<String>,

    /// Seed for the environment, network initialization and sampling.
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub n_episodes: Option<usize>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Discount factor.
    #[arg(long)]
    pub discount: Option<f32>,

    #[arg(long, alias = "lr")]
    pub learning_rate: Option<f32>,

    /// Target network update rate.
    #[arg(long)]
    pub tau: Option<f32>,

    /// Replay buffer capacity.
    #[arg(long)]
    pub max_size: Option<usize>,

    /// Steps between target network updates.
    #[arg(long)]
    pub update_freq: Option<usize>,

    #[arg(long)]
    pub max_episode_len: Option<usize>,

    #[arg(long)]
    pub epsilon_start: Option<f32>,

    #[arg(long)]
    pub epsilon_end: Option<f32>,

    #[arg(long)]
    pub epsilon_decay: Option<f32>,

    /// Hidden layer widths, e.g. `--hidden-sizes 128,128`.
    #[arg(long, value_delimiter = ',')]
    pub hidden_sizes: Option<Vec<usize>>,

    /// Nonlinearity of the hidden layers. The weight init is set in `--config`.
    #[arg(long, value_enum)]
    pub hidden_activation: Option<Activation>,

    #[arg(long, value_enum)]
    pub optimizer: Option<OptimizerKind>,

    /// Also update the target network after every learning step.
    #[arg(long)]
    pub sync_every_learn: bool,

    /// Episodes between progress reports.
    #[arg(long)]
    pub log_interval: Option<usize>,

    #[arg(long)]
    pub moving_window: Option<usize>,

    /// Directory for the CSV scalar log.
    #[arg(long)]
    pub metrics_dir: Option<PathBuf>,
}

impl Args {
    /// The effective configuration: defaults, then `--config`, then flags.
    pub fn train_config(&self) -> Result<TrainConfig> {
        let mut config = match &self.config {
            Some(path) => TrainConfig::from_json_file(path)?,
            None => TrainConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overwrite every field of `config` given on the command line.
    pub fn apply(&self, config: &mut TrainConfig) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }

        set(&mut config.env, &self.env);
        set(&mut config.seed, &self.seed);
        set(&mut config.n_episodes, &self.n_episodes);
        set(&mut config.batch_size, &self.batch_size);
        set(&mut config.discount, &self.discount);
        set(&mut config.learning_rate, &self.learning_rate);
        set(&mut config.tau, &self.tau);
        set(&mut config.max_size, &self.max_size);
        set(&mut config.update_freq, &self.update_freq);
        set(&mut config.max_episode_len, &self.max_episode_len);
        set(&mut config.epsilon_start, &self.epsilon_start);
        set(&mut config.epsilon_end, &self.epsilon_end);
        set(&mut config.epsilon_decay, &self.epsilon_decay);
        set(&mut config.hidden_sizes, &self.hidden_sizes);
        set(&mut config.hidden_activation, &self.hidden_activation);
        set(&mut config.optimizer, &self.optimizer);
        set(&mut config.log_interval, &self.log_interval);
        set(&mut config.moving_window, &self.moving_window);
        if self.sync_every_learn {
            config.sync_every_learn = true;
        }
        if self.metrics_dir.is_some() {
            config.metrics_dir = self.metrics_dir.clone();
        }
    }
}

/// Build the environment and agent described by `config` and train.
pub fn run(config: &TrainConfig) -> Result<TrainingReport> {
    let mut env = make_env(&config.env)?;
    let mut agent = DqnAgent::new(config.agent_config(env.state_dim(), env.action_dim()))?;
    let settings = config.train_settings()?;

    let mut recorder = MultiRecorder::new().with(Box::new(TracingRecorder));
    if let Some(dir) = &config.metrics_dir {
        let run_name = format!("{}-seed{}", config.env, config.seed);
        let writer = ScalarWriter::new(dir, &run_name)?;
        info!(path = %writer.csv_path().display(), "writing scalars");
        recorder = recorder.with(Box::new(writer));
    }

    info!(env = %config.env, episodes = config.n_episodes, seed = config.seed, "starting training");
    let report = train(env.as_mut(), &mut agent, &settings, &mut recorder)?;
    info!(
        episodes = report.episodes(),
        steps = report.total_steps,
        learn_steps = report.learn_steps,
        final_epsilon = report.final_epsilon,
        "training finished"
    );
    Ok(report)
}
