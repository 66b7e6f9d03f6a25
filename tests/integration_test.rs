use cartpole_dqn::{
    agent::{DqnAgent, DqnAgentBuilder},
    cli,
    config::TrainConfig,
    env::{make_env, CartPole, Environment},
    metrics::{InMemoryRecorder, NullRecorder},
    optimizer::OptimizerKind,
    trainer::{train, MOVING_AVERAGE_TAG},
};
use ndarray::{array, Array1};

fn scenario_agent() -> DqnAgent {
    DqnAgentBuilder::new(4, 2)
        .hidden_sizes(&[16, 16])
        .capacity(100)
        .batch_size(8)
        .discount(0.99)
        .tau(0.01)
        .update_freq(4)
        .seed(1)
        .build()
        .unwrap()
}

#[test]
fn test_end_to_end_agent_steps() {
    fn get_state(step: usize) -> Array1<f32> {
        let t = step as f32;
        array![t / 20.0, (t / 5.0).sin(), (t / 7.0).cos(), -t / 40.0]
    }

    let mut agent = scenario_agent();
    let initial_target = agent.target().flat_parameters();

    let mut losses = Vec::new();
    for step in 0..20 {
        let state = get_state(step);
        let action = agent.select_action(state.view(), 0.1).unwrap();
        let reward = if action == step % 2 { 1.0 } else { 0.0 };
        let outcome = agent
            .step(state.view(), action, reward, get_state(step + 1).view(), false)
            .unwrap();
        losses.extend(outcome.loss);
    }

    assert_eq!(agent.buffer().len(), 20);
    assert_eq!(agent.t_train(), 20);
    // Learning starts once more than 8 transitions are stored
    assert_eq!(agent.learn_steps(), 12);
    assert_eq!(losses.len(), 12);
    assert!(losses.iter().all(|l| l.is_finite()));
    assert_eq!(agent.target_syncs(), 5);
    assert_ne!(agent.target().flat_parameters(), initial_target);
    assert_ne!(agent.target().flat_parameters(), agent.online().flat_parameters());
}

#[test]
fn test_same_seed_same_run() {
    let run = || {
        let mut agent = scenario_agent();
        let mut env = CartPole::new();
        let mut state = env.reset(Some(3));
        let mut actions = Vec::new();
        for _ in 0..30 {
            let action = agent.select_action(state.view(), 0.5).unwrap();
            let step = env.step(action).unwrap();
            agent
                .step(state.view(), action, step.reward, step.next_state.view(), step.done())
                .unwrap();
            actions.push(action);
            state = if step.done() { env.reset(None) } else { step.next_state };
        }
        (actions, agent.online().flat_parameters())
    };

    assert_eq!(run(), run());
}

#[test]
fn test_short_cartpole_training_run() {
    let config = TrainConfig {
        n_episodes: 6,
        batch_size: 16,
        max_size: 1_000,
        hidden_sizes: vec![16],
        log_interval: 2,
        moving_window: 3,
        learning_rate: 1e-3,
        ..Default::default()
    };
    let mut env = make_env(&config.env).unwrap();
    let mut agent = DqnAgent::new(config.agent_config(env.state_dim(), env.action_dim())).unwrap();
    let mut recorder = InMemoryRecorder::new();

    let report = train(env.as_mut(), &mut agent, &config.train_settings().unwrap(), &mut recorder).unwrap();

    assert_eq!(report.episodes(), 6);
    assert!(report.scores.iter().all(|&s| s >= 1.0 && s <= 500.0));
    assert_eq!(report.total_steps as f32, report.scores.iter().sum::<f32>());
    assert_eq!(agent.buffer().len() as u64, report.total_steps.min(1_000));
    assert!(report.final_epsilon < config.epsilon_start);
    assert!(report.final_epsilon >= config.epsilon_end);

    let averages: Vec<u64> = recorder.values(MOVING_AVERAGE_TAG).iter().map(|&(e, _)| e).collect();
    assert_eq!(averages, vec![0, 2, 4]);
}

#[test]
fn test_run_from_config_file_writes_csv() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    let metrics_dir = dir.path().join("runs");
    std::fs::write(
        &config_path,
        format!(
            r#"{{"n_episodes": 3, "hidden_sizes": [8], "batch_size": 8, "optimizer": "sgd", "log_interval": 1, "metrics_dir": {:?}}}"#,
            metrics_dir.to_str().unwrap()
        ),
    )
    .unwrap();

    let config = TrainConfig::from_json_file(&config_path).unwrap();
    assert_eq!(config.optimizer, OptimizerKind::Sgd);
    config.validate().unwrap();

    let report = cli::run(&config).unwrap();
    assert_eq!(report.episodes(), 3);

    let csv = std::fs::read_to_string(metrics_dir.join("CartPole-v1-seed0").join("scalars.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("step,tag,value,wall_time"));
    let moving_average_rows = lines.filter(|l| l.contains(MOVING_AVERAGE_TAG)).count();
    assert_eq!(moving_average_rows, 3);
}

#[test]
fn test_trainer_rejects_mismatched_agent() {
    let mut env = CartPole::new();
    let mut agent = DqnAgentBuilder::new(3, 2).build().unwrap();
    let config = TrainConfig { n_episodes: 1, ..Default::default() };
    let result = train(&mut env, &mut agent, &config.train_settings().unwrap(), &mut NullRecorder);
    assert!(result.is_err());
}
