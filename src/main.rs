use burn::backend::NdArray;
use dotenv::dotenv;
use fightbot::agent::{AnyPredictor, ControlLoop};
use fightbot::infra::{
    AgentConfig, ChannelPauseTrigger, ConfigurationError, LoggingKeyInjector, ReplayProvider,
    SharedView, VisualizingObserver,
};
use fightbot::ui::run_visualizer;
use std::sync::{Arc, Mutex, mpsc};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

type Backend = NdArray;

type AgentLoop =
    ControlLoop<AnyPredictor<Backend>, ReplayProvider, LoggingKeyInjector, ChannelPauseTrigger>;

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fightbot=debug,info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn build_loop(config: &AgentConfig) -> Result<AgentLoop, ConfigurationError> {
    let replay_path = config
        .replay_path
        .as_deref()
        .ok_or(ConfigurationError::MissingSetting("FIGHTBOT_REPLAY"))?;

    let mut predictor = AnyPredictor::<Backend>::new(Default::default(), config.predictor.clone())?;
    match &config.model_path {
        Some(path) => predictor = predictor.load_weights(path)?,
        None => tracing::warn!("FIGHTBOT_MODEL_PATH not set, running with untrained weights"),
    }

    let mut provider = ReplayProvider::open(replay_path)?;
    if let Some(delay) = config.frame_delay {
        provider = provider.with_frame_delay(delay);
    }

    ControlLoop::new(
        predictor,
        provider,
        LoggingKeyInjector::new(),
        ChannelPauseTrigger::from_stdin(),
        config.threshold,
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging();

    let config = AgentConfig::from_env()?;

    tracing::info!("Predictor: {} {:?}", config.predictor.mode, config.predictor.hidden_layers);
    tracing::info!("Threshold: {}", config.threshold);
    tracing::info!("Visualizer enabled: {}", config.visualizer);
    tracing::info!("Press Enter to pause or resume");

    if config.visualizer {
        let shared_view: Arc<Mutex<SharedView>> = Arc::new(Mutex::new(SharedView::default()));
        let loop_view = Arc::clone(&shared_view);

        let (ready_tx, ready_rx) = mpsc::channel();

        std::thread::spawn(move || {
            let _ = ready_rx.recv();

            let result = build_loop(&config).and_then(|control| {
                control
                    .with_observer(VisualizingObserver::new(Arc::clone(&loop_view)))
                    .run()
            });
            if let Err(err) = result {
                tracing::error!("Control loop stopped: {}", err);
                if let Ok(mut view) = loop_view.lock() {
                    view.fail(err);
                }
            }
        });

        run_visualizer(Arc::clone(&shared_view), ready_tx);

        if let Ok(view) = shared_view.lock() {
            view.outcome()?;
        }
    } else {
        let mut control = build_loop(&config)?;
        control.run()?;
    }

    Ok(())
}
