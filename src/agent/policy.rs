//! Predictor networks using Burn framework
//!
//! Three architectures share one first-stage width (`hidden_layers[0]`):
//! a plain linear layer, a tanh recurrent cell, or a four-gate LSTM cell.
//! The remaining hidden layers are ReLU dense layers, and the output layer
//! is a sigmoid so every output lies in (0, 1).

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use burn::module::Module;
use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::activation::{sigmoid, tanh};

use crate::infra::ConfigurationError;

use super::action_space::ControlKey;
use super::INPUT_WIDTH;

/// Which network architecture the agent runs with. Fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictorMode {
    Feedforward,
    Recurrent,
    LongMemory,
}

impl fmt::Display for PredictorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictorMode::Feedforward => write!(f, "feedforward"),
            PredictorMode::Recurrent => write!(f, "recurrent"),
            PredictorMode::LongMemory => write!(f, "lstm"),
        }
    }
}

impl FromStr for PredictorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "feedforward" | "vanilla" => Ok(PredictorMode::Feedforward),
            "1" | "recurrent" | "rnn" => Ok(PredictorMode::Recurrent),
            "2" | "lstm" | "long_memory" => Ok(PredictorMode::LongMemory),
            other => Err(format!("unknown predictor mode '{other}'")),
        }
    }
}

/// Configuration for predictor networks
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorConfig {
    pub mode: PredictorMode,
    pub input_width: usize,
    /// Widths of the hidden layers; the first one is also the recurrent width
    pub hidden_layers: Vec<usize>,
    pub output_width: usize,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            mode: PredictorMode::Feedforward,
            input_width: INPUT_WIDTH,
            hidden_layers: vec![2048, 1024, 128],
            output_width: ControlKey::COUNT,
        }
    }
}

impl PredictorConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.hidden_layers.is_empty() || self.hidden_layers.contains(&0) {
            return Err(ConfigurationError::InvalidSetting {
                key: "hidden_layers",
                value: format!("{:?}", self.hidden_layers),
                reason: "need at least one layer and no zero widths".to_string(),
            });
        }
        if self.input_width == 0 || self.output_width == 0 {
            return Err(ConfigurationError::InvalidSetting {
                key: "input/output width",
                value: format!("{}/{}", self.input_width, self.output_width),
                reason: "widths must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    fn memory_width(&self) -> usize {
        self.hidden_layers[0]
    }
}

/// Memory of the simple recurrent predictor.
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenState {
    pub hidden: Vec<f32>,
}

impl HiddenState {
    pub fn zeros(width: usize) -> Self {
        Self {
            hidden: vec![0.0; width],
        }
    }

    pub fn is_zero(&self) -> bool {
        self.hidden.iter().all(|&v| v == 0.0)
    }
}

/// Memory of the LSTM predictor.
#[derive(Debug, Clone, PartialEq)]
pub struct LongMemoryState {
    pub hidden: Vec<f32>,
    pub cell: Vec<f32>,
}

impl LongMemoryState {
    pub fn zeros(width: usize) -> Self {
        Self {
            hidden: vec![0.0; width],
            cell: vec![0.0; width],
        }
    }

    pub fn is_zero(&self) -> bool {
        self.hidden.iter().chain(&self.cell).all(|&v| v == 0.0)
    }
}

/// A numeric function from an input vector (and carried memory) to an
/// output vector. Implementations differ only in the memory they carry.
pub trait Predictor {
    /// Memory threaded from one frame to the next within a match
    type State: Clone + fmt::Debug + PartialEq;

    fn mode(&self) -> PredictorMode;

    fn input_width(&self) -> usize;

    fn output_width(&self) -> usize;

    /// Memory at the first frame of a match
    fn initial_state(&self) -> Self::State;

    fn predict(&self, input: &[f32], state: &Self::State) -> (Vec<f32>, Self::State);
}

/// ReLU hidden layers followed by the sigmoid output layer
#[derive(Module, Debug)]
pub struct DenseHead<B: Backend> {
    hidden: Vec<Linear<B>>,
    output: Linear<B>,
    activation: Relu,
}

impl<B: Backend> DenseHead<B> {
    pub fn new(device: &B::Device, hidden_layers: &[usize], output_width: usize) -> Self {
        let hidden = hidden_layers
            .windows(2)
            .map(|pair| LinearConfig::new(pair[0], pair[1]).init(device))
            .collect();

        let last = hidden_layers[hidden_layers.len() - 1];
        let output = LinearConfig::new(last, output_width).init(device);

        Self {
            hidden,
            output,
            activation: Relu::new(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = x;
        for layer in &self.hidden {
            x = self.activation.forward(layer.forward(x));
        }
        sigmoid(self.output.forward(x))
    }
}

/// Stateless network: linear first stage then the dense head
#[derive(Module, Debug)]
pub struct FeedforwardNet<B: Backend> {
    input: Linear<B>,
    head: DenseHead<B>,
}

impl<B: Backend> FeedforwardNet<B> {
    pub fn new(device: &B::Device, config: &PredictorConfig) -> Self {
        Self {
            input: LinearConfig::new(config.input_width, config.memory_width()).init(device),
            head: DenseHead::new(device, &config.hidden_layers, config.output_width),
        }
    }

    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        self.head.forward(self.input.forward(input))
    }
}

/// Simple recurrent cell: h' = tanh(W x + U h + b)
#[derive(Module, Debug)]
pub struct RecurrentNet<B: Backend> {
    input: Linear<B>,
    recurrent: Linear<B>,
    head: DenseHead<B>,
}

impl<B: Backend> RecurrentNet<B> {
    pub fn new(device: &B::Device, config: &PredictorConfig) -> Self {
        let width = config.memory_width();
        Self {
            input: LinearConfig::new(config.input_width, width).init(device),
            recurrent: LinearConfig::new(width, width).with_bias(false).init(device),
            head: DenseHead::new(device, &config.hidden_layers, config.output_width),
        }
    }

    /// Returns (output, next hidden)
    pub fn forward(
        &self,
        input: Tensor<B, 2>,
        hidden: Tensor<B, 2>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let hidden = tanh(self.input.forward(input) + self.recurrent.forward(hidden));
        (self.head.forward(hidden.clone()), hidden)
    }
}

/// LSTM cell with input, forget, candidate and output gates (in that order)
#[derive(Module, Debug)]
pub struct LongMemoryNet<B: Backend> {
    input: Linear<B>,
    recurrent: Linear<B>,
    head: DenseHead<B>,
}

impl<B: Backend> LongMemoryNet<B> {
    pub fn new(device: &B::Device, config: &PredictorConfig) -> Self {
        let width = config.memory_width();
        Self {
            input: LinearConfig::new(config.input_width, 4 * width).init(device),
            recurrent: LinearConfig::new(width, 4 * width)
                .with_bias(false)
                .init(device),
            head: DenseHead::new(device, &config.hidden_layers, config.output_width),
        }
    }

    /// Returns (output, next hidden, next cell)
    pub fn forward(
        &self,
        input: Tensor<B, 2>,
        hidden: Tensor<B, 2>,
        cell: Tensor<B, 2>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>, Tensor<B, 2>) {
        let [batch, width] = hidden.dims();
        let gates = self.input.forward(input) + self.recurrent.forward(hidden);

        let gate = |i: usize| gates.clone().slice([0..batch, i * width..(i + 1) * width]);
        let input_gate = sigmoid(gate(0));
        let forget_gate = sigmoid(gate(1));
        let candidate = tanh(gate(2));
        let output_gate = sigmoid(gate(3));

        let cell = forget_gate * cell + input_gate * candidate;
        let hidden = output_gate * tanh(cell.clone());

        (self.head.forward(hidden.clone()), hidden, cell)
    }
}

fn row_tensor<B: Backend>(values: &[f32], device: &B::Device) -> Tensor<B, 2> {
    Tensor::<B, 1>::from_floats(values, device).reshape([1, values.len()])
}

fn row_values<B: Backend>(tensor: Tensor<B, 2>) -> Vec<f32> {
    match tensor.into_data().to_vec::<f32>() {
        Ok(values) => values,
        Err(err) => {
            tracing::error!("Failed to read predictor tensor: {:?}", err);
            Vec::new()
        }
    }
}

/// Pad or truncate a carried vector so it matches the memory width.
fn fit_width(values: &[f32], width: usize) -> Vec<f32> {
    if values.len() != width {
        tracing::warn!(
            "Recurrent state width {} does not match {}, using zeros",
            values.len(),
            width
        );
        return vec![0.0; width];
    }
    values.to_vec()
}

pub struct FeedforwardPredictor<B: Backend> {
    model: FeedforwardNet<B>,
    config: PredictorConfig,
    device: B::Device,
}

impl<B: Backend> FeedforwardPredictor<B> {
    pub fn new(device: B::Device, config: PredictorConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            model: FeedforwardNet::new(&device, &config),
            config,
            device,
        })
    }

    pub fn predict_frame(&self, input: &[f32]) -> Vec<f32> {
        let output = self.model.forward(row_tensor(input, &self.device));
        row_values(output)
    }
}

impl<B: Backend> Predictor for FeedforwardPredictor<B> {
    type State = ();

    fn mode(&self) -> PredictorMode {
        PredictorMode::Feedforward
    }

    fn input_width(&self) -> usize {
        self.config.input_width
    }

    fn output_width(&self) -> usize {
        self.config.output_width
    }

    fn initial_state(&self) -> Self::State {}

    fn predict(&self, input: &[f32], _state: &Self::State) -> (Vec<f32>, Self::State) {
        (self.predict_frame(input), ())
    }
}

pub struct RecurrentPredictor<B: Backend> {
    model: RecurrentNet<B>,
    config: PredictorConfig,
    device: B::Device,
}

impl<B: Backend> RecurrentPredictor<B> {
    pub fn new(device: B::Device, config: PredictorConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            model: RecurrentNet::new(&device, &config),
            config,
            device,
        })
    }

    pub fn predict_frame(&self, input: &[f32], hidden: &[f32]) -> (Vec<f32>, Vec<f32>) {
        let hidden = fit_width(hidden, self.config.memory_width());
        let (output, hidden) = self.model.forward(
            row_tensor(input, &self.device),
            row_tensor(&hidden, &self.device),
        );
        (row_values(output), row_values(hidden))
    }
}

impl<B: Backend> Predictor for RecurrentPredictor<B> {
    type State = HiddenState;

    fn mode(&self) -> PredictorMode {
        PredictorMode::Recurrent
    }

    fn input_width(&self) -> usize {
        self.config.input_width
    }

    fn output_width(&self) -> usize {
        self.config.output_width
    }

    fn initial_state(&self) -> Self::State {
        HiddenState::zeros(self.config.memory_width())
    }

    fn predict(&self, input: &[f32], state: &Self::State) -> (Vec<f32>, Self::State) {
        let (output, hidden) = self.predict_frame(input, &state.hidden);
        (output, HiddenState { hidden })
    }
}

pub struct LongMemoryPredictor<B: Backend> {
    model: LongMemoryNet<B>,
    config: PredictorConfig,
    device: B::Device,
}

impl<B: Backend> LongMemoryPredictor<B> {
    pub fn new(device: B::Device, config: PredictorConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            model: LongMemoryNet::new(&device, &config),
            config,
            device,
        })
    }

    pub fn predict_frame(
        &self,
        input: &[f32],
        hidden: &[f32],
        cell: &[f32],
    ) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        let width = self.config.memory_width();
        let hidden = fit_width(hidden, width);
        let cell = fit_width(cell, width);
        let (output, hidden, cell) = self.model.forward(
            row_tensor(input, &self.device),
            row_tensor(&hidden, &self.device),
            row_tensor(&cell, &self.device),
        );
        (row_values(output), row_values(hidden), row_values(cell))
    }
}

impl<B: Backend> Predictor for LongMemoryPredictor<B> {
    type State = LongMemoryState;

    fn mode(&self) -> PredictorMode {
        PredictorMode::LongMemory
    }

    fn input_width(&self) -> usize {
        self.config.input_width
    }

    fn output_width(&self) -> usize {
        self.config.output_width
    }

    fn initial_state(&self) -> Self::State {
        LongMemoryState::zeros(self.config.memory_width())
    }

    fn predict(&self, input: &[f32], state: &Self::State) -> (Vec<f32>, Self::State) {
        let (output, hidden, cell) = self.predict_frame(input, &state.hidden, &state.cell);
        (output, LongMemoryState { hidden, cell })
    }
}

/// Memory carried by whichever predictor the run was configured with
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryState {
    Stateless,
    Hidden(HiddenState),
    LongMemory(LongMemoryState),
}

impl MemoryState {
    pub fn is_zero(&self) -> bool {
        match self {
            MemoryState::Stateless => true,
            MemoryState::Hidden(state) => state.is_zero(),
            MemoryState::LongMemory(state) => state.is_zero(),
        }
    }
}

/// Predictor selected at configuration time
pub enum AnyPredictor<B: Backend> {
    Feedforward(FeedforwardPredictor<B>),
    Recurrent(RecurrentPredictor<B>),
    LongMemory(LongMemoryPredictor<B>),
}

impl<B: Backend> AnyPredictor<B> {
    pub fn new(device: B::Device, config: PredictorConfig) -> Result<Self, ConfigurationError> {
        Ok(match config.mode {
            PredictorMode::Feedforward => {
                AnyPredictor::Feedforward(FeedforwardPredictor::new(device, config)?)
            }
            PredictorMode::Recurrent => {
                AnyPredictor::Recurrent(RecurrentPredictor::new(device, config)?)
            }
            PredictorMode::LongMemory => {
                AnyPredictor::LongMemory(LongMemoryPredictor::new(device, config)?)
            }
        })
    }

    /// Load trained weights from a named MessagePack record
    pub fn load_weights(self, path: &Path) -> Result<Self, ConfigurationError> {
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let load_error = |err: burn::record::RecorderError| ConfigurationError::ModelLoad {
            path: path.display().to_string(),
            reason: format!("{:?}", err),
        };

        let loaded = match self {
            AnyPredictor::Feedforward(mut p) => {
                p.model = p.model.load_file(path, &recorder, &p.device).map_err(load_error)?;
                AnyPredictor::Feedforward(p)
            }
            AnyPredictor::Recurrent(mut p) => {
                p.model = p.model.load_file(path, &recorder, &p.device).map_err(load_error)?;
                AnyPredictor::Recurrent(p)
            }
            AnyPredictor::LongMemory(mut p) => {
                p.model = p.model.load_file(path, &recorder, &p.device).map_err(load_error)?;
                AnyPredictor::LongMemory(p)
            }
        };
        tracing::info!("Loaded {} predictor weights from {}", loaded.mode(), path.display());
        Ok(loaded)
    }
}

impl<B: Backend> Predictor for AnyPredictor<B> {
    type State = MemoryState;

    fn mode(&self) -> PredictorMode {
        match self {
            AnyPredictor::Feedforward(p) => p.mode(),
            AnyPredictor::Recurrent(p) => p.mode(),
            AnyPredictor::LongMemory(p) => p.mode(),
        }
    }

    fn input_width(&self) -> usize {
        match self {
            AnyPredictor::Feedforward(p) => p.input_width(),
            AnyPredictor::Recurrent(p) => p.input_width(),
            AnyPredictor::LongMemory(p) => p.input_width(),
        }
    }

    fn output_width(&self) -> usize {
        match self {
            AnyPredictor::Feedforward(p) => p.output_width(),
            AnyPredictor::Recurrent(p) => p.output_width(),
            AnyPredictor::LongMemory(p) => p.output_width(),
        }
    }

    fn initial_state(&self) -> Self::State {
        match self {
            AnyPredictor::Feedforward(_) => MemoryState::Stateless,
            AnyPredictor::Recurrent(p) => MemoryState::Hidden(p.initial_state()),
            AnyPredictor::LongMemory(p) => MemoryState::LongMemory(p.initial_state()),
        }
    }

    fn predict(&self, input: &[f32], state: &Self::State) -> (Vec<f32>, Self::State) {
        match (self, state) {
            (AnyPredictor::Feedforward(p), _) => (p.predict_frame(input), MemoryState::Stateless),
            (AnyPredictor::Recurrent(p), MemoryState::Hidden(state)) => {
                let (output, next) = p.predict(input, state);
                (output, MemoryState::Hidden(next))
            }
            (AnyPredictor::LongMemory(p), MemoryState::LongMemory(state)) => {
                let (output, next) = p.predict(input, state);
                (output, MemoryState::LongMemory(next))
            }
            (predictor, other) => {
                tracing::warn!(
                    "{} predictor received {:?} memory, restarting from zero",
                    predictor.mode(),
                    other
                );
                let initial = predictor.initial_state();
                predictor.predict(input, &initial)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn small_config(mode: PredictorMode) -> PredictorConfig {
        PredictorConfig {
            mode,
            input_width: 6,
            hidden_layers: vec![5, 4],
            output_width: 3,
        }
    }

    fn input() -> Vec<f32> {
        vec![0.1, -0.4, 0.9, 0.0, 1.0, 0.25]
    }

    #[test]
    fn test_predictor_config_default() {
        let config = PredictorConfig::default();
        assert_eq!(config.input_width, 3094);
        assert_eq!(config.hidden_layers, vec![2048, 1024, 128]);
        assert_eq!(config.output_width, 11);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("0".parse::<PredictorMode>(), Ok(PredictorMode::Feedforward));
        assert_eq!("RNN".parse::<PredictorMode>(), Ok(PredictorMode::Recurrent));
        assert_eq!("lstm".parse::<PredictorMode>(), Ok(PredictorMode::LongMemory));
        assert!("transformer".parse::<PredictorMode>().is_err());
    }

    #[test]
    fn test_invalid_hidden_layers_rejected() {
        let mut config = small_config(PredictorMode::Feedforward);
        config.hidden_layers = vec![];
        assert!(AnyPredictor::<TestBackend>::new(Default::default(), config.clone()).is_err());
        config.hidden_layers = vec![4, 0];
        assert!(AnyPredictor::<TestBackend>::new(Default::default(), config).is_err());
    }

    #[test]
    fn test_feedforward_outputs_bounded_and_deterministic() {
        let predictor = FeedforwardPredictor::<TestBackend>::new(
            Default::default(),
            small_config(PredictorMode::Feedforward),
        )
        .unwrap();
        let first = predictor.predict_frame(&input());
        let second = predictor.predict_frame(&input());
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert!(first.iter().all(|&v| v > 0.0 && v < 1.0));
    }

    #[test]
    fn test_recurrent_threads_hidden_state() {
        let predictor = RecurrentPredictor::<TestBackend>::new(
            Default::default(),
            small_config(PredictorMode::Recurrent),
        )
        .unwrap();
        let initial = predictor.initial_state();
        assert!(initial.is_zero());
        assert_eq!(initial.hidden.len(), 5);

        let (output, next) = predictor.predict(&input(), &initial);
        assert_eq!(output.len(), 3);
        assert_eq!(next.hidden.len(), 5);
        assert!(next.hidden.iter().all(|&v| v > -1.0 && v < 1.0));

        // Same input and same memory give the same result.
        let (again, again_next) = predictor.predict(&input(), &initial);
        assert_eq!(output, again);
        assert_eq!(next, again_next);
    }

    #[test]
    fn test_long_memory_state_shapes() {
        let predictor = LongMemoryPredictor::<TestBackend>::new(
            Default::default(),
            small_config(PredictorMode::LongMemory),
        )
        .unwrap();
        let initial = predictor.initial_state();
        assert!(initial.is_zero());

        let (output, next) = predictor.predict(&input(), &initial);
        assert_eq!(output.len(), 3);
        assert_eq!(next.hidden.len(), 5);
        assert_eq!(next.cell.len(), 5);
        assert!(output.iter().all(|&v| v > 0.0 && v < 1.0));
        // |h| = |o * tanh(c)| < 1
        assert!(next.hidden.iter().all(|&v| v.abs() < 1.0));
    }

    #[test]
    fn test_any_predictor_memory_variants() {
        for (mode, expected) in [
            (PredictorMode::Feedforward, "stateless"),
            (PredictorMode::Recurrent, "hidden"),
            (PredictorMode::LongMemory, "long"),
        ] {
            let predictor =
                AnyPredictor::<TestBackend>::new(Default::default(), small_config(mode)).unwrap();
            assert_eq!(predictor.mode(), mode);
            let state = predictor.initial_state();
            assert!(state.is_zero());
            let (_, next) = predictor.predict(&input(), &state);
            let kind = match next {
                MemoryState::Stateless => "stateless",
                MemoryState::Hidden(_) => "hidden",
                MemoryState::LongMemory(_) => "long",
            };
            assert_eq!(kind, expected);
        }
    }

    #[test]
    fn test_mismatched_memory_restarts_from_zero() {
        let predictor = AnyPredictor::<TestBackend>::new(
            Default::default(),
            small_config(PredictorMode::LongMemory),
        )
        .unwrap();
        let (output, next) = predictor.predict(&input(), &MemoryState::Stateless);
        let (expected, expected_next) = predictor.predict(&input(), &predictor.initial_state());
        assert_eq!(output, expected);
        assert_eq!(next, expected_next);
    }

    #[test]
    fn test_missing_weights_file_is_configuration_error() {
        let predictor = AnyPredictor::<TestBackend>::new(
            Default::default(),
            small_config(PredictorMode::Recurrent),
        )
        .unwrap();
        let result = predictor.load_weights(Path::new("/nonexistent/fightbot/weights"));
        assert!(matches!(result, Err(ConfigurationError::ModelLoad { .. })));
    }
}
