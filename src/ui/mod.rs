mod visualizer;

pub use visualizer::run_visualizer;
