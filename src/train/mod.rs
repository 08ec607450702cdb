pub mod iter_stats;
pub mod train_config;
pub mod loop_fn;

pub use iter_stats::IterationStats;
pub use train_config::TrainConfig;
pub use loop_fn::train_loop;
