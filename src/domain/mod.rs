// Domain layer - Health samples and the pure computations over them
pub mod activity;
pub mod aggregate;
pub mod dashboard;
pub mod recommendation;
pub mod recovery;
pub mod sample;
