pub mod backend;
pub mod config;
pub mod export;
pub mod local_backend;
pub mod model;
pub mod persist;
pub mod progression;
pub mod provider;
pub mod remote;
pub mod scorecard;
pub mod state;
pub mod stats;
pub mod validation;
