//! Core library for the dlmm-range-advisor project.
//!
//! Recommends bin ranges for liquidity positions on a discretized-bin AMM,
//! sizes paired deposits over a range and decides when an existing position
//! is worth rebalancing. Data comes from injected collaborators
//! ([`sources::BinSource`], [`sources::PriceOracle`]); everything after the
//! gather step is pure.

pub mod advisor;
pub mod bins;
pub mod config;
pub mod errors;
pub mod market;
pub mod models;
pub mod rebalance;
pub mod sources;
pub mod strategy;
pub mod utils;
