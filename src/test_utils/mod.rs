//! Test utilities: fixtures and mock repository implementations.
//!
//! Used by the unit tests in each module and by the black-box suite under
//! `tests/`.

pub mod fixtures;
pub mod mocks;

pub use mocks::{
    MockChainRepository, MockFeatureRepository, MockSafeAppRepository, MockWalletRepository,
};
