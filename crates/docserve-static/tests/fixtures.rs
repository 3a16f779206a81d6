//! Shared fixtures for docserve-static tests

#[path = "fixtures/test_fixtures.rs"]
mod test_fixtures;

pub use test_fixtures::{BIG_FILE_LEN, Site, set_mtime, site};
