pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::{ContentTree, remote_config};
