mod init;
mod prune;

pub use init::cmd_init;
pub use prune::cmd_prune;
