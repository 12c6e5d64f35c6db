use std::path::Path;

use crate::config::Config;

pub fn cmd_init(path: &Path) -> anyhow::Result<()> {
    if Config::create_default_if_missing(path)? {
        println!("Created {}", path.display());
        println!("Edit it, then run `mesa serve`.");
    } else {
        println!("{} already exists, leaving it untouched", path.display());
    }
    Ok(())
}
