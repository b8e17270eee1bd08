use miette::Result;

use deptree_core::config::TreeConfig;

pub fn exec(config: &TreeConfig) -> Result<()> {
    print!("{}", config.to_string_pretty()?);
    Ok(())
}
