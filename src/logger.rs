use anyhow::{Context, Result};
use simple_logger::init_with_level;

pub fn init(level: &str) -> Result<()> {
    let level = level
        .parse::<log::Level>()
        .ok()
        .with_context(|| format!("Unknown log level `{}`", level))?;
    init_with_level(level)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_unknown_level() {
        assert!(init("loud").is_err());
    }
}
