//! `promptweave config`: Show configuration.

use promptweave_config::AppConfig;

pub fn show(config: &AppConfig, default: bool) -> Result<(), Box<dyn std::error::Error>> {
    let toml_str = if default {
        AppConfig::default_toml()
    } else {
        toml::to_string_pretty(config)?
    };
    println!("{toml_str}");
    println!("# config file: {}", AppConfig::config_dir().join("config.toml").display());
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn config_path_is_valid() {
        let path = promptweave_config::AppConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains(".promptweave"));
    }
}
