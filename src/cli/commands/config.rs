//! Settings commands.

use crate::config::{self, Config, RecommendationProvider, ResolutionProvider};

/// Print the current settings with secrets masked
pub fn cmd_config_show() -> anyhow::Result<()> {
    let config = config::load();
    if let Some(path) = config::config_path() {
        println!("# {}", path.display());
    }
    print!("{}", toml::to_string_pretty(&masked(&config))?);
    if !config.is_complete() {
        println!();
        println!(
            "# Missing API keys: {}",
            config.missing_credentials().join(", ")
        );
    }
    Ok(())
}

/// Print the config file location
pub fn cmd_config_path() -> anyhow::Result<()> {
    let path = config::config_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    println!("{}", path.display());
    Ok(())
}

/// Update providers and keys; keys not given are kept.
pub fn cmd_config_set(
    ai_key: Option<&str>,
    music_key: Option<&str>,
    ai_provider: Option<&str>,
    music_provider: Option<&str>,
) -> anyhow::Result<()> {
    let mut config = config::load();

    let recommendation: RecommendationProvider = match ai_provider {
        Some(name) => name.parse().map_err(anyhow::Error::msg)?,
        None => config.providers.recommendation,
    };
    let resolution: ResolutionProvider = match music_provider {
        Some(name) => name.parse().map_err(anyhow::Error::msg)?,
        None => config.providers.resolution,
    };

    let ai_key = ai_key
        .or_else(|| config.credentials.get(recommendation.key()))
        .unwrap_or_default()
        .to_string();
    let music_key = music_key
        .or_else(|| config.credentials.get(resolution.key()))
        .unwrap_or_default()
        .to_string();

    config.apply_settings(recommendation, &ai_key, resolution, &music_key)?;
    let path = config::save(&config)?;
    println!("Settings saved to {}", path.display());
    Ok(())
}

/// Copy of `config` safe to print.
fn masked(config: &Config) -> Config {
    let mut shown = config.clone();
    let secrets: Vec<(String, String)> = config
        .credentials
        .iter()
        .map(|(provider, secret)| (provider.to_string(), mask_secret(secret)))
        .collect();
    for (provider, mask) in secrets {
        shown.credentials.set(provider, mask);
    }
    shown
}

/// Keep only the last four characters of long secrets.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        "****".to_string()
    } else {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("short"), "****");
        assert_eq!(mask_secret("sk-ant-api03-abcdWXYZ"), "****WXYZ");
    }

    #[test]
    fn test_masked_config_hides_keys() {
        let mut config = Config::default();
        config.credentials.set("claude", "sk-ant-secret-1234");
        config.credentials.set("youtube", "AIzaSyVerySecret9876");

        let toml = toml::to_string_pretty(&masked(&config)).unwrap();
        assert!(!toml.contains("secret-1234"));
        assert!(!toml.contains("VerySecret"));
        assert!(toml.contains("****1234"));
        assert!(toml.contains("****9876"));
        assert!(config.credentials.get("claude").unwrap().contains("secret"));
    }
}
