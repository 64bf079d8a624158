//! Line-based terminal input.

use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::config::{self, Config};

/// Forward stdin lines to a channel. The channel closes at end of input.
pub fn spawn_line_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}

/// Print `label` and wait for one line. `None` at end of input.
pub async fn prompt(lines: &mut mpsc::Receiver<String>, label: &str) -> Option<String> {
    print!("{}", label);
    let _ = std::io::stdout().flush();
    lines.recv().await
}

/// Ask for both API keys and save them.
///
/// A blank answer keeps the stored key. Loops until both keys are present.
pub async fn prompt_settings(
    lines: &mut mpsc::Receiver<String>,
    config: &mut Config,
) -> anyhow::Result<()> {
    let recommendation = config.providers.recommendation;
    let resolution = config.providers.resolution;
    println!("Settings");

    loop {
        let label = format!("{} API key: ", recommendation.name());
        let ai_key = prompt(lines, &label)
            .await
            .ok_or_else(|| anyhow::anyhow!("input closed before settings were entered"))?;
        let label = format!("{} API key: ", resolution.name());
        let music_key = prompt(lines, &label)
            .await
            .ok_or_else(|| anyhow::anyhow!("input closed before settings were entered"))?;

        let ai_key = keep_if_blank(&ai_key, config.credentials.get(recommendation.key()));
        let music_key = keep_if_blank(&music_key, config.credentials.get(resolution.key()));

        match config.apply_settings(recommendation, &ai_key, resolution, &music_key) {
            Ok(()) => break,
            Err(e) => println!("{}", e),
        }
    }

    let path = config::save(config)?;
    println!("Settings saved to {}", path.display());
    Ok(())
}

fn keep_if_blank(entered: &str, stored: Option<&str>) -> String {
    let entered = entered.trim();
    if entered.is_empty() {
        stored.unwrap_or_default().to_string()
    } else {
        entered.to_string()
    }
}
