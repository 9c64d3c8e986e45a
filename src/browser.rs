use anyhow::{anyhow, Context, Result};
use std::process::{Command, Stdio};

/// Hand `url` to the desktop's default browser without waiting for it.
pub fn open_url(url: &str) -> Result<()> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(anyhow!("Refusing to open non-web link: {}", url));
    }

    let (program, args) = opener_command(url);
    tracing::info!(%url, program, "opening posting");
    Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to launch '{}' to open {}", program, url))?;
    Ok(())
}

fn opener_command(url: &str) -> (&'static str, Vec<String>) {
    if cfg!(target_os = "macos") {
        ("open", vec![url.to_string()])
    } else if cfg!(target_os = "windows") {
        // the empty argument is the window title `start` expects first
        (
            "cmd",
            vec!["/C".to_string(), "start".to_string(), String::new(), url.to_string()],
        )
    } else {
        ("xdg-open", vec![url.to_string()])
    }
}
