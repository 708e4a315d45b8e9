//! Environment overrides live in their own test binary so the variables they
//! set cannot leak into other config tests.

use groq_agent::config::Settings;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_environment_overrides() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("groq-agent.toml");
    fs::write(
        &path,
        r#"
[server]
port = 8080

[agent]
model = "from-file"
"#,
    )?;

    // No key anywhere but GROQ_API_KEY
    std::env::set_var("GROQ_API_KEY", "gsk_fallback");
    let settings = Settings::from_file(&path)?;
    assert_eq!(settings.agent.api_key, "gsk_fallback");
    assert_eq!(settings.agent.model, "from-file");
    assert_eq!(settings.server.port, 8080);

    // Prefixed variables beat both the file and the fallback
    std::env::set_var("GROQ_AGENT_AGENT__API_KEY", "gsk_prefixed");
    std::env::set_var("GROQ_AGENT_AGENT__MODEL", "from-env");
    std::env::set_var("GROQ_AGENT_SERVER__PORT", "9090");
    let settings = Settings::from_file(&path)?;
    assert_eq!(settings.agent.api_key, "gsk_prefixed");
    assert_eq!(settings.agent.model, "from-env");
    assert_eq!(settings.server.port, 9090);

    for var in [
        "GROQ_API_KEY",
        "GROQ_AGENT_AGENT__API_KEY",
        "GROQ_AGENT_AGENT__MODEL",
        "GROQ_AGENT_SERVER__PORT",
    ] {
        std::env::remove_var(var);
    }

    Ok(())
}
