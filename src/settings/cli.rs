use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "rotor", about = "Issues and rotates access/refresh token pairs")]
pub struct Cli {
    /// Path to the settings file; defaults to settings/dev.toml or
    /// settings/release.toml depending on the build profile.
    #[arg(long)]
    pub settings: Option<String>,
}
