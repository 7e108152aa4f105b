//! CLI configuration loaded from the environment.
use std::env;
use std::path::PathBuf;

pub const DEFAULT_TEAMS: [&str; 2] = ["Wanderers", "Shadow Clan"];

#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    /// Content directory; the bundled data when unset.
    pub data_dir: Option<PathBuf>,
    /// Overrides the seed from `battle.toml`.
    pub seed: Option<u64>,
    /// Lets random choosers play the player team too.
    pub autoplay: bool,
    /// Team names; the first one is played from stdin.
    pub teams: Vec<String>,
}

impl CliConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `TON_DATA_DIR` - Content directory (default: bundled data)
    /// - `TON_SEED` - Random seed (default: from `battle.toml`)
    /// - `TON_AUTOPLAY` - Play every team with random choosers (default: false)
    /// - `TON_TEAMS` - Comma-separated team names (default: `Wanderers,Shadow Clan`)
    pub fn from_env() -> Self {
        let mut config = Self {
            teams: DEFAULT_TEAMS.iter().map(|name| (*name).to_owned()).collect(),
            ..Self::default()
        };

        config.data_dir = env::var("TON_DATA_DIR").ok().map(PathBuf::from);
        config.seed = read_env::<u64>("TON_SEED");

        if let Some(enable) = read_env::<bool>("TON_AUTOPLAY") {
            config.autoplay = enable;
        } else if env::var("TON_AUTOPLAY").is_ok() {
            // Also accept just setting the variable without value as "true"
            config.autoplay = true;
        }

        if let Ok(teams) = env::var("TON_TEAMS") {
            let teams = parse_teams(&teams);
            if teams.len() >= 2 {
                config.teams = teams;
            }
        }

        config
    }
}

fn parse_teams(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_lists_are_trimmed() {
        assert_eq!(
            parse_teams(" Wanderers , Ronin,,"),
            vec!["Wanderers".to_owned(), "Ronin".to_owned()]
        );
    }
}
