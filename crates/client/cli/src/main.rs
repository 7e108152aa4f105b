//! Terminal host for a "Trail of Ninjas" battle.
mod config;
mod console;
mod input;

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use battle_core::{BattleId, Combatant, CombatantId, Team};
use battle_runtime::{BattleManager, QueueChooser, RuntimeConfig, Selection, run_until_idle};
use config::CliConfig;
use console::ConsoleObserver;
use input::Router;
use ninja_content::ContentFactory;
use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const PROMPT: &str = "Your move, e.g. `Aiko: Slash > Kenji`";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();
    setup_logging();

    let config = CliConfig::from_env();
    let factory = match &config.data_dir {
        Some(dir) => ContentFactory::new(dir),
        None => ContentFactory::bundled(),
    };
    let mut content = factory
        .load_all()
        .with_context(|| format!("loading content from {}", factory.data_dir().display()))?;
    if let Some(seed) = config.seed {
        content.config.seed = seed;
    }

    let names: Vec<&str> = config.teams.iter().map(String::as_str).collect();
    let teams = content.roster.build_teams(&names, &content.armory)?;
    let Some(player_team) = teams.first().cloned() else {
        bail!("no teams to fight with");
    };

    let prompt = (!config.autoplay).then(|| PROMPT.to_owned());
    let observer = ConsoleObserver::new(&teams, prompt);
    let mut manager =
        BattleManager::new(RuntimeConfig::new(content.config.clone())).with_observer(observer);
    let properties = content.properties.clone();
    manager.install_properties(move |combatant: &Combatant| properties.effects_for(combatant));

    let battle = manager.create_battle(teams.clone())?;
    if !config.autoplay {
        let players = bind_players(&mut manager, battle, &player_team)?;
        Router::new(&teams, players).spawn();
        println!("{PROMPT}");
    }
    manager.start_battle(battle)?;

    for finished in run_until_idle(&mut manager).await {
        tracing::info!(
            target: "trail_of_ninjas",
            battle = %finished.battle,
            result = %finished.result,
            "battle over"
        );
    }
    Ok(())
}

/// Gives every member of the player team a stdin-fed chooser.
fn bind_players(
    manager: &mut BattleManager,
    battle: BattleId,
    team: &Team,
) -> Result<BTreeMap<CombatantId, mpsc::Sender<Selection>>> {
    let mut players = BTreeMap::new();
    for member in team.members() {
        let (chooser, input) = QueueChooser::channel(4);
        manager.set_chooser(battle, member.id(), Box::new(chooser))?;

        let mut feedback = input.feedback;
        tokio::spawn(async move {
            while let Some(rejected) = feedback.recv().await {
                println!("  ! {}: {}", rejected.selection.option, rejected.error);
            }
        });

        let options: Vec<String> = member
            .move_options()
            .iter()
            .map(|option| option.name().to_owned())
            .collect();
        let options = if options.is_empty() {
            manager.config().battle.struggle_name.clone()
        } else {
            options.join(", ")
        };
        println!("{} ({} HP) can use: {options}", member.name(), member.hp());

        players.insert(member.id(), input.selections);
    }
    Ok(players)
}

/// Setup logging to stderr, filtered by `RUST_LOG` (default: info).
fn setup_logging() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}
