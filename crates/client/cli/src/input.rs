//! Reads move selections from stdin.
//!
//! One selection per line: `Aiko: Slash > Kenji, Ren`. The combatant prefix
//! may be dropped when a single combatant is played.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::thread;

use battle_core::{CombatantId, Team};
use battle_runtime::Selection;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("expected `<move> > <target>[, <target>]`")]
    Malformed,

    #[error("who is '{0}'?")]
    UnknownName(String),

    #[error("say who moves: `<name>: <move> > <target>`")]
    MissingCombatant,

    #[error("{0} is not yours to command")]
    NotPlayed(String),
}

/// A line split into names, before resolution.
#[derive(Debug, PartialEq, Eq)]
pub struct Line {
    pub combatant: Option<String>,
    pub option: String,
    pub targets: Vec<String>,
}

pub fn parse_line(line: &str) -> Result<Line, InputError> {
    let (combatant, rest) = match line.split_once(':') {
        Some((name, rest)) => (Some(name.trim().to_owned()), rest),
        None => (None, line),
    };
    let (option, targets) = rest.split_once('>').ok_or(InputError::Malformed)?;
    let option = option.trim();
    let targets: Vec<String> = targets
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect();
    if option.is_empty() || targets.is_empty() {
        return Err(InputError::Malformed);
    }
    Ok(Line {
        combatant,
        option: option.to_owned(),
        targets,
    })
}

/// Resolves names to combatants and routes selections to their queues.
pub struct Router {
    directory: BTreeMap<String, CombatantId>,
    players: BTreeMap<CombatantId, mpsc::Sender<Selection>>,
}

impl Router {
    pub fn new(teams: &[Team], players: BTreeMap<CombatantId, mpsc::Sender<Selection>>) -> Self {
        let directory = teams
            .iter()
            .flat_map(Team::members)
            .map(|member| (member.name().to_lowercase(), member.id()))
            .collect();
        Self { directory, players }
    }

    fn lookup(&self, name: &str) -> Result<CombatantId, InputError> {
        self.directory
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| InputError::UnknownName(name.to_owned()))
    }

    /// Returns the player and the selection a line stands for.
    pub fn resolve(&self, line: Line) -> Result<(CombatantId, Selection), InputError> {
        let combatant = match &line.combatant {
            Some(name) => {
                let id = self.lookup(name)?;
                if !self.players.contains_key(&id) {
                    return Err(InputError::NotPlayed(name.clone()));
                }
                id
            }
            None => match self.players.keys().collect::<Vec<_>>().as_slice() {
                [only] => **only,
                _ => return Err(InputError::MissingCombatant),
            },
        };
        let targets = line
            .targets
            .iter()
            .map(|name| self.lookup(name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((combatant, Selection::new(line.option, targets)))
    }

    /// Reads stdin on its own thread until it closes or every queue is gone.
    pub fn spawn(self) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let routed = parse_line(&line).and_then(|line| self.resolve(line));
                let (combatant, selection) = match routed {
                    Ok(routed) => routed,
                    Err(err) => {
                        println!("  ! {err}");
                        continue;
                    }
                };
                let Some(queue) = self.players.get(&combatant) else {
                    continue;
                };
                if queue.blocking_send(selection).is_err() {
                    debug!(target: "trail_of_ninjas::input", "battle over; stdin reader stopping");
                    break;
                }
            }
        })
    }
}
