//! Turn loop: wait timers, the player's command slot and the NPC sweep.
//! This module exists so the order in which actors act is decided in one place.
//! It does not own what an actor does on its turn (see `ai` and `actions`).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::actions::PlayerCommand;
use crate::error::CoreError;
use crate::world::{GameStatus, World};

/// What one call to [`World::step`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    pub turn: u64,
    /// The player's command ran (successfully or not).
    pub player_acted: bool,
    /// Why the command was refused or failed, if it was.
    pub error: Option<CoreError>,
    pub status: GameStatus,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub acted: usize,
    pub waited: usize,
    pub failed: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStopReason {
    PlayerDied,
    BudgetExhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunResult {
    pub simulated_turns: u64,
    pub stop_reason: RunStopReason,
}

impl World {
    /// One outer-loop iteration: the player's slot, a view refresh, then the NPC sweep.
    ///
    /// A player whose wait is above zero burns one unit of it and any command is
    /// refused with [`CoreError::PlayerNotReady`]. The sweep runs whether or not the
    /// command succeeded.
    pub fn step(&mut self, command: Option<PlayerCommand>) -> StepOutcome {
        if self.status == GameStatus::Dead {
            return StepOutcome {
                turn: self.turn,
                player_acted: false,
                error: Some(CoreError::GameOver),
                status: self.status,
            };
        }

        let mut error = None;
        let mut player_acted = false;
        let wait = self.entities.get(self.player).map_or(0, |player| player.wait);
        if wait > 0 {
            if let Some(player) = self.entities.get_mut(self.player) {
                player.wait -= 1;
            }
            if command.is_some() {
                error = Some(CoreError::PlayerNotReady { wait });
            }
        } else if let Some(command) = command {
            player_acted = true;
            if let Err(err) = self.apply_command(command) {
                debug!(?command, %err, "player command refused");
                error = Some(err);
            }
        }

        self.refresh_player_fov();
        if self.status == GameStatus::Playing {
            self.tick();
        }
        StepOutcome { turn: self.turn, player_acted, error, status: self.status }
    }

    /// Sweeps the current level's objects in list order. Each NPC with a behavior
    /// either burns one unit of wait or takes its turn. A failing behavior is logged
    /// and the sweep moves on.
    pub fn tick(&mut self) -> SweepReport {
        let mut report = SweepReport::default();
        let current = self.current;
        let order = self.levels[current].objects.clone();
        for id in order {
            if id == self.player || self.status == GameStatus::Dead {
                continue;
            }
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            if entity.ai.is_none() || !entity.is_on_level(current) {
                continue;
            }
            if entity.wait > 0 {
                entity.wait -= 1;
                report.waited += 1;
                continue;
            }
            let Some(mut behavior) = entity.ai.take() else {
                continue;
            };

            let next = match behavior.take_turn(self, id) {
                Ok(Some(replacement)) => replacement,
                Ok(None) => behavior,
                Err(err) => {
                    debug_assert!(
                        err != CoreError::InvalidPath,
                        "{} stepped an exhausted path",
                        behavior.name()
                    );
                    warn!(?id, behavior = behavior.name(), %err, "behavior turn failed");
                    report.failed += 1;
                    behavior
                }
            };
            report.acted += 1;
            if let Some(entity) = self.entities.get_mut(id)
                && !entity.corpse
                && entity.ai.is_none()
            {
                entity.ai = Some(next);
            }
        }
        self.turn += 1;
        report
    }

    /// Steps with no player input until the player dies or `max_turns` have passed.
    pub fn run(&mut self, max_turns: u64) -> RunResult {
        let mut turns = 0;
        while turns < max_turns {
            if self.status == GameStatus::Dead {
                return RunResult { simulated_turns: turns, stop_reason: RunStopReason::PlayerDied };
            }
            self.step(None);
            turns += 1;
        }
        let stop_reason = if self.status == GameStatus::Dead {
            RunStopReason::PlayerDied
        } else {
            RunStopReason::BudgetExhausted
        };
        RunResult { simulated_turns: turns, stop_reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{Behavior, WorkerState};
    use crate::test_support::{add_robot, open_world};
    use crate::types::{Direction, Pos};

    #[test]
    fn waiting_actor_only_counts_down() {
        let (mut world, _player) = open_world(12, 12, Pos::new(1, 1));
        let robot = add_robot(&mut world, Pos::new(8, 8));
        world.entities[robot].wait = 2;

        let report = world.tick();
        assert_eq!(report, SweepReport { acted: 0, waited: 1, failed: 0 });
        assert_eq!(world.entities[robot].wait, 1);
        assert_eq!(world.entities[robot].pos, Pos::new(8, 8));

        world.tick();
        assert_eq!(world.entities[robot].wait, 0);
        let report = world.tick();
        assert_eq!(report.acted, 1);
    }

    #[test]
    fn ready_actor_takes_exactly_one_step() {
        let (mut world, _player) = open_world(12, 12, Pos::new(1, 1));
        let robot = add_robot(&mut world, Pos::new(8, 8));
        world.entities[robot].speed = 0;
        let before = world.entities[robot].pos;
        world.tick();
        assert_eq!(world.entities[robot].pos.chebyshev(before), 1);
    }

    #[test]
    fn busy_player_command_is_refused() {
        let (mut world, player) = open_world(8, 8, Pos::new(3, 3));
        world.entities[player].wait = 2;

        let outcome = world.step(Some(PlayerCommand::Move(Direction::East)));
        assert_eq!(outcome.error, Some(CoreError::PlayerNotReady { wait: 2 }));
        assert!(!outcome.player_acted);
        assert_eq!(world.entities[player].wait, 1);
        assert_eq!(world.entities[player].pos, Pos::new(3, 3));
    }

    #[test]
    fn ready_player_moves_and_waits_out_its_speed() {
        let (mut world, player) = open_world(8, 8, Pos::new(3, 3));
        let outcome = world.step(Some(PlayerCommand::Move(Direction::East)));
        assert!(outcome.player_acted && outcome.error.is_none());
        assert_eq!(world.entities[player].pos, Pos::new(4, 3));
        assert_eq!(world.entities[player].wait, world.config.player_speed);
        assert_eq!(outcome.turn, 1);
    }

    #[test]
    fn confusion_swap_survives_the_sweep() {
        let (mut world, _player) = open_world(12, 12, Pos::new(1, 1));
        let robot = add_robot(&mut world, Pos::new(8, 8));
        world.entities[robot].ai =
            Some(Behavior::Confused { previous: Box::new(Behavior::explore()), remaining: 0 });
        world.tick();
        assert!(matches!(world.entities[robot].ai, Some(Behavior::Explore(_))));
    }

    #[test]
    fn failing_turn_does_not_stop_the_sweep() {
        let (mut world, _player) = open_world(10, 10, Pos::new(1, 1));
        let broken = add_robot(&mut world, Pos::new(8, 8));
        let state = WorkerState { work_target: Some(Pos::new(40, 40)), ..WorkerState::default() };
        world.entities[broken].ai = Some(Behavior::Worker(state));
        let robot = add_robot(&mut world, Pos::new(5, 5));

        let report = world.tick();
        assert_eq!(report, SweepReport { acted: 2, waited: 0, failed: 1 });
        assert_ne!(world.entities[robot].pos, Pos::new(5, 5));
        assert!(matches!(world.entities[broken].ai, Some(Behavior::Worker(_))));
    }

    #[test]
    fn dead_world_refuses_to_step() {
        let (mut world, player) = open_world(8, 8, Pos::new(3, 3));
        world.kill(player, None).unwrap();
        let outcome = world.step(None);
        assert_eq!(outcome.error, Some(CoreError::GameOver));
        assert_eq!(world.run(10).stop_reason, RunStopReason::PlayerDied);
    }
}
