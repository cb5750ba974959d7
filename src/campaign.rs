use std::path::{Path, PathBuf};

use log::info;

use crate::config::SessionConfig;
use crate::constants::{CAMPAIGN_LOOP_SPEEDUP, LIFE_BONUS_EVERY, STARTING_LIVES};
use crate::error::LevelError;
use crate::types::GameOutcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Tutorial,
    Level(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CampaignStatus {
    Continue,
    GameOver,
}

/// Level order and lives across sessions. The tutorial repeats until won and
/// never costs a life.
#[derive(Clone, Debug)]
pub struct Campaign {
    stage: Stage,
    start_level: u32,
    last_level: u32,
    lives: i32,
    loops: u32,
}

impl Campaign {
    pub fn new(start_level: u32, last_level: u32, skip_tutorial: bool) -> Result<Self, LevelError> {
        if start_level > last_level {
            return Err(LevelError::Config(format!(
                "starting level {start_level} is past the last level {last_level}"
            )));
        }
        Ok(Self {
            stage: if skip_tutorial {
                Stage::Level(start_level)
            } else {
                Stage::Tutorial
            },
            start_level,
            last_level,
            lives: STARTING_LIVES,
            loops: 0,
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn loops(&self) -> u32 {
        self.loops
    }

    pub fn level_file_name(&self) -> String {
        match self.stage {
            Stage::Tutorial => "tutorial.txt".to_string(),
            Stage::Level(level) => format!("map{level}.txt"),
        }
    }

    pub fn level_path(&self, maps_dir: &Path) -> PathBuf {
        maps_dir.join(self.level_file_name())
    }

    /// Ghosts think faster on every pass through the level list.
    pub fn session_config(&self, base: &SessionConfig) -> SessionConfig {
        let speedup = CAMPAIGN_LOOP_SPEEDUP.powi(self.loops as i32);
        SessionConfig {
            think_multiplier: Some(base.effective_think_multiplier() * speedup),
            ..base.clone()
        }
    }

    pub fn record(&mut self, outcome: GameOutcome) -> CampaignStatus {
        match (self.stage, outcome) {
            (_, GameOutcome::InProgress) => {}
            (Stage::Tutorial, GameOutcome::Won) => {
                self.stage = Stage::Level(self.start_level);
            }
            (Stage::Tutorial, GameOutcome::Lost) => {}
            (Stage::Level(_), GameOutcome::Lost) => {
                self.lives -= 1;
                info!("life lost, {} left", self.lives);
                if self.lives < 0 {
                    return CampaignStatus::GameOver;
                }
            }
            (Stage::Level(level), GameOutcome::Won) => {
                if level % LIFE_BONUS_EVERY == 0 {
                    self.lives += 1;
                }
                let next = level + 1;
                self.stage = if next > self.last_level {
                    self.loops += 1;
                    info!("campaign loop {} begins", self.loops);
                    Stage::Level(0)
                } else {
                    Stage::Level(next)
                };
            }
        }
        CampaignStatus::Continue
    }
}
