use burn::prelude::*;

use crate::{algo::dqn::AgentConfig, gym::GameConfig, model::ValueNetConfig, train::TrainerConfig};

/// Everything needed to set up a training run, loadable from a JSON file
#[derive(Config, Debug)]
pub struct SnakeConfig {
    #[config(default = "GameConfig::new()")]
    pub game: GameConfig,
    #[config(default = "AgentConfig::new()")]
    pub agent: AgentConfig,
    #[config(default = "ValueNetConfig::new()")]
    pub model: ValueNetConfig,
    #[config(default = "TrainerConfig::new()")]
    pub trainer: TrainerConfig,
}

impl SnakeConfig {
    /// Seed both the simulator and the agent
    pub fn with_seed(self, seed: u64) -> Self {
        let game = self.game.clone().with_seed(Some(seed));
        let agent = self.agent.clone().with_seed(Some(seed));
        self.with_game(game).with_agent(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snake.json");
        let config = SnakeConfig::new()
            .with_game(GameConfig::new().with_wall_kill(false))
            .with_seed(9);

        config.save(&path).unwrap();
        let loaded = SnakeConfig::load(&path).unwrap();

        assert!(!loaded.game.wall_kill);
        assert_eq!(loaded.game.seed, Some(9));
        assert_eq!(loaded.agent.seed, Some(9));
        assert_eq!(loaded.trainer.episodes, 500);
        assert_eq!(loaded.model.hidden_1, 256);
    }
}
