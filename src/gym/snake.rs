use std::collections::{BTreeSet, HashSet, VecDeque};

use burn::config::Config;
use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use super::{
    features::{self, Observation},
    heading::{Action, Direction, Pos},
};
use crate::{
    env::{Environment, Report, Step},
    error::ConfigError,
};

/// Rules, rewards and geometry of the snake game
#[derive(Config, Debug)]
pub struct GameConfig {
    /// Grid width in cells
    #[config(default = 20)]
    pub width: i32,
    /// Grid height in cells
    #[config(default = 20)]
    pub height: i32,
    /// Side of one cell in presentation-layer pixels
    #[config(default = 20)]
    pub cell_size: i32,
    /// Leaving the grid is fatal when set, otherwise coordinates wrap around
    #[config(default = true)]
    pub wall_kill: bool,
    /// Score needed per level
    #[config(default = 5)]
    pub level_up_score: u32,
    /// First level that has obstacles
    #[config(default = 2)]
    pub obstacle_start_level: u32,
    /// Obstacles added per level from `obstacle_start_level` on
    #[config(default = 2)]
    pub obstacles_per_level: usize,
    #[config(default = 10)]
    pub max_obstacles: usize,
    /// Chebyshev radius around the head that obstacles never spawn in
    #[config(default = 3)]
    pub safe_radius: i32,
    /// Random draws per obstacle before placement is given up
    #[config(default = 100)]
    pub obstacle_attempts: usize,
    /// An episode stalls after `stall_factor * snake length` steps without food
    #[config(default = 100)]
    pub stall_factor: u32,
    #[config(default = "-10.0")]
    pub collision_reward: f32,
    #[config(default = 10.0)]
    pub food_reward: f32,
    /// Reward for a step that brings the head closer to the food
    #[config(default = 1.0)]
    pub approach_reward: f32,
    /// Reward for a step that does not bring the head closer to the food
    #[config(default = "-1.0")]
    pub retreat_reward: f32,
    pub seed: Option<u64>,
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 5 || self.height < 5 {
            return Err(ConfigError::Invalid(format!(
                "grid must be at least 5x5, got {}x{}",
                self.width, self.height
            )));
        }
        if self.cell_size <= 0 {
            return Err(ConfigError::Invalid("cell_size must be > 0".into()));
        }
        if self.level_up_score == 0 {
            return Err(ConfigError::Invalid("level_up_score must be > 0".into()));
        }
        if self.obstacle_start_level == 0 {
            return Err(ConfigError::Invalid("obstacle_start_level must be > 0".into()));
        }
        if self.stall_factor == 0 {
            return Err(ConfigError::Invalid("stall_factor must be > 0".into()));
        }
        // Room for the initial snake, the food, and every obstacle
        let cells = (self.width * self.height) as usize;
        if self.max_obstacles + 4 > cells {
            return Err(ConfigError::Invalid(format!(
                "max_obstacles {} does not fit a {}x{} grid",
                self.max_obstacles, self.width, self.height
            )));
        }
        Ok(())
    }

    /// Level reached with `score`
    pub fn level_for(&self, score: u32) -> u32 {
        score / self.level_up_score + 1
    }

    /// Number of obstacles the board should hold at `level`
    pub fn obstacle_target(&self, level: u32) -> usize {
        if level < self.obstacle_start_level {
            return 0;
        }
        let steps = (level - self.obstacle_start_level + 1) as usize;
        (steps * self.obstacles_per_level).min(self.max_obstacles)
    }
}

/// Snake body, head first, with a membership set kept in sync
#[derive(Debug, Clone)]
struct Snake {
    body: VecDeque<Pos>,
    cells: HashSet<Pos>,
}

impl Snake {
    fn new(body: impl IntoIterator<Item = Pos>) -> Self {
        let body = VecDeque::from_iter(body);
        let cells = body.iter().copied().collect();
        Self { body, cells }
    }

    fn head(&self) -> Pos {
        *self.body.front().expect("body is not empty")
    }

    fn len(&self) -> usize {
        self.body.len()
    }

    fn contains(&self, pos: &Pos) -> bool {
        self.cells.contains(pos)
    }

    /// Whether `pos` lies on a segment other than the head
    fn hits_body(&self, pos: &Pos) -> bool {
        *pos != self.head() && self.contains(pos)
    }

    fn push_front(&mut self, pos: Pos) {
        self.body.push_front(pos);
        self.cells.insert(pos);
    }

    fn pop_back(&mut self) {
        if let Some(tail) = self.body.pop_back() {
            self.cells.remove(&tail);
        }
    }
}

/// Owned copy of everything a renderer needs, safe to send across threads
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub width: i32,
    pub height: i32,
    pub snake: Vec<Pos>,
    pub food: Pos,
    pub obstacles: Vec<Pos>,
    pub heading: Direction,
    pub score: u32,
    pub level: u32,
}

/// The snake game as a reinforcement learning environment
///
/// All state changes go through [`reset`](Environment::reset) and [`step`](Environment::step).
/// Renderers poll the read-only accessors after each step.
pub struct SnakeEnv {
    config: GameConfig,
    snake: Snake,
    heading: Direction,
    food: Pos,
    obstacles: BTreeSet<Pos>,
    score: u32,
    level: u32,
    steps: u32,
    total_steps: u64,
    steps_since_food: u32,
    rng: StdRng,
    pub report: Report,
}

impl SnakeEnv {
    /// Create an environment with a fresh episode already set up
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut env = Self {
            snake: Snake::new(std::iter::empty()),
            heading: Direction::Right,
            food: (0, 0),
            obstacles: BTreeSet::new(),
            score: 0,
            level: 1,
            steps: 0,
            total_steps: 0,
            steps_since_food: 0,
            rng,
            report: Report::new(vec!["score", "reward", "steps"]),
            config,
        };
        env.reset();
        Ok(env)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Snake body, head first
    pub fn snake(&self) -> impl ExactSizeIterator<Item = &Pos> {
        self.snake.body.iter()
    }

    pub fn head(&self) -> Pos {
        self.snake.head()
    }

    pub fn snake_len(&self) -> usize {
        self.snake.len()
    }

    pub fn food(&self) -> Pos {
        self.food
    }

    pub fn obstacles(&self) -> impl ExactSizeIterator<Item = &Pos> {
        self.obstacles.iter()
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Steps taken this episode
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Steps taken since construction, across resets
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn steps_since_food(&self) -> u32 {
        self.steps_since_food
    }

    /// Top-left pixel of a cell in the presentation layer
    pub fn to_pixel(&self, pos: Pos) -> Pos {
        (pos.0 * self.config.cell_size, pos.1 * self.config.cell_size)
    }

    pub fn snake_pixels(&self) -> Vec<Pos> {
        self.snake().map(|&p| self.to_pixel(p)).collect()
    }

    pub fn food_pixel(&self) -> Pos {
        self.to_pixel(self.food)
    }

    pub fn obstacle_pixels(&self) -> Vec<Pos> {
        self.obstacles().map(|&p| self.to_pixel(p)).collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.config.width,
            height: self.config.height,
            snake: self.snake().copied().collect(),
            food: self.food,
            obstacles: self.obstacles().copied().collect(),
            heading: self.heading,
            score: self.score,
            level: self.level,
        }
    }

    /// Feature vector for the current state
    pub fn observe(&self) -> Observation {
        features::encode(self.head(), self.heading, self.food, |p| {
            self.is_collision(self.wrap(p))
        })
    }

    fn in_bounds(&self, pos: Pos) -> bool {
        pos.0 >= 0 && pos.1 >= 0 && pos.0 < self.config.width && pos.1 < self.config.height
    }

    /// Map out-of-grid coordinates back onto the grid when walls do not kill
    fn wrap(&self, pos: Pos) -> Pos {
        if self.config.wall_kill {
            pos
        } else {
            (
                pos.0.rem_euclid(self.config.width),
                pos.1.rem_euclid(self.config.height),
            )
        }
    }

    /// Checked in order: boundary, body (excluding the head), obstacles
    fn is_collision(&self, pos: Pos) -> bool {
        (self.config.wall_kill && !self.in_bounds(pos))
            || self.snake.hits_body(&pos)
            || self.obstacles.contains(&pos)
    }

    fn is_stalled(&self) -> bool {
        self.steps_since_food > self.config.stall_factor * self.snake.len() as u32
    }

    fn place_food(&mut self) {
        let mut vacant = Vec::with_capacity((self.config.width * self.config.height) as usize);
        for y in 0..self.config.height {
            for x in 0..self.config.width {
                let pos = (x, y);
                if !self.snake.contains(&pos) && !self.obstacles.contains(&pos) {
                    vacant.push(pos);
                }
            }
        }

        let (width, height) = (self.config.width, self.config.height);
        self.food = *vacant
            .choose(&mut self.rng)
            .unwrap_or_else(|| panic!("no free cell left for food on a {width}x{height} grid"));
    }

    /// Try to place one obstacle away from the head; gives up after a bounded number of draws
    fn place_obstacle(&mut self) -> bool {
        let head = self.head();
        let radius = self.config.safe_radius;
        for _ in 0..self.config.obstacle_attempts {
            let pos = (
                self.rng.gen_range(0..self.config.width),
                self.rng.gen_range(0..self.config.height),
            );
            let near_head = (pos.0 - head.0).abs() <= radius && (pos.1 - head.1).abs() <= radius;
            if !near_head
                && pos != self.food
                && !self.snake.contains(&pos)
                && !self.obstacles.contains(&pos)
            {
                self.obstacles.insert(pos);
                return true;
            }
        }
        false
    }

    fn top_up_obstacles(&mut self) {
        let target = self.config.obstacle_target(self.level);
        while self.obstacles.len() < target {
            if !self.place_obstacle() {
                debug!(
                    "gave up placing obstacle {} of {target} at level {}",
                    self.obstacles.len() + 1,
                    self.level
                );
                break;
            }
        }
    }

    fn finish(&mut self, reward: f32, done: bool) -> Step<Observation> {
        self.report.add("reward", reward as f64);
        self.report.add("steps", 1.0);
        if let Some(score) = self.report.entry("score") {
            *score = self.score as f64;
        }

        Step {
            state: self.observe(),
            reward,
            done,
            score: self.score,
        }
    }
}

impl Environment for SnakeEnv {
    type State = Observation;
    type Action = Action;

    fn reset(&mut self) -> Self::State {
        let (cx, cy) = (self.config.width / 2, self.config.height / 2);
        self.snake = Snake::new([(cx, cy), (cx - 1, cy), (cx - 2, cy)]);
        self.heading = Direction::Right;
        self.obstacles.clear();
        self.score = 0;
        self.level = 1;
        self.steps = 0;
        self.steps_since_food = 0;
        self.report.clear();
        self.place_food();
        self.observe()
    }

    fn step(&mut self, action: Self::Action) -> Step<Self::State> {
        self.steps += 1;
        self.total_steps += 1;
        self.steps_since_food += 1;
        self.heading = self.heading.turn(action);

        let head = self.head();
        let new_head = self.wrap(self.heading.advance(head));

        if self.is_collision(new_head) || self.is_stalled() {
            return self.finish(self.config.collision_reward, true);
        }

        self.snake.push_front(new_head);

        let reward = if new_head == self.food {
            self.score += 1;
            self.steps_since_food = 0;
            self.level = self.config.level_for(self.score);
            self.top_up_obstacles();
            self.place_food();
            self.config.food_reward
        } else {
            self.snake.pop_back();
            let old_dist = manhattan(head, self.food);
            let new_dist = manhattan(new_head, self.food);
            if new_dist < old_dist {
                self.config.approach_reward
            } else {
                self.config.retreat_reward
            }
        };

        self.finish(reward, false)
    }
}

fn manhattan(a: Pos, b: Pos) -> i32 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}

#[cfg(test)]
mod tests {
    use strum::{IntoEnumIterator, VariantArray};

    use super::*;

    fn config() -> GameConfig {
        GameConfig::new().with_seed(Some(7))
    }

    /// Environment with an exact body, heading and food
    fn env_with(config: GameConfig, body: &[Pos], heading: Direction, food: Pos) -> SnakeEnv {
        let mut env = SnakeEnv::new(config).unwrap();
        env.snake = Snake::new(body.iter().copied());
        env.heading = heading;
        env.food = food;
        env
    }

    fn body(env: &SnakeEnv) -> Vec<Pos> {
        env.snake().copied().collect()
    }

    fn assert_invariants(env: &SnakeEnv) {
        let body = body(env);
        let uniq = body.iter().collect::<HashSet<_>>();
        assert_eq!(uniq.len(), body.len(), "snake has no duplicate cells");
        assert_eq!(env.snake.cells.len(), body.len(), "membership set in sync");
        assert_eq!(
            env.level(),
            env.score() / env.config().level_up_score + 1,
            "level follows score"
        );
        assert!(!env.snake.contains(&env.food()), "food off the snake");
        assert!(!env.obstacles.contains(&env.food()), "food off obstacles");
        assert!(
            env.obstacles.len() <= env.config().max_obstacles,
            "obstacles capped"
        );
    }

    #[test]
    fn reset_state() {
        let env = SnakeEnv::new(config()).unwrap();
        assert_eq!(body(&env), [(10, 10), (9, 10), (8, 10)], "centered snake");
        assert_eq!(env.heading(), Direction::Right, "heading right");
        assert_eq!(env.score(), 0);
        assert_eq!(env.level(), 1);
        assert_eq!(env.obstacles().len(), 0, "no obstacles");
        assert!(
            ![(10, 10), (9, 10), (8, 10)].contains(&env.food()),
            "food not on snake"
        );
        assert!(env.in_bounds(env.food()), "food on grid");
    }

    #[test]
    fn reset_discards_episode() {
        let mut env = env_with(config(), &[(3, 3), (2, 3), (1, 3)], Direction::Up, (3, 2));
        env.step(Action::Straight);
        env.obstacles.insert((15, 15));
        env.reset();
        assert_eq!(body(&env), [(10, 10), (9, 10), (8, 10)]);
        assert_eq!(env.score(), 0);
        assert_eq!(env.steps(), 0);
        assert_eq!(env.total_steps(), 1, "lifetime count survives reset");
        assert_eq!(env.obstacles().len(), 0);
        assert_eq!(env.report.get("steps"), Some(0.0), "report cleared");
    }

    #[test]
    fn straight_step_moves_head() {
        let mut env = env_with(
            config(),
            &[(10, 10), (9, 10), (8, 10)],
            Direction::Right,
            (15, 10),
        );
        let step = env.step(Action::Straight);
        assert_eq!(body(&env), [(11, 10), (10, 10), (9, 10)], "moved right");
        assert_eq!(step.reward, 1.0, "closer to food");
        assert!(!step.done);
        assert_eq!(step.state, env.observe(), "observation of the new state");
    }

    #[test]
    fn eating_food_grows_snake() {
        let mut env = env_with(
            config(),
            &[(10, 10), (9, 10), (8, 10)],
            Direction::Right,
            (11, 10),
        );
        let step = env.step(Action::Straight);
        assert_eq!(
            body(&env),
            [(11, 10), (10, 10), (9, 10), (8, 10)],
            "grew by one"
        );
        assert_eq!(step.score, 1);
        assert_eq!(step.reward, 10.0);
        assert_eq!(env.steps_since_food(), 0, "stall counter reset");
        assert_invariants(&env);
    }

    #[test]
    fn moving_away_is_penalized() {
        let mut env = env_with(
            config(),
            &[(10, 10), (9, 10), (8, 10)],
            Direction::Right,
            (2, 2),
        );
        let step = env.step(Action::Straight);
        assert_eq!(step.reward, -1.0, "farther from food");

        let step = env.step(Action::Left);
        assert_eq!(env.head(), (11, 9), "counter-clockwise from right is up");
        assert_eq!(step.reward, 1.0, "closer again");
    }

    #[test]
    fn turns_are_relative() {
        let mut env = env_with(
            config(),
            &[(10, 10), (9, 10), (8, 10)],
            Direction::Right,
            (0, 0),
        );
        env.step(Action::Right);
        assert_eq!(env.head(), (10, 11), "clockwise from right is down");
        assert_eq!(env.heading(), Direction::Down);
        env.step(Action::Right);
        assert_eq!(env.head(), (9, 11), "clockwise from down is left");
        assert_eq!(env.heading(), Direction::Left);
    }

    #[test]
    fn wall_kill_at_boundary() {
        let mut env = env_with(
            config(),
            &[(15, 10), (14, 10), (13, 10)],
            Direction::Right,
            (0, 0),
        );
        for i in 1..=100 {
            let before = body(&env);
            let step = env.step(Action::Straight);
            if i < 5 {
                assert!(!step.done, "alive on step {i}");
                continue;
            }
            assert_eq!(i, 5, "dies crossing the boundary");
            assert!(step.done);
            assert_eq!(step.reward, -10.0);
            assert_eq!(body(&env), before, "snake untouched by the fatal step");
            break;
        }
    }

    #[test]
    fn wall_kill_next_to_boundary() {
        let mut env = env_with(
            config(),
            &[(19, 10), (18, 10), (17, 10)],
            Direction::Right,
            (0, 0),
        );
        let step = env.step(Action::Straight);
        assert!(step.done, "first step leaves the grid");
        assert_eq!(step.reward, -10.0);
        assert_eq!(body(&env), [(19, 10), (18, 10), (17, 10)]);
        assert_eq!(env.score(), 0);
    }

    #[test]
    fn total_steps_counts_across_episodes() {
        let mut env = SnakeEnv::new(config()).unwrap();
        let mut taken = 0;
        for _ in 0..3 {
            env.reset();
            loop {
                taken += 1;
                if env.step(Action::Left).done {
                    break;
                }
            }
        }
        assert_eq!(env.total_steps(), taken);
        assert!(u64::from(env.steps()) < taken, "per-episode count restarted");
    }

    #[test]
    fn wrap_mode_crosses_boundary() {
        let mut env = env_with(
            config().with_wall_kill(false),
            &[(19, 10), (18, 10), (17, 10)],
            Direction::Right,
            (5, 5),
        );
        let step = env.step(Action::Straight);
        assert!(!step.done, "wrapping is not fatal");
        assert_eq!(env.head(), (0, 10), "wrapped to the left edge");
    }

    #[test]
    fn self_collision_is_fatal() {
        let body_cells = [(5, 5), (6, 5), (6, 6), (5, 6), (4, 6)];
        let mut env = env_with(config(), &body_cells, Direction::Up, (0, 0));
        // Turning clockwise (right) from up moves onto (6, 5)
        let step = env.step(Action::Right);
        assert!(step.done);
        assert_eq!(step.reward, -10.0);
        assert_eq!(body(&env), body_cells, "no mutation after collision");
    }

    #[test]
    fn obstacle_collision_is_fatal() {
        let mut env = env_with(
            config(),
            &[(10, 10), (9, 10), (8, 10)],
            Direction::Right,
            (0, 0),
        );
        env.obstacles.insert((11, 10));
        assert_eq!(env.observe()[0], 1.0, "danger ahead flagged");
        let step = env.step(Action::Straight);
        assert!(step.done);
        assert_eq!(step.reward, -10.0);
    }

    #[test]
    fn stall_timeout_terminates() {
        let mut env = env_with(
            config().with_wall_kill(false).with_stall_factor(2),
            &[(10, 10), (9, 10), (8, 10)],
            Direction::Right,
            (0, 19),
        );
        for i in 1..=6 {
            assert!(!env.step(Action::Straight).done, "alive on step {i}");
        }
        let step = env.step(Action::Straight);
        assert!(step.done, "stalled after 2 * 3 steps without food");
        assert_eq!(step.reward, -10.0);
    }

    #[test]
    fn level_up_adds_obstacles() {
        let mut env = env_with(
            config(),
            &[(10, 10), (9, 10), (8, 10)],
            Direction::Right,
            (11, 10),
        );
        env.score = 4;
        let step = env.step(Action::Straight);
        assert_eq!(step.score, 5);
        assert_eq!(env.level(), 2, "level up at 5");
        assert_eq!(env.obstacles().len(), 2, "two obstacles at the first obstacle level");

        let head = env.head();
        for &(x, y) in env.obstacles() {
            assert!(
                (x - head.0).abs() > 3 || (y - head.1).abs() > 3,
                "obstacle ({x}, {y}) outside the safe radius"
            );
            assert!(!env.snake.contains(&(x, y)), "obstacle off the snake");
        }
        assert_invariants(&env);
    }

    #[test]
    fn obstacle_placement_gives_up() {
        // Every cell is within the safe radius of the head
        let mut env = env_with(
            config().with_width(5).with_height(5),
            &[(2, 2), (1, 2), (0, 2)],
            Direction::Right,
            (3, 2),
        );
        env.score = 4;
        let step = env.step(Action::Straight);
        assert!(!step.done);
        assert_eq!(env.level(), 2);
        assert_eq!(env.obstacles().len(), 0, "placement abandoned, not looping");
    }

    #[test]
    fn obstacle_targets() {
        let config = GameConfig::new();
        assert_eq!(config.obstacle_target(1), 0);
        assert_eq!(config.obstacle_target(2), 2);
        assert_eq!(config.obstacle_target(3), 4);
        assert_eq!(config.obstacle_target(50), 10, "capped");
    }

    #[test]
    fn pixels_scale_with_cell_size() {
        let env = SnakeEnv::new(config()).unwrap();
        assert_eq!(env.snake_pixels()[0], (200, 200));
        let (fx, fy) = env.food();
        assert_eq!(env.food_pixel(), (fx * 20, fy * 20));
        assert!(env.obstacle_pixels().is_empty());

        let snapshot = env.snapshot();
        assert_eq!(snapshot.snake, body(&env));
        assert_eq!(snapshot.food, env.food());
    }

    #[test]
    fn invalid_configs_rejected() {
        assert!(SnakeEnv::new(GameConfig::new().with_width(3)).is_err());
        assert!(SnakeEnv::new(GameConfig::new().with_level_up_score(0)).is_err());
        assert!(SnakeEnv::new(GameConfig::new().with_max_obstacles(1000)).is_err());
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let run = || {
            let mut env = SnakeEnv::new(config().with_wall_kill(false)).unwrap();
            let mut rng = StdRng::seed_from_u64(3);
            let mut trace = Vec::new();
            for _ in 0..300 {
                let action = *Action::VARIANTS.choose(&mut rng).unwrap();
                let step = env.step(action);
                trace.push((env.head(), env.food(), step.reward));
                if step.done {
                    env.reset();
                }
            }
            trace
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn random_play_keeps_invariants() {
        for wall_kill in [true, false] {
            let mut env = SnakeEnv::new(config().with_wall_kill(wall_kill)).unwrap();
            let mut rng = StdRng::seed_from_u64(11);
            let actions = Action::iter().collect::<Vec<_>>();
            for _ in 0..2000 {
                let before_score = env.score();
                let before_len = env.snake_len();
                let step = env.step(*actions.choose(&mut rng).unwrap());
                assert_invariants(&env);
                assert!(step.score >= before_score, "score never decreases");
                if step.done {
                    assert_eq!(step.reward, -10.0);
                    assert_eq!(env.snake_len(), before_len);
                    env.reset();
                } else if step.score > before_score {
                    assert_eq!(env.snake_len(), before_len + 1);
                    assert_eq!(step.score, before_score + 1);
                } else {
                    assert_eq!(env.snake_len(), before_len);
                }
            }
        }
    }
}
