/// The result of applying one action to an [`Environment`]
#[derive(Debug, Clone, PartialEq)]
pub struct Step<S> {
    /// The state observed after the action was applied
    pub state: S,
    /// The reward received for the action
    pub reward: f32,
    /// Whether the episode ended with this action
    pub done: bool,
    /// The episode score after the action
    pub score: u32,
}

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and a finite action space.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// Update the environment in response to an action taken by an agent, producing a new state and associated reward
    fn step(&mut self, action: Self::Action) -> Step<Self::State>;

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;
}

/// Named running totals for the current episode, in a fixed key order
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    entries: Vec<(&'static str, f64)>,
}

impl Report {
    pub fn new(keys: Vec<&'static str>) -> Self {
        Self {
            entries: keys.into_iter().map(|k| (k, 0.0)).collect(),
        }
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(k, _)| *k).collect()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    /// Mutable access to the value behind `key`, if it is tracked
    pub fn entry(&mut self, key: &str) -> Option<&mut f64> {
        self.entries
            .iter_mut()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Add `value` to the total behind `key`
    pub fn add(&mut self, key: &str, value: f64) {
        if let Some(v) = self.entry(key) {
            *v += value;
        }
    }

    /// Return the current values in key order and zero them
    pub fn take(&mut self) -> Vec<f64> {
        self.entries
            .iter_mut()
            .map(|(_, v)| std::mem::take(v))
            .collect()
    }

    /// Zero every value
    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|(_, v)| *v = 0.0);
    }
}
