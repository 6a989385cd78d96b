use crate::env::Environment;

/// Represents a single experience or transition in the environment
pub struct Exp<E: Environment> {
    /// The state of the environment before taking the action
    pub state: E::State,
    /// The action taken in the given state
    pub action: E::Action,
    /// The reward received after taking the action
    pub reward: f32,
    /// The state of the environment after the action is taken
    pub next_state: E::State,
    /// Whether the action ended the episode
    pub done: bool,
}

impl<E: Environment> Clone for Exp<E>
where
    E::State: Clone,
    E::Action: Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            action: self.action.clone(),
            reward: self.reward,
            next_state: self.next_state.clone(),
            done: self.done,
        }
    }
}

/// A zipped batch of [experiences](Exp)
pub struct ExpBatch<E: Environment> {
    pub states: Vec<E::State>,
    pub actions: Vec<E::Action>,
    pub rewards: Vec<f32>,
    pub next_states: Vec<E::State>,
    pub dones: Vec<bool>,
}

impl<E: Environment> ExpBatch<E>
where
    E::State: Clone,
    E::Action: Clone,
{
    /// Construct an `ExpBatch` from an iterator of [experience](Exp) references and a size hint
    pub fn from_iter<'a>(iter: impl IntoIterator<Item = &'a Exp<E>>, batch_size: usize) -> Self
    where
        E: 'a,
    {
        let batch = Self {
            states: Vec::with_capacity(batch_size),
            actions: Vec::with_capacity(batch_size),
            rewards: Vec::with_capacity(batch_size),
            next_states: Vec::with_capacity(batch_size),
            dones: Vec::with_capacity(batch_size),
        };

        iter.into_iter().fold(batch, |mut b, e| {
            b.states.push(e.state.clone());
            b.actions.push(e.action.clone());
            b.rewards.push(e.reward);
            b.next_states.push(e.next_state.clone());
            b.dones.push(e.done);
            b
        })
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::env::Step;

    pub struct MockEnv;

    impl Environment for MockEnv {
        type State = i32;
        type Action = i32;

        fn step(&mut self, _action: Self::Action) -> Step<Self::State> {
            Step {
                state: 0,
                reward: 0.0,
                done: true,
                score: 0,
            }
        }

        fn reset(&mut self) -> Self::State {
            0
        }
    }

    pub fn mock_exp(i: i32) -> Exp<MockEnv> {
        Exp {
            state: i,
            action: i + 1,
            reward: i as f32,
            next_state: i + 1,
            done: i % 2 == 1,
        }
    }

    #[test]
    fn exp_batch_from_iter() {
        let experiences = [mock_exp(0), mock_exp(1)];
        let batch = ExpBatch::from_iter(&experiences, 2);

        assert_eq!(batch.len(), 2, "Batch length correct");
        assert_eq!(batch.states, [0, 1], "States constructed correctly");
        assert_eq!(batch.actions, [1, 2], "Actions constructed correctly");
        assert_eq!(batch.rewards, [0.0, 1.0], "Rewards constructed correctly");
        assert_eq!(batch.next_states, [1, 2], "Next states constructed correctly");
        assert_eq!(batch.dones, [false, true], "Terminal flags constructed correctly");
    }
}
