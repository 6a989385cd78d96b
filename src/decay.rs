use crate::error::ConfigError;

/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f32) -> f32;
}

fn validate(rate: f32, vi: f32, vf: f32) -> Result<(), ConfigError> {
    if !(rate > 0.0 && rate <= 1.0) {
        return Err(ConfigError::Invalid(format!(
            "decay rate must be in (0, 1], got {rate}"
        )));
    }
    if vi < vf {
        return Err(ConfigError::Invalid(format!(
            "initial value {vi} must not be below the floor {vf}"
        )));
    }
    Ok(())
}

/// v(t) = max(v<sub>i</sub> * r<sup>floor(t)</sup>, v<sub>f</sub>)
///
/// Geometric decay by a fixed factor per whole time unit, floored at `vf`.
/// With `r` in `(0, 1]` the value is non-increasing in `t` and never drops below `vf`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometric {
    rate: f32,
    vi: f32,
    vf: f32,
}

impl Geometric {
    pub fn new(rate: f32, vi: f32, vf: f32) -> Result<Self, ConfigError> {
        validate(rate, vi, vf)?;
        Ok(Self { rate, vi, vf })
    }

    /// The floor this schedule settles at
    pub fn floor(&self) -> f32 {
        self.vf
    }
}

impl Decay for Geometric {
    fn evaluate(&self, t: f32) -> f32 {
        let &Self { rate, vi, vf } = self;
        (vi * rate.powf(t.floor())).max(vf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_functional() {
        assert!(validate(0.5, 1.0, 0.0).is_ok());
        assert!(validate(1.0, 1.0, 1.0).is_ok());
        assert!(validate(0.0, 1.0, 0.0).is_err());
        assert!(validate(1.5, 1.0, 0.0).is_err());
        assert!(validate(0.5, 0.1, 0.5).is_err());
    }

    #[test]
    fn geometric_decay() {
        let x = Geometric::new(0.5, 2.0, 0.3).unwrap();
        assert_eq!(x.evaluate(0.0), 2.0);
        assert_eq!(x.evaluate(1.0), 1.0);
        assert_eq!(x.evaluate(1.5), 1.0, "only whole steps count");
        assert_eq!(x.evaluate(2.0), 0.5);
        assert_eq!(x.evaluate(3.0), 0.3, "floored");
        assert_eq!(x.evaluate(100.0), 0.3, "stays floored");
    }

    #[test]
    fn geometric_is_monotone() {
        let x = Geometric::new(0.995, 1.0, 0.01).unwrap();
        let mut prev = x.evaluate(0.0);
        for t in 1..2000 {
            let v = x.evaluate(t as f32);
            assert!(v <= prev, "non-increasing at t = {t}");
            assert!(v >= x.floor(), "never below floor at t = {t}");
            prev = v;
        }
        assert_eq!(prev, 0.01);
    }
}
