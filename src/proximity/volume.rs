//! Distance attenuation curves

use std::str::FromStr;

/// Shape of the attenuation curve inside the audible radius
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Falloff {
    /// `max_volume` at distance 0 down to 0 at `max_distance`
    #[default]
    Linear,
    /// `max_volume / (1 + d^2)`
    InverseSquare,
}

impl FromStr for Falloff {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "inverse_square" | "inverse-square" => Ok(Self::InverseSquare),
            other => Err(format!("unknown falloff '{}'", other)),
        }
    }
}

/// What a listener beyond `max_distance` hears
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfRange {
    /// Clamp to `min_volume`
    #[default]
    Floor,
    /// Exactly zero
    Silent,
}

impl FromStr for OutOfRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "floor" => Ok(Self::Floor),
            "silent" => Ok(Self::Silent),
            other => Err(format!("unknown out-of-range policy '{}'", other)),
        }
    }
}

/// Attenuation parameters. `max_distance` doubles as the proximity radius.
///
/// Invariants (checked by config loading): `max_distance > 0`,
/// `0 <= min_volume <= max_volume`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeModel {
    pub max_distance: f64,
    pub max_volume: f64,
    pub min_volume: f64,
    pub falloff: Falloff,
    pub out_of_range: OutOfRange,
}

impl Default for VolumeModel {
    fn default() -> Self {
        Self {
            max_distance: 30.0,
            max_volume: 1.0,
            min_volume: 0.01,
            falloff: Falloff::Linear,
            out_of_range: OutOfRange::Floor,
        }
    }
}

impl VolumeModel {
    /// Volume heard at `distance`; non-increasing in distance and always in
    /// `[0, max_volume]`
    pub fn volume(&self, distance: f64) -> f64 {
        let floor = self.min_volume.max(0.0).min(self.max_volume);

        if distance <= 0.0 {
            return self.max_volume;
        }
        if distance.is_nan() || distance > self.max_distance {
            return match self.out_of_range {
                OutOfRange::Floor => floor,
                OutOfRange::Silent => 0.0,
            };
        }

        let raw = match self.falloff {
            Falloff::Linear => self.max_volume * (1.0 - distance / self.max_distance),
            Falloff::InverseSquare => self.max_volume / (1.0 + distance * distance),
        };

        raw.max(floor).min(self.max_volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use proptest::prelude::*;

    fn model_strategy() -> impl Strategy<Value = VolumeModel> {
        (
            1.0..500.0f64,
            0.1..2.0f64,
            0.0..1.0f64,
            prop_oneof![Just(Falloff::Linear), Just(Falloff::InverseSquare)],
            prop_oneof![Just(OutOfRange::Floor), Just(OutOfRange::Silent)],
        )
            .prop_map(|(max_distance, max_volume, min_frac, falloff, out_of_range)| {
                VolumeModel {
                    max_distance,
                    max_volume,
                    min_volume: max_volume * min_frac * 0.1,
                    falloff,
                    out_of_range,
                }
            })
    }

    #[test]
    fn linear_defaults() {
        let model = VolumeModel::default();
        assert_approx_eq!(model.volume(0.0), 1.0);
        assert_approx_eq!(model.volume(15.0), 0.5);
        assert_approx_eq!(model.volume(30.0), 0.01);
        assert_approx_eq!(model.volume(31.0), 0.01);
    }

    #[test]
    fn silent_policy_is_zero_beyond_radius() {
        let model = VolumeModel {
            out_of_range: OutOfRange::Silent,
            ..VolumeModel::default()
        };
        assert_eq!(model.volume(30.5), 0.0);
        assert_eq!(model.volume(f64::NAN), 0.0);
        assert_approx_eq!(model.volume(30.0), 0.01);
    }

    #[test]
    fn inverse_square_curve() {
        let model = VolumeModel {
            falloff: Falloff::InverseSquare,
            ..VolumeModel::default()
        };
        assert_approx_eq!(model.volume(0.0), 1.0);
        assert_approx_eq!(model.volume(1.0), 0.5);
        assert_approx_eq!(model.volume(3.0), 0.1);
        assert_approx_eq!(model.volume(20.0), 0.01);
    }

    #[test]
    fn parse_policies() {
        assert_eq!("Linear".parse::<Falloff>(), Ok(Falloff::Linear));
        assert_eq!("inverse_square".parse::<Falloff>(), Ok(Falloff::InverseSquare));
        assert!("cubic".parse::<Falloff>().is_err());
        assert_eq!("silent".parse::<OutOfRange>(), Ok(OutOfRange::Silent));
        assert!("loud".parse::<OutOfRange>().is_err());
    }

    #[test]
    fn prop_full_volume_at_zero() {
        proptest!(|(model in model_strategy())| {
            prop_assert_eq!(model.volume(0.0), model.max_volume);
        });
    }

    #[test]
    fn prop_volume_is_bounded() {
        proptest!(|(model in model_strategy(), d in 0.0..1000.0f64)| {
            let v = model.volume(d);
            prop_assert!(v >= 0.0);
            prop_assert!(v <= model.max_volume);
        });
    }

    #[test]
    fn prop_volume_is_non_increasing() {
        proptest!(|(model in model_strategy(), a in 0.0..1.0f64, b in 0.0..1.0f64)| {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let d1 = lo * model.max_distance;
            let d2 = hi * model.max_distance;
            prop_assert!(model.volume(d1) >= model.volume(d2));
        });
    }
}
