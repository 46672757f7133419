use log::warn;
use serde::{Deserialize, Serialize};

/// Tilt used in place of exactly +90 degrees.
pub const TILT_POSITIVE_LIMIT: f64 = 90.001;
/// Tilt used in place of exactly -90 degrees.
pub const TILT_NEGATIVE_LIMIT: f64 = -90.01;
/// First condition that starts from the hands (bars, vault, handstand).
pub const HAND_SUPPORT_CONDITION: usize = 8;
/// Marker height below which the body has touched the ground.
pub const CONTACT_THRESHOLD: f64 = -0.05;

/// Take-off state of the gymnast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TakeoffParameters {
    /// Somersault angle at take-off (deg).
    pub rotation: f64,
    /// Tilt angle at take-off (deg).
    pub tilt: f64,
    /// Somersault speed (rev/s).
    pub somersault_speed: f64,
    /// Twist speed (rev/s).
    pub twist_speed: f64,
    /// Forward speed (m/s).
    pub anteroposterior_speed: f64,
    /// Upward speed (m/s).
    pub vertical_speed: f64,
    /// Apparatus selector; indexes the model's heights.
    pub condition: usize,
}

impl Default for TakeoffParameters {
    fn default() -> Self {
        TakeoffParameters {
            rotation: 0.0,
            tilt: 0.0,
            somersault_speed: 0.0,
            twist_speed: 0.0,
            anteroposterior_speed: 0.0,
            vertical_speed: 0.0,
            condition: 0,
        }
    }
}

impl TakeoffParameters {
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_tilt(mut self, degrees: f64) -> Self {
        self.tilt = degrees;
        self
    }

    pub fn with_somersault_speed(mut self, rev_per_s: f64) -> Self {
        self.somersault_speed = rev_per_s;
        self
    }

    pub fn with_twist_speed(mut self, rev_per_s: f64) -> Self {
        self.twist_speed = rev_per_s;
        self
    }

    pub fn with_anteroposterior_speed(mut self, speed: f64) -> Self {
        self.anteroposterior_speed = speed;
        self
    }

    pub fn with_vertical_speed(mut self, speed: f64) -> Self {
        self.vertical_speed = speed;
        self
    }

    pub fn with_condition(mut self, condition: usize) -> Self {
        self.condition = condition;
        self
    }

    /// Somersault angle in radians.
    pub fn rotation_radians(&self) -> f64 {
        self.rotation.to_radians()
    }

    /// Tilt angle in radians. Exactly +/-90 degrees is nudged off the
    /// singular orientation.
    pub fn tilt_radians(&self) -> f64 {
        let tilt = if self.tilt == 90.0 {
            TILT_POSITIVE_LIMIT
        } else if self.tilt == -90.0 {
            TILT_NEGATIVE_LIMIT
        } else {
            self.tilt
        };
        if tilt != self.tilt {
            warn!("tilt of {} deg adjusted to {} deg", self.tilt, tilt);
        }
        tilt.to_radians()
    }

    /// Somersault speed in rad/s.
    pub fn somersault_rate(&self) -> f64 {
        self.somersault_speed * std::f64::consts::TAU
    }

    /// Twist speed in rad/s.
    pub fn twist_rate(&self) -> f64 {
        self.twist_speed * std::f64::consts::TAU
    }

    /// Name of the first non-zero take-off angle or speed, if any.
    pub fn first_motion(&self) -> Option<&'static str> {
        [
            ("rotation", self.rotation),
            ("tilt", self.tilt),
            ("somersault speed", self.somersault_speed),
            ("twist speed", self.twist_speed),
            ("anteroposterior speed", self.anteroposterior_speed),
            ("vertical speed", self.vertical_speed),
        ]
        .into_iter()
        .find(|&(_, value)| value != 0.0)
        .map(|(name, _)| name)
    }

    /// Whether the initial height is measured from the feet rather than the
    /// hands.
    pub fn starts_on_feet(&self) -> bool {
        self.condition < HAND_SUPPORT_CONDITION && self.rotation_radians().cos() > 0.0
    }
}

/// How the animation is played back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    #[default]
    Normal,
    /// Gestures in the air; the ground is ignored.
    Gesticulation,
}

/// Whether a flight under `condition` ends at ground contact.
pub fn checks_contact(condition: usize, play_mode: PlayMode) -> bool {
    condition > 0 && play_mode != PlayMode::Gesticulation
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tilt_adjustment() {
        let up = TakeoffParameters::default().with_tilt(90.0);
        assert_relative_eq!(up.tilt_radians(), 90.001_f64.to_radians());

        let down = TakeoffParameters::default().with_tilt(-90.0);
        assert_relative_eq!(down.tilt_radians(), (-90.01_f64).to_radians());

        let other = TakeoffParameters::default().with_tilt(45.0);
        assert_relative_eq!(other.tilt_radians(), std::f64::consts::FRAC_PI_4);
    }

    #[test]
    fn test_speeds_in_radians() {
        let takeoff = TakeoffParameters::default()
            .with_somersault_speed(1.0)
            .with_twist_speed(0.5);
        assert_relative_eq!(takeoff.somersault_rate(), 2.0 * std::f64::consts::PI);
        assert_relative_eq!(takeoff.twist_rate(), std::f64::consts::PI);
    }

    #[test]
    fn test_support_selection() {
        let floor = TakeoffParameters::default().with_condition(1);
        assert!(floor.starts_on_feet());
        // Upside down at take-off
        assert!(!floor.with_rotation(180.0).starts_on_feet());
        assert!(!floor.with_condition(HAND_SUPPORT_CONDITION).starts_on_feet());
    }

    #[test]
    fn test_contact_rules() {
        assert!(!checks_contact(0, PlayMode::Normal));
        assert!(checks_contact(1, PlayMode::Normal));
        assert!(!checks_contact(1, PlayMode::Gesticulation));
    }
}
