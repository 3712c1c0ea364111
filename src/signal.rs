use crate::RoadError;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The traffic signal at a fixed point along a road.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Signal {
    /// The current state.
    state: SignalState,
    /// The longitudinal position of the stop line in m.
    pos: f64,
}

/// The state of a traffic signal.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum SignalState {
    #[default]
    Red,
    Green,
}

impl SignalState {
    /// The display colour of the signal as RGB.
    pub fn color(self) -> [u8; 3] {
        match self {
            SignalState::Red => [237, 32, 32],
            SignalState::Green => [11, 229, 8],
        }
    }
}

impl FromStr for SignalState {
    type Err = RoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RED" => Ok(SignalState::Red),
            "GREEN" => Ok(SignalState::Green),
            other => Err(RoadError::InvalidSignal(other.to_string())),
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalState::Red => f.write_str("RED"),
            SignalState::Green => f.write_str("GREEN"),
        }
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self {
            state: SignalState::Red,
            pos: 0.0,
        }
    }
}

impl Signal {
    /// Gets the current state.
    pub fn state(&self) -> SignalState {
        self.state
    }

    /// The display colour of the signal as RGB.
    pub fn color(&self) -> [u8; 3] {
        self.state.color()
    }

    /// The longitudinal position of the stop line in m.
    pub fn pos(&self) -> f64 {
        self.pos
    }

    pub(crate) fn set_state(&mut self, state: SignalState) {
        self.state = state;
    }

    pub(crate) fn set_pos(&mut self, pos: f64) {
        self.pos = pos;
    }

    /// The stop line a vehicle whose front is at `front` must not pass, if any.
    ///
    /// A red signal holds every vehicle which has not yet crossed its line.
    pub(crate) fn stop_line_for(&self, front: f64) -> Option<f64> {
        match self.state {
            SignalState::Red if front <= self.pos => Some(self.pos),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_signal_names() {
        assert_eq!("RED".parse::<SignalState>(), Ok(SignalState::Red));
        assert_eq!("GREEN".parse::<SignalState>(), Ok(SignalState::Green));
        assert_eq!(
            "AMBER".parse::<SignalState>(),
            Err(RoadError::InvalidSignal("AMBER".into()))
        );
        assert!("green".parse::<SignalState>().is_err());
    }

    #[test]
    fn red_holds_only_vehicles_behind_the_line() {
        let mut signal = Signal::default();
        signal.set_pos(50.0);
        assert_eq!(signal.stop_line_for(20.0), Some(50.0));
        assert_eq!(signal.stop_line_for(50.0), Some(50.0));
        assert_eq!(signal.stop_line_for(50.5), None);

        signal.set_state(SignalState::Green);
        assert_eq!(signal.stop_line_for(20.0), None);
    }

    #[test]
    fn colours_follow_state() {
        let mut signal = Signal::default();
        assert_eq!(signal.color(), [237, 32, 32]);
        signal.set_state(SignalState::Green);
        assert_eq!(signal.color(), [11, 229, 8]);
        assert_eq!(signal.state().to_string(), "GREEN");
    }
}
