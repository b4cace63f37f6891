//! Activation modes: what a key press or an idle frame turns into.

use std::fmt;
use std::str::FromStr;

use crate::fade::FadeClock;
use crate::scheduler::ScanKind;
use crate::visibility::VisibilityGate;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActivationMode {
    /// Key shows markers around the player; pressing again hides them.
    Toggle,
    /// Key shows markers, which fade out a few seconds later.
    FadeAway,
    /// Key refreshes markers; they stay until the next press.
    Trigger,
    /// Markers follow the view every frame; key pauses.
    #[default]
    Continuous,
}

impl ActivationMode {
    pub const ALL: [ActivationMode; 4] = [
        ActivationMode::Toggle,
        ActivationMode::FadeAway,
        ActivationMode::Trigger,
        ActivationMode::Continuous,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActivationMode::Toggle => "toggle",
            ActivationMode::FadeAway => "fade_away",
            ActivationMode::Trigger => "trigger",
            ActivationMode::Continuous => "continuous",
        }
    }
}

impl fmt::Display for ActivationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|m| m.name() == norm || (norm == "fadeaway" && *m == ActivationMode::FadeAway))
            .ok_or_else(|| format!("unknown activation mode '{}'", s))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeAction {
    StartScan(ScanKind),
    /// Abandon any pass and hide every marker.
    CancelScan,
    NoOp,
}

const ONE_SHOT: ScanKind = ScanKind::Full {
    gate: VisibilityGate::Distance,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActivationState {
    Toggle { active: bool },
    Trigger,
    FadeAway { fade: FadeClock },
    Continuous { paused: bool, pending_toggle: bool },
}

impl ActivationState {
    pub fn new(mode: ActivationMode) -> Self {
        match mode {
            ActivationMode::Toggle => ActivationState::Toggle { active: false },
            ActivationMode::Trigger => ActivationState::Trigger,
            ActivationMode::FadeAway => ActivationState::FadeAway {
                fade: FadeClock::new(),
            },
            ActivationMode::Continuous => ActivationState::Continuous {
                paused: false,
                pending_toggle: false,
            },
        }
    }

    pub fn mode(&self) -> ActivationMode {
        match self {
            ActivationState::Toggle { .. } => ActivationMode::Toggle,
            ActivationState::Trigger => ActivationMode::Trigger,
            ActivationState::FadeAway { .. } => ActivationMode::FadeAway,
            ActivationState::Continuous { .. } => ActivationMode::Continuous,
        }
    }

    /// Activation key pressed at `now` (seconds).
    pub fn on_key(&mut self, scan_running: bool, now: f64) -> ModeAction {
        if scan_running {
            if let ActivationState::Continuous { pending_toggle, .. } = self {
                *pending_toggle = true;
            }
            return ModeAction::NoOp;
        }
        match self {
            ActivationState::Toggle { active } => {
                *active = !*active;
                if *active {
                    ModeAction::StartScan(ONE_SHOT)
                } else {
                    ModeAction::CancelScan
                }
            }
            ActivationState::Trigger => ModeAction::StartScan(ONE_SHOT),
            ActivationState::FadeAway { fade } => {
                fade.restart(now);
                ModeAction::StartScan(ONE_SHOT)
            }
            ActivationState::Continuous { paused, .. } => toggle_pause(paused),
        }
    }

    /// Called every frame the scheduler has nothing in flight.
    pub fn on_idle_tick(&mut self) -> ModeAction {
        match self {
            ActivationState::Continuous {
                paused,
                pending_toggle,
            } => {
                if *pending_toggle {
                    *pending_toggle = false;
                    return toggle_pause(paused);
                }
                if *paused {
                    ModeAction::NoOp
                } else {
                    ModeAction::StartScan(ScanKind::Incremental)
                }
            }
            _ => ModeAction::NoOp,
        }
    }

    pub fn fade_mut(&mut self) -> Option<&mut FadeClock> {
        match self {
            ActivationState::FadeAway { fade } => Some(fade),
            _ => None,
        }
    }
}

fn toggle_pause(paused: &mut bool) -> ModeAction {
    *paused = !*paused;
    if *paused {
        ModeAction::CancelScan
    } else {
        ModeAction::StartScan(ScanKind::Full {
            gate: VisibilityGate::Frustum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mode_names() {
        assert_eq!("continuous".parse::<ActivationMode>(), Ok(ActivationMode::Continuous));
        assert_eq!("Fade-Away".parse::<ActivationMode>(), Ok(ActivationMode::FadeAway));
        assert_eq!("fadeaway".parse::<ActivationMode>(), Ok(ActivationMode::FadeAway));
        assert_eq!(" TOGGLE ".parse::<ActivationMode>(), Ok(ActivationMode::Toggle));
        assert!("sometimes".parse::<ActivationMode>().is_err());
        for m in ActivationMode::ALL {
            assert_eq!(m.to_string().parse::<ActivationMode>(), Ok(m));
            assert_eq!(ActivationState::new(m).mode(), m);
        }
    }

    #[test]
    fn toggle_alternates_scan_and_cancel() {
        let mut s = ActivationState::new(ActivationMode::Toggle);
        assert_eq!(s.on_key(false, 0.0), ModeAction::StartScan(ONE_SHOT));
        assert_eq!(s.on_key(false, 1.0), ModeAction::CancelScan);
        assert_eq!(s.on_key(false, 2.0), ModeAction::StartScan(ONE_SHOT));
        assert_eq!(s.on_idle_tick(), ModeAction::NoOp);
    }

    #[test]
    fn presses_during_scan_are_ignored() {
        let mut s = ActivationState::new(ActivationMode::Toggle);
        assert_eq!(s.on_key(true, 0.0), ModeAction::NoOp);
        assert_eq!(s, ActivationState::Toggle { active: false });

        let mut s = ActivationState::new(ActivationMode::Trigger);
        assert_eq!(s.on_key(true, 0.0), ModeAction::NoOp);
        assert_eq!(s.on_key(false, 0.0), ModeAction::StartScan(ONE_SHOT));
    }

    #[test]
    fn fade_away_restarts_clock() {
        let mut s = ActivationState::new(ActivationMode::FadeAway);
        assert_eq!(s.on_key(false, 5.0), ModeAction::StartScan(ONE_SHOT));
        let fade = s.fade_mut().unwrap();
        assert_eq!(fade.alpha_at(7.0), 1.0);
        assert_eq!(fade.alpha_at(11.0), 0.0);
        assert!(ActivationState::new(ActivationMode::Trigger).fade_mut().is_none());
    }

    #[test]
    fn continuous_tracks_until_paused() {
        let mut s = ActivationState::new(ActivationMode::Continuous);
        assert_eq!(s.on_idle_tick(), ModeAction::StartScan(ScanKind::Incremental));
        assert_eq!(s.on_key(false, 0.0), ModeAction::CancelScan);
        assert_eq!(s.on_idle_tick(), ModeAction::NoOp);
        assert_eq!(
            s.on_key(false, 1.0),
            ModeAction::StartScan(ScanKind::Full {
                gate: VisibilityGate::Frustum
            })
        );
    }

    #[test]
    fn continuous_queues_one_toggle_while_busy() {
        let mut s = ActivationState::new(ActivationMode::Continuous);
        assert_eq!(s.on_key(true, 0.0), ModeAction::NoOp);
        assert_eq!(s.on_key(true, 0.1), ModeAction::NoOp);
        assert_eq!(
            s,
            ActivationState::Continuous {
                paused: false,
                pending_toggle: true
            }
        );
        // applied once the scheduler is idle
        assert_eq!(s.on_idle_tick(), ModeAction::CancelScan);
        assert_eq!(s.on_idle_tick(), ModeAction::NoOp);
    }
}
