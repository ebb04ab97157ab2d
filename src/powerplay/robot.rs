//! Per-agent robot state and its phase machine.

use std::collections::VecDeque;
use std::fmt;

use crate::field::{Cell, Heading};

use super::station::{Slot, StationId};
use super::team::Team;

/// Ticks a crashed robot stays immobilised (1 s).
pub const CRASH_RECOVERY_TICKS: u32 = 2;

/// What a robot is doing, and so which decisions its agent may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// Holding a cone; the agent picks the station to score on.
    Junction,
    /// At a source before the late game; the cone is taken next tick.
    Loading,
    /// Driving to a source, adjusting over a junction, or recovering.
    Automated,
    /// At a source in the late game; the agent picks cone or beacon.
    Cone,
}

impl Phase {
    /// Whether the phase machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Junction, Junction)
                | (Junction, Automated)
                | (Loading, Junction)
                | (Loading, Automated)
                | (Automated, _)
                | (Cone, Junction)
                | (Cone, Automated)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Junction => write!(f, "junction"),
            Phase::Loading => write!(f, "loading"),
            Phase::Automated => write!(f, "automated"),
            Phase::Cone => write!(f, "cone"),
        }
    }
}

/// Mutable state of one robot for one episode.
#[derive(Debug, Clone)]
pub struct Robot {
    pub id: String,
    pub team: Team,
    pub slot: Slot,
    pub cell: Cell,
    pub heading: Heading,
    /// Seconds needed for a full lift cycle; drawn at reset.
    pub cycle_secs: u32,
    pub holding_cone: bool,
    pub holding_beacon: bool,
    /// Set once this robot has placed its beacon.
    pub placed_beacon: bool,
    /// Lining up over a junction before the cone drops.
    pub adjusting: bool,
    /// Remaining ticks of crash recovery or adjustment.
    pub timer: u32,
    /// Cells still to drive through, in order.
    pub path: VecDeque<Cell>,
    /// Scoring station chosen by the agent.
    pub target: Option<StationId>,
    /// Cone source the robot is routed to.
    pub source: Option<StationId>,
    pub crashed: bool,
    phase: Phase,
}

impl Robot {
    pub fn new(id: impl Into<String>, team: Team, slot: Slot, cell: Cell, heading: Heading) -> Self {
        Self {
            id: id.into(),
            team,
            slot,
            cell,
            heading,
            cycle_secs: 1,
            holding_cone: false,
            holding_beacon: false,
            placed_beacon: false,
            adjusting: false,
            timer: 0,
            path: VecDeque::new(),
            target: None,
            source: None,
            crashed: false,
            phase: Phase::Automated,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal phase change {} -> {} for {}",
            self.phase,
            next,
            self.id
        );
        self.phase = next;
    }

    /// Lift cycle length in ticks.
    pub fn cycle_ticks(&self) -> u32 {
        2 * self.cycle_secs
    }

    /// Spends one tick on the planned path.
    ///
    /// Facing the next cell the robot drives into it; otherwise it turns to
    /// face it and stays put. A path that does not continue from the current
    /// cell is dropped. Returns true when no path remains.
    pub fn advance(&mut self) -> bool {
        if let Some(&next) = self.path.front() {
            match Heading::between(self.cell, next) {
                Some(dir) if dir == self.heading => {
                    self.cell = next;
                    self.path.pop_front();
                }
                Some(dir) => self.heading = dir,
                None => self.path.clear(),
            }
        }
        self.path.is_empty()
    }

    /// Immobilises the robot for [`CRASH_RECOVERY_TICKS`].
    pub fn crash(&mut self) {
        self.crashed = true;
        self.adjusting = false;
        self.timer = CRASH_RECOVERY_TICKS;
        self.phase = Phase::Automated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn robot() -> Robot {
        Robot::new("red_1", Team::Red, Slot::One, 14, Heading::East)
    }

    #[test]
    fn phase_table() {
        assert!(Phase::Automated.can_transition_to(Phase::Cone));
        assert!(Phase::Loading.can_transition_to(Phase::Junction));
        assert!(!Phase::Junction.can_transition_to(Phase::Loading));
        assert!(!Phase::Cone.can_transition_to(Phase::Loading));
        assert!(!Phase::Junction.can_transition_to(Phase::Cone));
    }

    #[test]
    fn advance_moves_straight_and_turns_in_place() {
        let mut r = robot();
        r.path = VecDeque::from(vec![15, 21]);
        assert!(!r.advance());
        assert_eq!(r.cell, 15);
        // Turning south costs a tick without moving.
        assert!(!r.advance());
        assert_eq!((r.cell, r.heading), (15, Heading::South));
        assert!(r.advance());
        assert_eq!(r.cell, 21);
    }

    #[test]
    fn broken_path_is_dropped() {
        let mut r = robot();
        r.path = VecDeque::from(vec![30]);
        assert!(r.advance());
        assert_eq!(r.cell, 14);
    }

    #[test]
    fn crash_sets_recovery() {
        let mut r = robot();
        r.set_phase(Phase::Junction);
        r.adjusting = true;
        r.crash();
        assert!(r.crashed);
        assert!(!r.adjusting);
        assert_eq!(r.timer, CRASH_RECOVERY_TICKS);
        assert_eq!(r.phase(), Phase::Automated);
    }
}
