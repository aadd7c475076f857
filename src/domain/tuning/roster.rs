/// Starting stats for a single piece in the opening roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceTuning {
    pub hp: i32,
    pub attack: i32,
    pub attack_range: i32,
    /// Higher speed resolves earlier within a turn.
    pub speed: i32,
    pub stealth: i32,
    pub stealth_regeneration: i32,
}

impl PieceTuning {
    const fn with_speed(speed: i32) -> Self {
        Self {
            hp: 3,
            attack: 1,
            attack_range: 1,
            speed,
            stealth: 3,
            stealth_regeneration: 0,
        }
    }
}

/// Opening roster for both sides, one entry per column slot.
///
/// Slot `n` spawns as `host_n` / `guest_n` in column `n` of the owning side's start row.
#[derive(Debug, Clone)]
pub struct RosterTuning {
    pub attacker: Vec<PieceTuning>,
    pub defender: Vec<PieceTuning>,
}

impl Default for RosterTuning {
    fn default() -> Self {
        Self {
            attacker: vec![
                PieceTuning::with_speed(4),
                PieceTuning::with_speed(3),
                PieceTuning::with_speed(2),
            ],
            defender: vec![
                PieceTuning::with_speed(3),
                PieceTuning::with_speed(2),
                PieceTuning::with_speed(1),
            ],
        }
    }
}
