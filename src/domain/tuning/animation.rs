/// Presentation hints attached to animation commands (milliseconds).
///
/// These carry no gameplay meaning; clients use them to pace replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationTuning {
    pub move_ms: u32,
    pub blocked_move_ms: u32,
    pub bullet_ms: u32,
    pub flash_ms: u32,
    pub trap_ms: u32,
}

impl Default for AnimationTuning {
    fn default() -> Self {
        Self {
            move_ms: 500,
            blocked_move_ms: 300,
            bullet_ms: 300,
            flash_ms: 100,
            trap_ms: 300,
        }
    }
}
