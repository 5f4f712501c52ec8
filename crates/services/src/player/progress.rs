/// Aggregated view of course progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProgress {
    pub total: usize,
    pub completed: usize,
    pub percent: u8,
    pub is_complete: bool,
}
