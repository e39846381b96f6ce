/// Index into the fixed pool of logical workspaces.
pub type WorkspaceIndex = usize;

pub const WORKSPACE_COUNT: usize = 10;

pub fn is_valid_workspace(index: WorkspaceIndex) -> bool {
    index < WORKSPACE_COUNT
}

/// Keyboard digit for a workspace: indices 0-8 map to 1-9, index 9 maps to 0.
pub fn workspace_digit(index: WorkspaceIndex) -> u8 {
    ((index + 1) % WORKSPACE_COUNT) as u8
}

pub fn workspace_from_digit(digit: u8) -> Option<WorkspaceIndex> {
    match digit {
        0 => Some(WORKSPACE_COUNT - 1),
        1..=9 => Some(digit as usize - 1),
        _ => None,
    }
}
