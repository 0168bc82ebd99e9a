//! Stable exit codes for scenegen CLI commands.

use crate::core::types::Stage;

/// Command succeeded (for `generate`: the video rendered).
pub const OK: i32 = 0;
/// Invalid input or config, or any error outside the generation pipeline.
pub const INVALID: i32 = 1;
/// The completion call failed; no scene file was written.
pub const GENERATION: i32 = 2;
/// The scene file could not be written; the renderer was not run.
pub const PERSISTENCE: i32 = 3;
/// The renderer failed; the scene file was left in place.
pub const RENDER: i32 = 4;

/// Exit code reported when a `generate` run fails in `stage`.
pub fn for_stage(stage: Stage) -> i32 {
    match stage {
        Stage::Generation => GENERATION,
        Stage::Persistence => PERSISTENCE,
        Stage::Render => RENDER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_codes_are_distinct_and_non_zero() {
        let codes = [
            for_stage(Stage::Generation),
            for_stage(Stage::Persistence),
            for_stage(Stage::Render),
        ];
        assert_eq!(codes, [GENERATION, PERSISTENCE, RENDER]);
        assert!(!codes.contains(&OK));
        assert!(!codes.contains(&INVALID));
    }
}
