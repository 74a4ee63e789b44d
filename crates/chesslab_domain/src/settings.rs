use crate::EngineMode;

pub const DEFAULT_ENGINE_DEPTH: u32 = 12;
pub const DEFAULT_ENGINE_MULTIPV: u32 = 3;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EngineSettings {
    pub mode: EngineMode,
    pub depth: u32,
    pub multipv: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            mode: default_engine_mode(),
            depth: DEFAULT_ENGINE_DEPTH,
            multipv: DEFAULT_ENGINE_MULTIPV,
        }
    }
}

impl EngineSettings {
    /// Zero depth or multipv falls back to the defaults.
    pub fn new(mode: EngineMode, depth: u32, multipv: u32) -> Self {
        Self {
            mode,
            depth: if depth == 0 {
                DEFAULT_ENGINE_DEPTH
            } else {
                depth
            },
            multipv: if multipv == 0 {
                DEFAULT_ENGINE_MULTIPV
            } else {
                multipv
            },
        }
    }
}

pub fn default_engine_mode() -> EngineMode {
    EngineMode::Client
}

pub fn parse_engine_mode(value: &str) -> Option<EngineMode> {
    EngineMode::parse(value)
}

pub fn parse_positive(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|v| *v > 0)
}
