use std::fmt;

/// Progress of mapping acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingState {
    Needed,
    Building,
    Ready,
}

impl fmt::Display for MappingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MappingState::Needed => "mapping-needed",
            MappingState::Building => "mapping-building",
            MappingState::Ready => "mapping-ready",
        })
    }
}

/// Stages of the system-creation flow, in order.
///
/// A failed run is reported with the last stage it completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SystemStage {
    Start,
    ChainBuilt,
    FormatConverted,
    Remapped,
    Assembled,
    BoxCorrected,
    Written,
    Done,
}

impl SystemStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemStage::Start => "start",
            SystemStage::ChainBuilt => "chain-built",
            SystemStage::FormatConverted => "format-converted",
            SystemStage::Remapped => "remapped",
            SystemStage::Assembled => "assembled",
            SystemStage::BoxCorrected => "box-corrected",
            SystemStage::Written => "written",
            SystemStage::Done => "done",
        }
    }
}

impl fmt::Display for SystemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a workflow was when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Mapping(MappingState),
    System(SystemStage),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Mapping(state) => state.fmt(f),
            Stage::System(stage) => stage.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered_along_the_flow() {
        assert!(SystemStage::Start < SystemStage::ChainBuilt);
        assert!(SystemStage::Assembled < SystemStage::BoxCorrected);
        assert!(SystemStage::Written < SystemStage::Done);
    }

    #[test]
    fn stage_display_is_kebab_case() {
        assert_eq!(SystemStage::BoxCorrected.to_string(), "box-corrected");
        assert_eq!(
            Stage::Mapping(MappingState::Building).to_string(),
            "mapping-building"
        );
    }
}
