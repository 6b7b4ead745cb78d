use clap::ValueEnum;
use context_sections::TraversalMode;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum ModeFlag {
    /// Children first, parents aggregate their children's metadata
    Aggregate,
    /// Every section generated on its own, no aggregation
    Independent,
}

impl ModeFlag {
    pub(crate) const fn as_domain(self) -> TraversalMode {
        match self {
            ModeFlag::Aggregate => TraversalMode::Aggregate,
            ModeFlag::Independent => TraversalMode::Independent,
        }
    }
}
