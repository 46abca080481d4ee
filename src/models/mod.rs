pub mod column;
pub mod protocol;
pub mod snapshot;

pub use column::{CustomColumnDef, DeterminedFormat, EffectiveFormat, FormatType};
pub use protocol::{
    DexsTotals, MetricTotals, ParentProtocol, ProtocolRecord, TvlBuckets, TvlChange, TvlKind,
    TvlSnapshot,
};
pub use snapshot::{ChainSnapshot, ExtraSeries, ExtraTvlCharts};
