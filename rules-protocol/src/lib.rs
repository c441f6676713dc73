pub mod error;
pub mod filter;
pub mod inspect;
pub mod logic;
pub mod union;

pub use error::ProtocolError;

pub mod prelude {
    pub use crate::error::ProtocolError;
    pub use crate::filter::{
        ops, ColumnFilter, ColumnFilterRule, ColumnRef, FilterKind, FilterTree, NullColumnFilter,
        NumericColumnFilter, ObjectPropertyRef, StringColumnFilter, ValueMacro,
    };
    pub use crate::inspect::{FilterView, LeafView};
    pub use crate::logic::{
        Effect, EffectV2, FilterNode, InputSource, NodeInput, OutputAndVersion, RuleLogic,
        Strategy, AGGREGATION_NODE, DEFAULT_GRAMMAR_VERSION, FILTER_NODE, WINDOW_NODE,
    };
}
