pub mod algo;
pub mod config;
pub mod model;
pub mod ops;

pub use algo::dictionaries::{
    builtin_dictionaries, load_dictionaries, DictionaryLoadError, DictionarySet,
};
pub use config::EngineConfig;
pub use ops::{
    op_apply, op_auto_map, op_effectiveness, op_match_template, op_normalize, op_signature, Clock,
    SystemClock,
};
