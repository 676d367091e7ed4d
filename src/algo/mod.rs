pub mod applicator;
pub mod automap;
pub mod cache;
pub mod dictionaries;
pub mod effectiveness;
pub mod matcher;
pub mod normalizer;
pub mod signature;
pub mod string_distance;
pub mod tokenizer;
