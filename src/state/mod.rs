pub mod pair_store;

pub use pair_store::PairStore;
