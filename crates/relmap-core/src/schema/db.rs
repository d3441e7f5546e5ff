mod ty;
pub use ty::Type;
