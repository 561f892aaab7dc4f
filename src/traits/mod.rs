mod aggregate;
mod bounded;
mod primitive;

pub use aggregate::Aggregate;
pub use bounded::Bounded;
pub use primitive::Primitive;
