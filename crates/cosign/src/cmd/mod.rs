pub mod authorize;
pub mod digest;
pub mod info;
pub mod signers;
