pub mod lambda;
pub mod sts;
