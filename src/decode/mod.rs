//! Naming-convention decoder: author keys and original stems from raw names.

pub mod identity;
