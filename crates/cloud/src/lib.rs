#![doc = include_str!("../README.md")]

pub mod collection;
pub mod error;
pub mod keypair;
pub mod provider;
pub mod sshkey;

pub use collection::KeyPairCollection;
pub use error::CloudError;
pub use keypair::KeyPair;
pub use provider::CloudProvider;
pub use sshkey::{GeneratedKeyPair, KeyAlgorithm, PublicKey};
