pub mod codec;
pub mod error;
pub mod space;
pub mod types;

pub use codec::{decode, decode_assignments, decode_component, discretize, encode, encode_component};
pub use error::{TuneError, TuneResult};
pub use space::validate_space;
pub use types::*;
