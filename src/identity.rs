//! Identity type bounds shared by cookies, sessions, and the middleware.

// crates.io
use serde::{Serialize, de::DeserializeOwned};

/// A unique identifier assigned to each user, associable with any number of
/// sessions. Typically a row id from the user database.
///
/// The blanket impl covers every copyable, comparable, serde-round-trippable
/// scalar, which in practice means the unsigned and signed integer types
/// services actually key users by.
pub trait Identity: Copy + Eq + Send + Sync + Serialize + DeserializeOwned + 'static {}

impl<T> Identity for T where T: Copy + Eq + Send + Sync + Serialize + DeserializeOwned + 'static {}
