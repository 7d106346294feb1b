//! Typed attribute codec for the Zanzibar-style authorization engine
//!
//! Attributes bind a typed value to an entity (`document:1` has `is_public = true`).
//! Wherever they cross a textual boundary (tuple storage rows, bundle files, test
//! fixtures, debug output) they travel in one canonical, lossless form:
//!
//! ```text
//! <entityType>:<entityID>$<attributeName>|<typeTag>:<value>
//! ```
//!
//! # Value Types
//!
//! The type set is closed: `boolean`, `string`, `double`, `integer` and the
//! homogeneous array form of each (`boolean[]`, ...). Arrays render as
//! comma-joined elements, doubles use their shortest round-trip form.
//!
//! # Example
//!
//! ```rust
//! use auth_attributes::{codec, Attribute, Entity};
//!
//! let attr = Attribute::new(Entity::new("doc", "1"), "is_public", true);
//! let text = codec::encode(&attr);
//! assert_eq!(text, "doc:1$is_public|boolean:true");
//! assert_eq!(codec::decode(&text).unwrap(), attr);
//! ```

pub mod codec;
pub mod dynamic;
pub mod error;
pub mod models;
pub mod types;
pub mod value;

pub use codec::{decode, encode, entity_to_string};
pub use dynamic::{any_to_string, type_to_string, type_url_to_string, validate_value, DynamicValue};
pub use error::{AttributeError, Result};
pub use models::{Attribute, Entity};
pub use types::{AttributeType, TYPE_URL_PREFIX, UNDEFINED};
pub use value::AttributeValue;
