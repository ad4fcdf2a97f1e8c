//! Bidirectional JSON mapping for Graph-style REST APIs.
//!
//! Model types describe their fields once through [`Mapped`]. A [`JsonMapper`]
//! then builds instances from loosely typed API payloads (coercing scalars,
//! normalizing connection envelopes, capturing unknown attributes) and encodes
//! values back into JSON for outgoing [`Parameter`]s.
//!
//! ```ignore
//! let post: Post = JsonMapper::global().from_json(body)?;
//! let limit = Parameter::with_limit(25)?;
//! ```

mod builder;
pub mod config;
pub mod connection;
pub mod descriptor;
pub mod encode;
pub mod error;
mod list;
pub mod mapper;
pub mod parameter;
pub mod path;
pub mod record;
pub mod registry;
pub mod scalar;

pub use serde_json::{Map, Value};

pub use config::{ConnectionKeys, DateFormat, Leniency, MapperConfig};
pub use connection::{Connection, Envelope, Shape, classify, resolve};
pub use descriptor::{
    EnumPolicy, EnumSpec, FieldDescriptor, FieldKind, Mapped, ScalarKind, TypeRef, WireEnum,
};
pub use encode::{Encoder, TIMESTAMP_FORMAT, ToWire};
pub use error::{EncodingError, MappingError, MappingResult, ParameterError};
pub use mapper::JsonMapper;
pub use parameter::Parameter;
pub use path::FieldPath;
pub use record::{Record, Unmapped};
pub use registry::{DescriptorRegistry, TypeDescriptor};
pub use scalar::{FromScalar, Scalar, coerce};
