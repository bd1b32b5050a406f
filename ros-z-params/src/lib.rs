//! # ros-z-params: ROS 2 parameter files
//!
//! Parses ROS 2 YAML parameter files into a typed store of
//! node full name → parameter name → value:
//!
//! ```yaml
//! lidar_ns:
//!   lidar_1:
//!     ros__parameters:
//!       ports: [2438, 2439, 2440]
//!       is_back: false
//! camera:
//!   ros__parameters:
//!     cam_spec:
//!       angle: 2.34
//! ```
//!
//! ```rust,ignore
//! use ros_z_params::{ParameterStore, ParameterValue};
//!
//! let mut store = ParameterStore::new();
//! store.parse_file("params.yaml")?;
//! assert_eq!(
//!     store.get("/camera", "cam_spec.angle"),
//!     Some(&ParameterValue::Double(2.34)),
//! );
//!
//! // Replace one value, typed exactly as it would be in a file.
//! store.parse_value("/lidar_ns/lidar_1", "ports", "[8080]")?;
//! ```
//!
//! Only the subset of YAML used by parameter files is accepted: anchors,
//! aliases, multiple documents and mappings inside sequences are rejected.
//! All resource bounds are configured through [`ParserLimits`].

mod alloc;
pub mod driver;
pub mod error;
pub mod event;
pub mod infer;
pub mod limits;
pub mod path;
pub mod shared;
pub mod store;
pub mod types;
pub mod update;

pub use driver::{DocumentDriver, parse_document};
pub use error::{Limit, ParamError, ParamErrorKind, Result};
pub use limits::ParserLimits;
pub use shared::SharedParameterStore;
pub use store::{DEPTH_RECURSIVE, ListParametersResult, NodeParams, ParameterStore};
pub use types::{ParameterType, ParameterValue};
