pub mod consts;
pub mod error;
pub mod types;
pub mod config;
pub mod geometry;
pub mod transform;
pub mod math;
pub mod constraints;
pub mod cuboid;
pub mod rle;
pub mod events;
pub mod data;
pub mod observer;
pub mod preview;
pub mod autoborder;
pub mod draw;
pub mod masks;
pub mod edit;
pub mod slice;
pub mod interaction;
pub mod selection;
pub mod canvas;
pub mod logger;
pub mod engine;
pub mod commands;
pub mod render;

pub use canvas::{Canvas, Mode};
pub use config::Configuration;
pub use engine::AnnotationEngine;
pub use error::{CanvasError, Result};
pub use geometry::Geometry;
pub use observer::{CanvasObserver, DrawnShape};
pub use types::*;
