//! This module contains types associated with the execution layer.

pub mod block;
