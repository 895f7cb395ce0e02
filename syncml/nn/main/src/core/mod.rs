pub mod attention;
pub mod dropout;
pub mod embedding;
pub mod feed_forward;
pub mod grid_rotary;
pub mod layer_norm;
pub mod linear;
pub mod positional;
