//! U-Net model built with Burn

pub mod unet;

pub use unet::{UNet, UNetConfig};
