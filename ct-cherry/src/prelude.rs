//! 🍒欢迎光临🍒
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::slice::{HuSlice, OwnedHuSlice};
pub use crate::data::window::CtWindow;
pub use crate::data::{Calibration, CtVolume, Photometric};

pub use crate::enhance::{render_all, render_slice, GrayFrame, ImgWriteRaw};

#[cfg(feature = "rayon")]
pub use crate::enhance::par_render_all;

pub use crate::roi::{evaluate, RoiMask, RoiStatistics, TissueLabel};

pub use crate::cancel::CancelToken;
pub use crate::error::{RenderError, ResourceLimit, RoiError};
