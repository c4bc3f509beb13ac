//! 裸采样缓冲, 校准元数据与多帧体数据.
//!
//! 上游容器解析器 (不在本 crate 范围内) 交付裸整数采样与校准常量;
//! 本模块负责把它们组织成按 `(z, H, W)` 访问的不可变体数据, 并按需
//! 产出物理单位 (HU) 的校准切片. 每次请求独占一份缓冲, 响应后即丢弃.

use std::ops::Index;

use log::warn;
use ndarray::{Array2, Array3, ArrayView, Axis, Ix3};

use crate::consts::limits;
use crate::error::{RenderError, ResourceLimit, RoiError};
use crate::roi::{self, RoiMask, RoiStatistics};
use crate::{Idx2d, Idx3d};

pub mod slice;
pub mod window;

pub use slice::{HuSlice, OwnedHuSlice};
pub use window::CtWindow;

/// 像素的光度解释: 采样值增大时显示变亮还是变暗.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Photometric {
    /// 采样值越大显示越亮 (MONOCHROME2 语义).
    #[default]
    Direct,

    /// 采样值越大显示越暗 (MONOCHROME1 语义).
    Inverted,
}

impl Photometric {
    /// 是否为反相光度.
    #[inline]
    pub fn is_inverted(&self) -> bool {
        matches!(self, Self::Inverted)
    }
}

/// 每幅影像的校准常量. 将存储的裸采样转换为物理单位:
/// `hu = raw * slope + intercept`.
///
/// 该结构是只读的. 若要修改校准参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Calibration {
    slope: f32,
    intercept: f32,
    photometric: Photometric,
    bits_stored: u8,
}

impl Default for Calibration {
    #[inline]
    fn default() -> Self {
        Self {
            slope: 1.0,
            intercept: 0.0,
            photometric: Photometric::Direct,
            bits_stored: 16,
        }
    }
}

impl Calibration {
    /// 构建校准元数据.
    ///
    /// `slope` 必须非零且有限, `intercept` 必须有限,
    /// `bits_stored` 必须落在 `1..=16`. 否则返回 `None`.
    pub fn new(
        slope: f32,
        intercept: f32,
        photometric: Photometric,
        bits_stored: u8,
    ) -> Option<Calibration> {
        if slope.is_finite() && slope != 0.0 && intercept.is_finite() && (1..=16).contains(&bits_stored)
        {
            Some(Self {
                slope,
                intercept,
                photometric,
                bits_stored,
            })
        } else {
            None
        }
    }

    /// 从可能缺失的容器标签构建校准元数据.
    ///
    /// 真实世界的输入经常不携带 rescale 标签. 缺失 (或非法) 的
    /// slope/intercept 回退到 `1.0` / `0.0` 并记录 warning,
    /// 而不是使整个请求失败.
    pub fn from_tags(
        slope: Option<f32>,
        intercept: Option<f32>,
        photometric: Photometric,
        bits_stored: u8,
    ) -> Option<Calibration> {
        let slope = match slope {
            Some(s) if s.is_finite() && s != 0.0 => s,
            Some(s) => {
                warn!("rescale slope 非法 ({s}), 回退到默认值 1.0");
                1.0
            }
            None => {
                warn!("rescale slope 缺失, 回退到默认值 1.0");
                1.0
            }
        };
        let intercept = match intercept {
            Some(i) if i.is_finite() => i,
            Some(i) => {
                warn!("rescale intercept 非法 ({i}), 回退到默认值 0.0");
                0.0
            }
            None => {
                warn!("rescale intercept 缺失, 回退到默认值 0.0");
                0.0
            }
        };
        Self::new(slope, intercept, photometric, bits_stored)
    }

    /// rescale slope.
    #[inline]
    pub fn slope(&self) -> f32 {
        self.slope
    }

    /// rescale intercept.
    #[inline]
    pub fn intercept(&self) -> f32 {
        self.intercept
    }

    /// 光度解释.
    #[inline]
    pub fn photometric(&self) -> Photometric {
        self.photometric
    }

    /// 有效存储位数.
    #[inline]
    pub fn bits_stored(&self) -> u8 {
        self.bits_stored
    }

    /// 将单个裸采样转换为物理单位 (HU).
    #[inline]
    pub fn apply(&self, raw: i32) -> f32 {
        raw as f32 * self.slope + self.intercept
    }
}

/// 多帧 CT 裸采样体数据, 按 `(z, H, W)` 组织, 附带校准元数据.
///
/// 采样以 `i32` 保存, 同时覆盖 16-bit 有符号与无符号两种来源.
/// 该结构在构建后不可变, 是每次渲染/统计请求的独占快照.
#[derive(Debug, Clone)]
pub struct CtVolume {
    calib: Calibration,
    data: Array3<i32>,
}

impl Index<Idx3d> for CtVolume {
    type Output = i32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl CtVolume {
    /// 由裸采样数据和校准元数据直接创建体数据.
    ///
    /// 单帧像素个数超出 [`limits::MAX_INPUT_PIXELS`] 预算时立即失败,
    /// 不尝试降级处理.
    pub fn from_raw(data: Array3<i32>, calib: Calibration) -> Result<Self, RenderError> {
        let &[_, h, w] = data.shape() else {
            unreachable!()
        };
        let pixels = h * w;
        if pixels > limits::MAX_INPUT_PIXELS {
            return Err(ResourceLimit::TooManyPixels {
                pixels,
                budget: limits::MAX_INPUT_PIXELS,
            }
            .into());
        }
        Ok(Self { calib, data })
    }

    /// 由单帧裸采样创建体数据.
    pub fn from_frame(frame: Array2<i32>, calib: Calibration) -> Result<Self, RenderError> {
        let (h, w) = frame.dim();
        let data = frame
            .into_shape((1, h, w))
            .expect("单帧到体数据的形状转换不会失败");
        Self::from_raw(data, calib)
    }

    /// 获取校准元数据.
    #[inline]
    pub fn calibration(&self) -> &Calibration {
        &self.calib
    }

    /// 获取数据形状大小 (z, 高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx3d {
        let &[z, h, w] = self.data.shape() else {
            unreachable!()
        };
        (z, h, w)
    }

    /// 获取数据水平切片形状大小.
    #[inline]
    pub fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 获取水平切片个数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 检查索引是否合法.
    #[inline]
    pub fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 获得裸数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, i32, Ix3> {
        self.data.view()
    }

    /// 获取第 `z_index` 个水平切片的校准 HU 平面.
    ///
    /// 校准需要逐像素计算, 因此总是产出拥有所有权的切片.
    /// 当 `z_index` 越界时 panic.
    pub fn calibrated_slice(&self, z_index: usize) -> OwnedHuSlice {
        let raw = self.data.index_axis(Axis(0), z_index);
        OwnedHuSlice::from_raw(raw.mapv(|v| self.calib.apply(v)))
    }

    /// 计算第 `z_index` 个水平切片上 `mask` 覆盖区域的描述统计与组织分类.
    ///
    /// 统计在校准 HU 平面上进行, 不经过任何显示链变换.
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn roi_statistics(&self, z_index: usize, mask: &RoiMask) -> Result<RoiStatistics, RoiError> {
        roi::evaluate(&self.calibrated_slice(z_index), mask)
    }
}
