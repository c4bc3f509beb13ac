//! ROI (region of interest) 掩模与统计.
//!
//! 掩模由椭圆或闭合多边形在像素网格上栅格化而来, 与单帧同形状,
//! 一次性使用. 统计分支直接消费校准 HU 平面, 不经过显示链.

use ndarray::{Array2, ArrayView2};
use num::ToPrimitive;

use crate::Idx2d;

mod stats;
pub mod tissue;

pub use stats::{evaluate, RoiStatistics};
pub use tissue::{classify, TissueLabel};

/// 与单帧同形状的布尔掩模. `true` 代表像素属于 ROI.
#[derive(Clone, Debug)]
pub struct RoiMask {
    data: Array2<bool>,
}

impl RoiMask {
    /// 由底层数据直接构建.
    #[inline]
    pub fn from_raw(data: Array2<bool>) -> Self {
        Self { data }
    }

    /// 由椭圆栅格化掩模.
    ///
    /// `center` 与 `semi_axes` 均以 (高, 宽) 顺序给出, 单位为像素.
    /// 像素按其质心 (索引 + 0.5) 判定归属. 非正的半轴产生空掩模.
    pub fn from_ellipse(shape: Idx2d, center: (f64, f64), semi_axes: (f64, f64)) -> Self {
        let (ch, cw) = center;
        let (rh, rw) = semi_axes;
        if rh <= 0.0 || rw <= 0.0 {
            return Self {
                data: Array2::from_elem(shape, false),
            };
        }
        let data = Array2::from_shape_fn(shape, |(h, w)| {
            // 像素质心修正: +0.5.
            let dh = (pixel_center(h) - ch) / rh;
            let dw = (pixel_center(w) - cw) / rw;
            dh * dh + dw * dw <= 1.0
        });
        Self { data }
    }

    /// 由闭合多边形栅格化掩模.
    ///
    /// 顶点以 (高, 宽) 顺序给出, 单位为像素; 首尾自动闭合.
    /// 像素质心按 even-odd 规则判定归属. 少于三个顶点产生空掩模.
    pub fn from_polygon(shape: Idx2d, vertices: &[(f64, f64)]) -> Self {
        if vertices.len() < 3 {
            return Self {
                data: Array2::from_elem(shape, false),
            };
        }
        let data = Array2::from_shape_fn(shape, |(h, w)| {
            point_in_polygon((pixel_center(h), pixel_center(w)), vertices)
        });
        Self { data }
    }

    /// 掩模的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 掩模内 (值为 `true`) 的像素个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&m| m).count()
    }

    /// 掩模是否不含任何像素.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&m| m)
    }

    /// 获取给定位置的归属. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<bool> {
        self.data.get(pos).copied()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<bool> {
        self.data.view()
    }

    /// 收集掩模内所有像素的索引, 结果按行优先存储.
    pub fn positions(&self) -> Vec<Idx2d> {
        self.data
            .indexed_iter()
            .filter_map(|(pos, &m)| m.then_some(pos))
            .collect()
    }
}

/// 像素索引到质心坐标.
#[inline]
fn pixel_center(index: usize) -> f64 {
    // usize 在实际影像尺寸下总能精确转为 f64.
    index.to_f64().unwrap_or(f64::MAX) + 0.5
}

/// even-odd 规则的点-多边形归属判定. `point` 与顶点均为 (高, 宽).
fn point_in_polygon(point: (f64, f64), vertices: &[(f64, f64)]) -> bool {
    let (ph, pw) = point;
    let mut inside = false;
    let n = vertices.len();
    for i in 0..n {
        let (ah, aw) = vertices[i];
        let (bh, bw) = vertices[(i + 1) % n];
        // 水平射线与边 [a, b] 的交叉判定.
        if (ah > ph) != (bh > ph) {
            let cross_w = (bw - aw) * (ph - ah) / (bh - ah) + aw;
            if pw < cross_w {
                inside = !inside;
            }
        }
    }
    inside
}
